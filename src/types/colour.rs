//! Colour type and parsing.
//!
//! Used for merge canvas backgrounds and the flatten colour applied before
//! encoding to formats without an alpha channel.

use std::fmt;
use std::str::FromStr;

use image::{Rgb, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};

/// An RGBA colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a colour name or hex string.
    ///
    /// Accepts `white`, `black`, `#RGB`, `#RRGGBB` and `#RRGGBBAA`; the
    /// leading `#` is optional.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            _ => {}
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(invalid_colour(s));
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid_colour(s));

        match hex.len() {
            3 => {
                let mut digits = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    digits[i] = c.to_digit(16).ok_or_else(|| invalid_colour(s))? as u8;
                }
                Ok(Self::rgb(digits[0] * 17, digits[1] * 17, digits[2] * 17))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid_colour(s)),
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// The colour with its alpha discarded.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

fn invalid_colour(s: &str) -> FpError {
    FpError::Config {
        message: format!("Invalid colour: {}", s),
        help: Some("Use white, black, #RGB, #RRGGBB, or #RRGGBBAA".to_string()),
    }
}

impl FromStr for Colour {
    type Err = FpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Colour {
    type Error = FpError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Colour> for String {
    fn from(c: Colour) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Colour::parse("#FF0000").unwrap(), Colour::rgb(255, 0, 0));
        assert_eq!(Colour::parse("1a1a2e").unwrap(), Colour::rgb(0x1a, 0x1a, 0x2e));
        assert_eq!(Colour::parse("#ABC").unwrap(), Colour::rgb(0xAA, 0xBB, 0xCC));
        assert_eq!(Colour::parse("#FF000080").unwrap(), Colour::new(255, 0, 0, 128));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Colour::parse("white").unwrap(), Colour::WHITE);
        assert_eq!(Colour::parse(" Black ").unwrap(), Colour::BLACK);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Colour::parse("#GGG").is_err());
        assert!(Colour::parse("#12345").is_err());
        assert!(Colour::parse("").is_err());
        assert!(Colour::parse("#ééé").is_err());
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let c = Colour::new(255, 0, 0, 128);
        assert_eq!(c.to_string(), "#FF000080");

        let yaml = serde_yaml::to_string(&c).unwrap();
        let back: Colour = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_pixel_conversions() {
        let c = Colour::new(1, 2, 3, 4);
        assert_eq!(c.to_rgba().0, [1, 2, 3, 4]);
        assert_eq!(c.to_rgb().0, [1, 2, 3]);
    }
}
