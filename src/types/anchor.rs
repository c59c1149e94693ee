//! Anchor positions and their resolution to pixel offsets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};

/// Horizontal component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// Vertical component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Top,
    Middle,
    Bottom,
}

/// One of the nine named placements of content within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum AnchorPosition {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl AnchorPosition {
    pub const ALL: [AnchorPosition; 9] = [
        AnchorPosition::TopLeft,
        AnchorPosition::TopCenter,
        AnchorPosition::TopRight,
        AnchorPosition::MiddleLeft,
        AnchorPosition::MiddleCenter,
        AnchorPosition::MiddleRight,
        AnchorPosition::BottomLeft,
        AnchorPosition::BottomCenter,
        AnchorPosition::BottomRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnchorPosition::TopLeft => "top_left",
            AnchorPosition::TopCenter => "top_center",
            AnchorPosition::TopRight => "top_right",
            AnchorPosition::MiddleLeft => "middle_left",
            AnchorPosition::MiddleCenter => "middle_center",
            AnchorPosition::MiddleRight => "middle_right",
            AnchorPosition::BottomLeft => "bottom_left",
            AnchorPosition::BottomCenter => "bottom_center",
            AnchorPosition::BottomRight => "bottom_right",
        }
    }

    pub fn horizontal(self) -> Horizontal {
        match self {
            AnchorPosition::TopLeft | AnchorPosition::MiddleLeft | AnchorPosition::BottomLeft => {
                Horizontal::Left
            }
            AnchorPosition::TopCenter
            | AnchorPosition::MiddleCenter
            | AnchorPosition::BottomCenter => Horizontal::Center,
            AnchorPosition::TopRight
            | AnchorPosition::MiddleRight
            | AnchorPosition::BottomRight => Horizontal::Right,
        }
    }

    pub fn vertical(self) -> Vertical {
        match self {
            AnchorPosition::TopLeft | AnchorPosition::TopCenter | AnchorPosition::TopRight => {
                Vertical::Top
            }
            AnchorPosition::MiddleLeft
            | AnchorPosition::MiddleCenter
            | AnchorPosition::MiddleRight => Vertical::Middle,
            AnchorPosition::BottomLeft
            | AnchorPosition::BottomCenter
            | AnchorPosition::BottomRight => Vertical::Bottom,
        }
    }

    /// Resolve the top-left offset of `content` placed inside `container`.
    ///
    /// Offsets go negative when the content is larger than the container.
    pub fn offset(self, container: (u32, u32), content: (u32, u32)) -> (i64, i64) {
        let (cw, ch) = (container.0 as i64, container.1 as i64);
        let (w, h) = (content.0 as i64, content.1 as i64);

        let x = match self.horizontal() {
            Horizontal::Left => 0,
            Horizontal::Center => (cw - w) / 2,
            Horizontal::Right => cw - w,
        };
        let y = match self.vertical() {
            Vertical::Top => 0,
            Vertical::Middle => (ch - h) / 2,
            Vertical::Bottom => ch - h,
        };
        (x, y)
    }

    /// Resolve the origin of a text run inside `container`.
    ///
    /// Text placement does not measure glyphs: the horizontal component picks
    /// a fixed inset and the baseline row sits 50px above the bottom edge.
    /// The vertical component is ignored.
    pub fn text_origin(self, container: (u32, u32)) -> (i64, i64) {
        let (cw, ch) = (container.0 as i64, container.1 as i64);
        let x = match self.horizontal() {
            Horizontal::Left => 10,
            Horizontal::Center => cw / 2 - 50,
            Horizontal::Right => cw - 100,
        };
        (x, ch - 50)
    }
}

impl Default for AnchorPosition {
    fn default() -> Self {
        AnchorPosition::BottomCenter
    }
}

impl FromStr for AnchorPosition {
    type Err = FpError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        AnchorPosition::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| FpError::Config {
                message: format!("Unknown position: {}", s),
                help: Some(format!(
                    "Expected one of: {}",
                    AnchorPosition::ALL.map(|a| a.name()).join(", ")
                )),
            })
    }
}

impl fmt::Display for AnchorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
