//! Fill policy for ragged merge grids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};

/// How the empty cells of a short final grid row are completed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Stretch the last image horizontally across the remaining gap.
    #[default]
    Stretch,
    /// Paste the last image again into each empty cell.
    Repeat,
    /// Leave the empty cells filled with the background colour.
    Leave,
}

impl FromStr for FillPolicy {
    type Err = FpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stretch" => Ok(FillPolicy::Stretch),
            "repeat" => Ok(FillPolicy::Repeat),
            "leave" => Ok(FillPolicy::Leave),
            _ => Err(FpError::Config {
                message: format!("Unknown fill method: {}", s),
                help: Some("Expected one of: stretch, repeat, leave".to_string()),
            }),
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillPolicy::Stretch => "stretch",
            FillPolicy::Repeat => "repeat",
            FillPolicy::Leave => "leave",
        };
        f.write_str(name)
    }
}
