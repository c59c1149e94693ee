//! Tri-state batch outcome.

use std::fmt;

/// Result of a batch run as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    pub success: bool,
    pub partial: bool,
}

impl BatchOutcome {
    pub const SUCCESS: Self = Self {
        success: true,
        partial: false,
    };
    pub const PARTIAL: Self = Self {
        success: false,
        partial: true,
    };
    pub const FAILURE: Self = Self {
        success: false,
        partial: false,
    };
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match (self.success, self.partial) {
            (true, _) => "success",
            (false, true) => "partial",
            (false, false) => "failure",
        };
        f.write_str(label)
    }
}

/// Running per-file counts, reduced into a [`BatchOutcome`] at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchTally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Files that were attempted, whether or not they succeeded.
    pub fn eligible(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn outcome(&self) -> BatchOutcome {
        match (self.succeeded, self.failed) {
            (0, _) => BatchOutcome::FAILURE,
            (_, 0) => BatchOutcome::SUCCESS,
            _ => BatchOutcome::PARTIAL,
        }
    }
}
