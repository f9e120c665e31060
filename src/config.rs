// In: src/config.rs

//! The single source of truth for conversion configuration.
//!
//! `InterchangeConfig` is created once at the application boundary (from a
//! caller's flags or a JSON document) and passed by reference into the table
//! assembler. The only caller-controlled policy knob of the conversion contract
//! is `allow_copy`; everything else is an optimization toggle.

use serde::{Deserialize, Serialize};

use crate::error::InterchangeError;

/// Conversion settings for importing an interchange dataframe.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InterchangeConfig {
    /// Allow memory to be copied to perform the conversion. If `false`, any
    /// conversion step that is not zero-copy fails with `CopyNotAllowed`.
    #[serde(default = "default_true")]
    pub allow_copy: bool,

    /// Compact a multi-chunk result into a single contiguous chunk.
    /// Only honoured when `allow_copy` is set, since compaction always copies.
    #[serde(default = "default_true")]
    pub rechunk: bool,
}

impl Default for InterchangeConfig {
    fn default() -> Self {
        Self {
            allow_copy: true,
            rechunk: true,
        }
    }
}

impl InterchangeConfig {
    /// A config that forbids every copy.
    pub fn zero_copy() -> Self {
        Self {
            allow_copy: false,
            ..Default::default()
        }
    }

    /// Convenience constructor mirroring the `allow_copy` flag of the entry point.
    pub fn with_allow_copy(allow_copy: bool) -> Self {
        Self {
            allow_copy,
            ..Default::default()
        }
    }

    /// Parses a config from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, InterchangeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether chunks should be compacted after concatenation.
    pub fn should_rechunk(&self) -> bool {
        self.allow_copy && self.rechunk
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}
