//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! reordering_allowed = true
//! back_press_mode = "immediate"
//! ```
//!
//! # Validation
//!
//! Unknown keys and unknown enum values are rejected at parse time.

use serde::{Deserialize, Serialize};

use crate::host::CommitMode;

/// Back-stack configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Whether transactions may be reordered and merged by the host.
    pub reordering_allowed: Option<bool>,

    /// How a back press commits its pop.
    pub back_press_mode: Option<CommitMode>,
}
