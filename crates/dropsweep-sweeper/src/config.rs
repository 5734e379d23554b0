//! Configuration types for the sweeper.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Immutable per-run settings. Constructed once at startup and shared
/// read-only with the schedule loop for the process lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Remote folder whose subtree is swept.
    pub folder_path: String,
    /// Files modified longer ago than this are eligible for deletion.
    pub max_age: Duration,
    /// Report eligible files instead of deleting them.
    pub dry_run: bool,
}
