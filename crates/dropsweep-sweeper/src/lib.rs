//! Core sweep logic for dropsweep.
//!
//! One pass lists the configured folder, applies the age filter to every
//! file entry and deletes (or, in dry-run mode, reports) the expired ones.
//! The schedule loop repeats passes at a fixed interval until cancelled.
//! Everything is written against the `FilesClient` seam from
//! `dropsweep-remote`, so both the pass and the loop run against an
//! in-memory client in tests.

pub mod config;
pub mod filter;
pub mod pass;
pub mod scheduler;

pub use config::SweepConfig;
pub use pass::{run_sweep, SweepReport};
pub use scheduler::{Sweeper, SweeperHandle};
