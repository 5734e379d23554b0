//! Dropbox files API surface for dropsweep.
//!
//! The sweeper core is written against the [`FilesClient`] trait so it can be
//! exercised with an in-memory client; [`DropboxFilesClient`] is the
//! reqwest-backed implementation used by the binary. The [`oauth`] module
//! covers the one-time authorization-code exchange performed at startup.

pub mod client;
pub mod error;
pub mod model;
pub mod oauth;

pub use client::{DropboxFilesClient, FilesClient};
pub use error::RemoteError;
pub use model::{Entry, EntryKind};
