//! Deletion-eligibility policy.

use chrono::{DateTime, Utc};
use dropsweep_remote::Entry;

/// Whether `entry` is eligible for deletion against `cutoff`.
///
/// Folder entries never are: the recursive listing already surfaces every
/// contained file on its own, so only files are evaluated. A file is
/// eligible when its server-modified time is strictly earlier than the
/// cutoff; an entry exactly at the cutoff is kept.
pub fn should_delete(entry: &Entry, cutoff: DateTime<Utc>) -> bool {
    match entry.server_modified() {
        Some(modified) => modified < cutoff,
        None => false,
    }
}
