//! Entry model and the Dropbox wire types it is decoded from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item returned by a folder listing. Entries are produced fresh on
/// every listing call and carry no identity beyond their path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntryKind {
    File {
        server_modified: DateTime<Utc>,
        size: u64,
    },
    Folder,
}

impl Entry {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder)
    }

    /// Files only; folder entries carry no timestamp in listings.
    pub fn server_modified(&self) -> Option<DateTime<Utc>> {
        match self.kind {
            EntryKind::File {
                server_modified, ..
            } => Some(server_modified),
            EntryKind::Folder => None,
        }
    }
}

/// One page of a `list_folder` / `list_folder/continue` response.
#[derive(Debug, Deserialize)]
pub struct ListFolderPage {
    pub entries: Vec<RawEntry>,
    pub cursor: String,
    pub has_more: bool,
}

/// Wire form of a listing entry; the API tags variants with `.tag`.
#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "snake_case")]
pub enum RawEntry {
    File {
        path_display: String,
        server_modified: DateTime<Utc>,
        size: u64,
    },
    Folder { path_display: String },
    /// Deleted markers and entry kinds this tool has no use for.
    #[serde(other)]
    Other,
}

impl RawEntry {
    pub fn into_entry(self) -> Option<Entry> {
        match self {
            RawEntry::File {
                path_display,
                server_modified,
                size,
            } => Some(Entry {
                path: path_display,
                kind: EntryKind::File {
                    server_modified,
                    size,
                },
            }),
            RawEntry::Folder { path_display } => Some(Entry {
                path: path_display,
                kind: EntryKind::Folder,
            }),
            RawEntry::Other => None,
        }
    }
}
