//! One cleanup pass: list, filter, delete (or report).

use chrono::{Duration, Utc};
use dropsweep_remote::FilesClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SweepConfig;
use crate::filter;

/// Counters describing the decisions one pass took. Purely informational;
/// the pass itself never fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Entries returned by the listing.
    pub listed: u64,
    /// Folder entries, skipped by policy.
    pub folders: u64,
    /// File entries past the age threshold.
    pub expired: u64,
    /// Deletions confirmed by the remote store.
    pub deleted: u64,
    /// Deletions the remote store rejected.
    pub failed: u64,
    /// The listing call failed and the pass ended before processing entries.
    pub aborted: bool,
}

/// Run one cleanup pass over `config.folder_path`.
///
/// All failures are handled here: a failed listing aborts the pass, a failed
/// deletion skips that entry. The next scheduled pass starts from scratch
/// either way.
pub async fn run_sweep(client: &dyn FilesClient, config: &SweepConfig) -> SweepReport {
    let now = Utc::now();
    let max_age =
        Duration::from_std(config.max_age).unwrap_or_else(|_| Duration::days(365_000));
    let cutoff = now - max_age;
    let mut report = SweepReport::default();

    debug!(path = %config.folder_path, %cutoff, "listing folder");
    let entries = match client.list_folder(&config.folder_path, true).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %config.folder_path, error = %err, "listing failed; skipping this pass");
            report.aborted = true;
            return report;
        }
    };

    info!(count = entries.len(), path = %config.folder_path, "processing listing");
    for entry in &entries {
        report.listed += 1;
        if entry.is_folder() {
            report.folders += 1;
            continue;
        }
        if !filter::should_delete(entry, cutoff) {
            debug!(path = %entry.path, "within age threshold");
            continue;
        }
        report.expired += 1;

        // server_modified is present on every non-folder entry.
        let age_hours = entry
            .server_modified()
            .map(|modified| now.signed_duration_since(modified).num_hours())
            .unwrap_or_default();

        if config.dry_run {
            info!(path = %entry.path, age_hours, "dry run: would delete");
            continue;
        }

        match client.delete(&entry.path).await {
            Ok(()) => {
                report.deleted += 1;
                info!(path = %entry.path, age_hours, "deleted");
            }
            Err(err) => {
                report.failed += 1;
                warn!(path = %entry.path, error = %err, "delete failed; skipping this file");
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use dropsweep_remote::{Entry, EntryKind, RemoteError};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    struct MockClient {
        entries: Vec<Entry>,
        fail_listing: bool,
        fail_deletes: HashSet<String>,
        delete_attempts: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn listing(entries: Vec<Entry>) -> Self {
            Self {
                entries,
                fail_listing: false,
                fail_deletes: HashSet::new(),
                delete_attempts: Mutex::new(Vec::new()),
            }
        }

        fn broken() -> Self {
            Self {
                entries: Vec::new(),
                fail_listing: true,
                fail_deletes: HashSet::new(),
                delete_attempts: Mutex::new(Vec::new()),
            }
        }

        fn failing_delete(mut self, path: &str) -> Self {
            self.fail_deletes.insert(path.to_string());
            self
        }

        fn attempts(&self) -> Vec<String> {
            self.delete_attempts.lock().expect("attempts lock").clone()
        }
    }

    #[async_trait]
    impl FilesClient for MockClient {
        async fn list_folder(
            &self,
            _path: &str,
            _recursive: bool,
        ) -> Result<Vec<Entry>, RemoteError> {
            if self.fail_listing {
                return Err(RemoteError::Api {
                    status: 409,
                    summary: "path/not_found/".to_string(),
                });
            }
            Ok(self.entries.clone())
        }

        async fn delete(&self, path: &str) -> Result<(), RemoteError> {
            self.delete_attempts
                .lock()
                .expect("attempts lock")
                .push(path.to_string());
            if self.fail_deletes.contains(path) {
                return Err(RemoteError::Api {
                    status: 429,
                    summary: "too_many_write_operations/".to_string(),
                });
            }
            Ok(())
        }
    }

    fn file(path: &str, modified: DateTime<Utc>) -> Entry {
        Entry {
            path: path.to_string(),
            kind: EntryKind::File {
                server_modified: modified,
                size: 128,
            },
        }
    }

    fn folder(path: &str) -> Entry {
        Entry {
            path: path.to_string(),
            kind: EntryKind::Folder,
        }
    }

    fn config(dry_run: bool) -> SweepConfig {
        SweepConfig {
            folder_path: "/Apps/Netatmo".to_string(),
            max_age: StdDuration::from_secs(7 * 24 * 3600),
            dry_run,
        }
    }

    fn days_old(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }

    #[tokio::test]
    async fn seven_day_threshold_deletes_only_the_old_file() {
        let client = MockClient::listing(vec![
            file("/Apps/Netatmo/ten-days.csv", days_old(10)),
            file("/Apps/Netatmo/five-days.csv", days_old(5)),
            file("/Apps/Netatmo/today.csv", days_old(0)),
        ]);

        let report = run_sweep(&client, &config(false)).await;

        assert_eq!(client.attempts(), vec!["/Apps/Netatmo/ten-days.csv"]);
        assert_eq!(report.listed, 3);
        assert_eq!(report.expired, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 0);
        assert!(!report.aborted);
    }

    #[tokio::test]
    async fn dry_run_issues_no_deletes() {
        let client = MockClient::listing(vec![
            file("/Apps/Netatmo/ten-days.csv", days_old(10)),
            file("/Apps/Netatmo/five-days.csv", days_old(5)),
            file("/Apps/Netatmo/today.csv", days_old(0)),
        ]);

        let report = run_sweep(&client, &config(true)).await;

        assert!(client.attempts().is_empty());
        assert_eq!(report.expired, 1, "only the ten-day file is reported");
        assert_eq!(report.deleted, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn listing_failure_aborts_the_pass() {
        let client = MockClient::broken();

        let report = run_sweep(&client, &config(false)).await;

        assert!(client.attempts().is_empty());
        assert!(report.aborted);
        assert_eq!(report.listed, 0);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn failed_delete_does_not_stop_the_pass() {
        let client = MockClient::listing(vec![
            file("/Apps/Netatmo/a.csv", days_old(30)),
            file("/Apps/Netatmo/b.csv", days_old(20)),
            file("/Apps/Netatmo/c.csv", days_old(10)),
        ])
        .failing_delete("/Apps/Netatmo/a.csv");

        let report = run_sweep(&client, &config(false)).await;

        assert_eq!(
            client.attempts(),
            vec![
                "/Apps/Netatmo/a.csv",
                "/Apps/Netatmo/b.csv",
                "/Apps/Netatmo/c.csv"
            ]
        );
        assert_eq!(report.expired, 3);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn folders_are_skipped_even_when_ancient() {
        let client = MockClient::listing(vec![
            folder("/Apps/Netatmo/archive"),
            file("/Apps/Netatmo/archive/old.csv", days_old(400)),
        ]);

        let report = run_sweep(&client, &config(false)).await;

        assert_eq!(client.attempts(), vec!["/Apps/Netatmo/archive/old.csv"]);
        assert_eq!(report.folders, 1);
        assert_eq!(report.deleted, 1);
    }
}
