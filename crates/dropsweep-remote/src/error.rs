use thiserror::Error;

/// Errors surfaced by the remote client.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("dropbox api returned {status}: {summary}")]
    Api { status: u16, summary: String },
}

impl RemoteError {
    /// Whether the error is an authentication/authorization rejection, as
    /// opposed to a transient transport or server condition.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RemoteError::Api { status, .. } if *status == 401 || *status == 403)
    }
}
