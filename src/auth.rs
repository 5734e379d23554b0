//! OAuth token persistence and credential bootstrap.
//!
//! Runs once at startup, before scheduling begins: the token comes from the
//! environment, the token file, or an interactive authorization-code
//! exchange, in that order. The sweeper core only ever sees a ready client.

use std::env;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dropsweep_remote::oauth::{self, AppCredentials};

const ENV_ACCESS_TOKEN: &str = "DROPSWEEP_ACCESS_TOKEN";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

/// JSON file persisting the OAuth access token across restarts.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The stored token, or `None` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read token file {}", self.path.display())
                })
            }
        };
        let tokens: StoredTokens = serde_json::from_slice(&bytes)
            .with_context(|| format!("token file {} is not valid JSON", self.path.display()))?;
        Ok(tokens.access_token.filter(|token| !token.is_empty()))
    }

    /// Persist `token`, creating parent directories on first write. The file
    /// holds a credential, so on Unix it is restricted to the owner.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create token directory {}", parent.display())
            })?;
        }
        let body = serde_json::to_vec_pretty(&StoredTokens {
            access_token: Some(token.to_string()),
        })?;
        fs::write(&self.path, body)
            .with_context(|| format!("failed to write token file {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).with_context(
                || format!("failed to restrict token file {}", self.path.display()),
            )?;
        }

        Ok(())
    }
}

/// `<config_dir>/dropsweep/auth.json`.
pub fn default_token_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("could not determine the user config directory")?;
    path.push("dropsweep");
    path.push("auth.json");
    Ok(path)
}

/// Resolve the access token: environment override, then the token file, then
/// the interactive authorization-code flow (persisting its result). Any
/// failure here is fatal; the scheduler never starts without a credential.
pub async fn obtain_access_token(token_path: &Path) -> Result<String> {
    if let Ok(token) = env::var(ENV_ACCESS_TOKEN) {
        if !token.is_empty() {
            info!("using access token from {ENV_ACCESS_TOKEN}");
            return Ok(token);
        }
    }

    let store = TokenStore::new(token_path.to_path_buf());
    if let Some(token) = store.load()? {
        debug!(path = %token_path.display(), "reusing stored access token");
        return Ok(token);
    }

    let token = interactive_exchange().await?;
    store.save(&token)?;
    info!(path = %token_path.display(), "access token stored");
    Ok(token)
}

/// Walk the user through the authorization-code flow on the console.
async fn interactive_exchange() -> Result<String> {
    let app = AppCredentials::from_env();

    println!("1. Go to {}", oauth::authorize_url(&app.key));
    println!("2. Click \"Allow\" (you might have to log in first).");
    println!("3. Copy the authorization code.");
    print!("Enter the authorization code here: ");
    io::stdout().flush().context("flushing the prompt failed")?;

    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .context("reading the authorization code failed")?;
    let code = code.trim();
    if code.is_empty() {
        bail!("no authorization code entered");
    }

    oauth::exchange_code(code, &app)
        .await
        .context("authorization code exchange failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TokenStore::new(dir.path().join("nested").join("auth.json"));

        store.save("sl.test-token").expect("save token");
        let loaded = store.load().expect("load token");
        assert_eq!(loaded.as_deref(), Some("sl.test-token"));
    }

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TokenStore::new(dir.path().join("auth.json"));
        assert_eq!(store.load().expect("load token"), None);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.json");
        fs::write(&path, b"not json").expect("write garbage");

        let store = TokenStore::new(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn empty_stored_token_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.json");
        fs::write(&path, br#"{"access_token": ""}"#).expect("write empty token");

        let store = TokenStore::new(path);
        assert_eq!(store.load().expect("load token"), None);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.json");
        let store = TokenStore::new(path.clone());
        store.save("sl.test-token").expect("save token");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
