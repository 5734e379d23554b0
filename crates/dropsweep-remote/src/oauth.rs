//! OAuth 2 helpers for the one-time authorization-code exchange.

use std::time::Duration;

use serde::Deserialize;
use url::form_urlencoded;

use crate::error::RemoteError;

/// Published credentials of this tool's Dropbox app; deployments that
/// register their own app override them via the environment.
const DEFAULT_APP_KEY: &str = "5a2z1ckyo1l2707";
const DEFAULT_APP_SECRET: &str = "ylndu9qf2o4sj2c";

const ENV_APP_KEY: &str = "DROPSWEEP_APP_KEY";
const ENV_APP_SECRET: &str = "DROPSWEEP_APP_SECRET";

const AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
const TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct AppCredentials {
    pub key: String,
    pub secret: String,
}

impl AppCredentials {
    /// Environment overrides first, the published app otherwise.
    pub fn from_env() -> Self {
        Self {
            key: std::env::var(ENV_APP_KEY).unwrap_or_else(|_| DEFAULT_APP_KEY.to_string()),
            secret: std::env::var(ENV_APP_SECRET)
                .unwrap_or_else(|_| DEFAULT_APP_SECRET.to_string()),
        }
    }
}

/// The URL the user visits to authorize the app and receive a code.
pub fn authorize_url(app_key: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", app_key)
        .append_pair("response_type", "code")
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(code: &str, app: &AppCredentials) -> Result<String, RemoteError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let response = client
        .post(TOKEN_URL)
        .basic_auth(&app.key, Some(&app.secret))
        .form(&[("code", code), ("grant_type", "authorization_code")])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let summary = response
            .text()
            .await
            .unwrap_or_else(|_| "<response unavailable>".to_string());
        return Err(RemoteError::Api { status, summary });
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_id_and_response_type() {
        let url = authorize_url("abc123");
        assert!(url.starts_with("https://www.dropbox.com/oauth2/authorize?"));
        assert!(url.contains("client_id=abc123"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn authorize_url_escapes_the_key() {
        let url = authorize_url("a&b c");
        assert!(url.contains("client_id=a%26b+c"));
    }

    #[test]
    fn token_response_decodes() {
        let body = r#"{"access_token": "sl.abc", "token_type": "bearer", "uid": "12345"}"#;
        let token: TokenResponse = serde_json::from_str(body).expect("decode token");
        assert_eq!(token.access_token, "sl.abc");
    }
}
