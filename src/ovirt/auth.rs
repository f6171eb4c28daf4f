//! SSO token exchange
//!
//! The engine's SSO endpoint implements an OAuth2 resource-owner password
//! grant. The returned bearer token authorizes every subsequent API call of
//! the run.

use super::dto::lenient;
use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, info};

/// Bearer token for one session
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body of both successful and failed token responses
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Expiry as epoch milliseconds
    #[serde(default, deserialize_with = "lenient::opt_epoch_millis")]
    exp: Option<DateTime<Utc>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    fn failure_reason(&self, status: u16) -> String {
        let detail = self
            .error_description
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("no access token in response");
        match self.error_code.as_deref() {
            Some(code) => format!("HTTP {}: {} ({})", status, detail, code),
            None => format!("HTTP {}: {}", status, detail),
        }
    }
}

/// Exchange username and password for an access token
pub async fn request_token(
    http: &reqwest::Client,
    config: &CollectorConfig,
    password: &str,
) -> Result<AccessToken> {
    let url = config.token_url();
    debug!("Requesting SSO token from {} for {}", url, config.username);

    let response = http
        .post(&url)
        .header(ACCEPT, "application/json")
        .form(&[
            ("grant_type", "password"),
            ("scope", config.scope.as_str()),
            ("username", config.username.as_str()),
            ("password", password),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.bytes().await?;
    // Error pages are not always JSON; an unparseable body still yields a reason.
    let parsed: TokenResponse = serde_json::from_slice(&body).unwrap_or_default();

    match parsed.access_token.as_deref() {
        Some(token) if status.is_success() && !token.is_empty() => {
            let token = AccessToken {
                value: token.to_string(),
                expires_at: parsed.exp,
            };
            info!("Authenticated as {}", config.username);
            Ok(token)
        }
        _ => Err(Error::auth(parsed.failure_reason(status.as_u16()))),
    }
}
