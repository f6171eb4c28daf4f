//! Collector configuration
//!
//! Endpoint, credentials and trust anchors for one engine. Values come from
//! defaults, then an optional YAML file, then CLI flags and environment
//! variables (applied by the binary).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default REST API path on the engine
pub const DEFAULT_BASE_PATH: &str = "/ovirt-engine/api";

/// Default SSO token endpoint path on the engine
pub const DEFAULT_SSO_PATH: &str = "/ovirt-engine/sso/oauth/token";

/// Default environment variable holding the account password
pub const DEFAULT_PASSWORD_ENV: &str = "OVIRT_PASS";

// =============================================================================
// Password Source
// =============================================================================

/// Where the account password is read from
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PasswordSource {
    /// Environment variable
    Env { var: String },
    /// File whose content (minus trailing newline) is the password
    File { path: PathBuf },
    /// Inline value, for tests and throwaway setups
    Literal { value: String },
}

impl Default for PasswordSource {
    fn default() -> Self {
        PasswordSource::Env {
            var: DEFAULT_PASSWORD_ENV.to_string(),
        }
    }
}

impl std::fmt::Debug for PasswordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordSource::Env { var } => f.debug_struct("Env").field("var", var).finish(),
            PasswordSource::File { path } => f.debug_struct("File").field("path", path).finish(),
            PasswordSource::Literal { .. } => f
                .debug_struct("Literal")
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}

impl PasswordSource {
    /// Read the password. Missing or empty values are configuration errors.
    pub fn resolve(&self) -> Result<String> {
        let password = match self {
            PasswordSource::Env { var } => std::env::var(var).map_err(|_| {
                Error::Configuration(format!("Password variable {} is not set", var))
            })?,
            PasswordSource::File { path } => std::fs::read_to_string(path)
                .map_err(|e| {
                    Error::Configuration(format!(
                        "Cannot read password file {}: {}",
                        path.display(),
                        e
                    ))
                })?
                .trim_end_matches(&['\r', '\n'][..])
                .to_string(),
            PasswordSource::Literal { value } => value.clone(),
        };

        if password.is_empty() {
            return Err(Error::Configuration(format!(
                "Password from {:?} is empty",
                self
            )));
        }
        Ok(password)
    }
}

// =============================================================================
// Collector Configuration
// =============================================================================

/// Configuration for the engine API client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Engine host, optionally with scheme (`https://` is assumed)
    pub host: String,
    /// REST API path
    pub base_path: String,
    /// SSO token endpoint path
    pub sso_path: String,
    /// Account name, e.g. `admin@internal`
    pub username: String,
    /// Where to read the password
    pub password_source: PasswordSource,
    /// Directory of PEM trust anchors; platform roots are used when unset
    pub trust_anchor_dir: Option<PathBuf>,
    /// SSO scope requested with the token
    pub scope: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            sso_path: DEFAULT_SSO_PATH.to_string(),
            username: "admin@internal".to_string(),
            password_source: PasswordSource::default(),
            trust_anchor_dir: None,
            scope: "ovirt-app-api".to_string(),
            timeout_secs: 30,
            user_agent: format!("{}/{}", crate::NAME, crate::VERSION),
        }
    }
}

impl CollectorConfig {
    /// Parse a YAML document; omitted keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Configuration(format!("Invalid config: {}", e)))
    }

    /// Load a YAML config file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Reject configurations that cannot possibly work
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Configuration("Engine host is not set".into()));
        }
        for (name, path) in [("base_path", &self.base_path), ("sso_path", &self.sso_path)] {
            if !path.starts_with('/') {
                return Err(Error::Configuration(format!(
                    "{} must start with '/': {}",
                    name, path
                )));
            }
        }
        if self.username.is_empty() {
            return Err(Error::Configuration("Username is not set".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Scheme and host, without trailing slash
    pub fn origin(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    /// Root URL of the REST API
    pub fn api_url(&self) -> String {
        format!("{}{}", self.origin(), self.base_path.trim_end_matches('/'))
    }

    /// URL of the SSO token endpoint
    pub fn token_url(&self) -> String {
        format!("{}{}", self.origin(), self.sso_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.base_path, "/ovirt-engine/api");
        assert_eq!(config.username, "admin@internal");
        assert_eq!(
            config.password_source,
            PasswordSource::Env {
                var: "OVIRT_PASS".into()
            }
        );
        assert!(config.trust_anchor_dir.is_none());
        // Host has no sensible default.
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_urls() {
        let config = CollectorConfig {
            host: "engine.example.org/".into(),
            ..Default::default()
        };
        assert_eq!(config.origin(), "https://engine.example.org");
        assert_eq!(config.api_url(), "https://engine.example.org/ovirt-engine/api");
        assert_eq!(
            config.token_url(),
            "https://engine.example.org/ovirt-engine/sso/oauth/token"
        );

        let config = CollectorConfig {
            host: "http://127.0.0.1:8443".into(),
            base_path: "/api/".into(),
            ..Default::default()
        };
        assert_eq!(config.api_url(), "http://127.0.0.1:8443/api");
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
host: engine.lab
username: inventory@internal
password_source:
  type: file
  path: /run/secrets/ovirt
trust_anchor_dir: /etc/ovirt/ca
timeout_secs: 10
"#;
        let config = CollectorConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.host, "engine.lab");
        assert_eq!(config.username, "inventory@internal");
        assert_eq!(
            config.password_source,
            PasswordSource::File {
                path: PathBuf::from("/run/secrets/ovirt")
            }
        );
        assert_eq!(config.trust_anchor_dir, Some(PathBuf::from("/etc/ovirt/ca")));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.base_path, DEFAULT_BASE_PATH);
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_file_and_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host: engine.lab").unwrap();
        let config = CollectorConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.host, "engine.lab");

        assert_matches!(
            CollectorConfig::from_yaml_str("timeout_secs: [1, 2]"),
            Err(Error::Configuration(_))
        );
        assert_matches!(
            CollectorConfig::from_yaml_file("/nonexistent/ovirt.yaml"),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = CollectorConfig {
            host: "engine.lab".into(),
            ..Default::default()
        };
        base.validate().unwrap();

        let bad_path = CollectorConfig {
            base_path: "ovirt-engine/api".into(),
            ..base.clone()
        };
        assert_matches!(bad_path.validate(), Err(Error::Configuration(_)));

        let zero_timeout = CollectorConfig {
            timeout_secs: 0,
            ..base.clone()
        };
        assert_matches!(zero_timeout.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_password_from_file_trims_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "s3cret").unwrap();

        let source = PasswordSource::File {
            path: file.path().to_path_buf(),
        };
        assert_eq!(source.resolve().unwrap(), "s3cret");
    }

    #[test]
    fn test_password_missing_or_empty() {
        let source = PasswordSource::Env {
            var: "OVIRT_INVENTORY_TEST_UNSET_VARIABLE".into(),
        };
        assert_matches!(source.resolve(), Err(Error::Configuration(_)));

        let source = PasswordSource::Literal { value: String::new() };
        assert_matches!(source.resolve(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_literal_password_is_redacted_in_debug() {
        let source = PasswordSource::Literal {
            value: "hunter2".into(),
        };
        assert!(!format!("{:?}", source).contains("hunter2"));
    }
}
