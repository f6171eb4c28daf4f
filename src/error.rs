//! Error types for the oVirt inventory collector
//!
//! Every failure is fatal to a collection run. The variants are grouped by
//! the stage that produces them, and [`Error::kind`] folds them into the
//! coarse categories reported to the operator.

use thiserror::Error;

/// Unified error type for the collector
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    // =========================================================================
    // Fetch Errors
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    // =========================================================================
    // Report Errors
    // =========================================================================
    #[error("Report encoding failed: {0}")]
    Encoding(#[source] serde_json::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category, as surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential or session setup failed
    Auth,
    /// Network or TLS failure during a fetch
    Transport,
    /// Response body did not match the expected schema
    Decode,
    /// Final report serialization failed
    Encoding,
    /// Invalid or incomplete configuration
    Configuration,
    /// Local filesystem or stream failure
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Auth => write!(f, "auth"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Decode => write!(f, "decode"),
            ErrorKind::Encoding => write!(f, "encoding"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Io => write!(f, "io"),
        }
    }
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Tls(_) | Error::Transport(_) | Error::HttpStatus { .. } => {
                ErrorKind::Transport
            }
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            ErrorKind::Auth => 3,
            ErrorKind::Transport => 4,
            ErrorKind::Decode => 5,
            ErrorKind::Encoding => 6,
            ErrorKind::Io => 7,
        }
    }

    /// Build a decode error for the named collection
    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Decode {
            what: what.into(),
            source,
        }
    }

    /// Build an auth error
    pub fn auth(reason: impl Into<String>) -> Self {
        Error::Auth {
            reason: reason.into(),
        }
    }
}

/// Result type alias for the collector
pub type Result<T> = std::result::Result<T, Error>;
