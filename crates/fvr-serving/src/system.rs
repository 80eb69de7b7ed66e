//! Serving-system boundary: credentials, error classification and the
//! [`ServingSystem`] capability trait.

use std::fmt;

use fvr_normalize::PredictionDoc;

/// Username/password pair for the serving system. Values never print.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"REDACTED")
            .field("password", &"REDACTED")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServingError {
    /// Project, model, or forecast for the time key does not exist.
    NotFound { what: String },
    Transport(String),
    /// Missing or rejected credentials.
    Auth(String),
    Api { status: u16, message: String },
    Decode(String),
}

impl ServingError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServingError::NotFound { what: what.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServingError::NotFound { .. })
    }
}

impl fmt::Display for ServingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingError::NotFound { what } => write!(f, "not published: {what}"),
            ServingError::Transport(msg) => write!(f, "transport error: {msg}"),
            ServingError::Auth(msg) => write!(f, "authentication error: {msg}"),
            ServingError::Api { status, message } => {
                write!(f, "serving api error status={status}: {message}")
            }
            ServingError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ServingError {}

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// The system publishing the single live snapshot per (dataset, time key).
#[async_trait::async_trait]
pub trait ServingSystem: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), ServingError>;

    /// Current snapshot for `dataset` at `time_key` (`YYYY-MM-DD`).
    async fn download(&self, dataset: &str, time_key: &str) -> Result<PredictionDoc, ServingError>;
}
