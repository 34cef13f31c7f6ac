use thiserror::Error;

use anacan_shared::SchemaError;

/// How a failed remote call should be treated by the retry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The resource is already there. Idempotent success.
    AlreadyExists,
    /// Connection-level failure; worth another attempt.
    Transient,
    /// Rejected by the service; retrying will not help.
    Fatal,
}

/// Errors returned by a remote schema / document service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced an HTTP response (refused, reset, timed out).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with an error status.
    #[error("HTTP {status} ({kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn api(status: u16, kind: &str, message: impl Into<String>) -> Self {
        RemoteError::Api {
            status,
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            RemoteError::Transport(_) => ErrorClass::Transient,
            RemoteError::Api { status: 409, .. } => ErrorClass::AlreadyExists,
            RemoteError::Api { .. } | RemoteError::Decode(_) => ErrorClass::Fatal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Api { status: 404, .. })
    }
}

/// Missing or unusable settings. Aborts before any remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("APPWRITE_API_KEY is not set")]
    MissingApiKey,

    #[error("APPWRITE_PROJECT_ID is not set")]
    MissingProjectId,

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

/// Errors that stop a provisioning run as a whole.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Schema validation failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("Database '{database_id}' could not be ensured: {reason}")]
    Database { database_id: String, reason: String },
}
