use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoxError>;

/// The remote service a client call was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    SpeechToText,
    Translation,
    ChatCompletion,
    TextToSpeech,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SpeechToText => "speech-to-text",
            Self::Translation => "translation",
            Self::ChatCompletion => "chat completion",
            Self::TextToSpeech => "text-to-speech",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a failed client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    UpstreamStatus,
    MalformedResponse,
    Timeout,
    Transport,
    UnsupportedLanguage,
}

/// Failure of a single outbound service call.
///
/// Every variant renders as `Error: ...` so it can be shown to the user
/// verbatim in place of the missing result.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Error: missing credential '{0}'")]
    MissingCredential(&'static str),

    #[error("Error: {service} returned {status}: {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("Error: {body}")]
    Malformed { service: Service, body: String },

    #[error("Error: {service} request timed out after {timeout_ms}ms")]
    Timeout { service: Service, timeout_ms: u64 },

    #[error("Error: {service} request failed: {message}")]
    Transport { service: Service, message: String },

    #[error("Error: unsupported language '{0}'")]
    UnsupportedLanguage(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::Status { .. } => ErrorKind::UpstreamStatus,
            Self::Malformed { .. } => ErrorKind::MalformedResponse,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
        }
    }

    /// Whether a retry of the same request has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Serializable view of a [`ClientError`] for run outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ClientError> for StageError {
    fn from(err: &ClientError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
