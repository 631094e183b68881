use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered with a non-2xx status and an error envelope.
    #[error("{status}: {message}{}", describe_fields(.errors))]
    Api {
        status: StatusCode,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Not logged in")]
    NotAuthenticated,
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("\n  {}: {}", e.field, e.message))
        .collect()
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Transport failures and 5xx answers are worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => !e.is_decode(),
            ClientError::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
