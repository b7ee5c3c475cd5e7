/// Error types for the dstore client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Key is already complete: {0}")]
    CompleteKey(String),

    #[error("Transaction already finalized")]
    TransactionFinalized,

    #[error("Not committed: {0}")]
    NotCommitted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] dstore_core::Error),
}

impl ClientError {
    /// Returns a stable error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::Status { .. } => "HTTP_STATUS",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::UnexpectedResponse(_) => "UNEXPECTED_RESPONSE",
            ClientError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ClientError::CompleteKey(_) => "COMPLETE_KEY",
            ClientError::TransactionFinalized => "TRANSACTION_FINALIZED",
            ClientError::NotCommitted(_) => "NOT_COMMITTED",
            ClientError::Config(_) => "CONFIG_ERROR",
            ClientError::Core(e) => e.code(),
        }
    }

    /// Returns true if the failed call may succeed when sent again.
    ///
    /// This layer never retries on its own; the flag is advisory for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
