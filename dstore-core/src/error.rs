use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl Error {
    /// Returns a stable error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidKey(_) => "INVALID_KEY",
            Error::InvalidValue(_) => "INVALID_VALUE",
            Error::InvalidQuery(_) => "INVALID_QUERY",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
