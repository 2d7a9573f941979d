// Error types shared by the facades, the transport shim and the result models
use crate::transport::HttpMethod;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZillowError>;

#[derive(Error, Debug)]
pub enum ZillowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported method: {0:?} (only GET is supported)")]
    UnsupportedMethod(HttpMethod),

    #[error("XML parse error: {0}")]
    Xml(String),

    // Carries whatever the provider sent back so the caller can see it
    #[error("Zillow did not return a valid response: {message}")]
    InvalidResponse { message: String, raw: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ZillowError {
    pub(crate) fn invalid_response(message: impl Into<String>, raw: impl Into<String>) -> Self {
        ZillowError::InvalidResponse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// The raw payload attached to a response-shape error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ZillowError::InvalidResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ZillowError::Validation(_))
    }
}

impl From<reqwest::Error> for ZillowError {
    fn from(err: reqwest::Error) -> Self {
        ZillowError::Transport(err.to_string())
    }
}

// Errors raised while turning a parsed XML subtree into a result model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
