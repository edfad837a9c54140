use repairhub_core::error::CoreError;

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Status {
        status: u16,
        /// User-facing message extracted from the JSON body, if any.
        message: Option<String>,
        /// Raw response body for debugging.
        body: String,
    },

    /// The server answered 2xx but reported failure in the body.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// The server-provided message to show the user verbatim, when there is one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            Self::Rejected(message) if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Top-level error type for the client crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
