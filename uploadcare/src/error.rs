//! Error types for Upload API operations

use thiserror::Error;

/// Result type for Upload API operations
pub type UploadcareResult<T> = Result<T, UploadcareError>;

/// Errors that can occur while talking to the Upload API
#[derive(Error, Debug)]
pub enum UploadcareError {
    /// The source is neither a readable local file nor a well-formed URL
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// The expire value could not be resolved to a future timestamp
    #[error("Invalid expiration: {0}")]
    InvalidExpiration(String),

    /// Signing was required but no secret key is configured
    #[error("A secret key is required for secure uploads")]
    MissingSecretKey,

    /// A secret key is configured but the call carried no expire value
    #[error("Secure uploads require an expire value")]
    MissingExpire,

    /// The upload service rejected the request
    #[error("Upload failed with status {status}: {message}")]
    Upload {
        /// HTTP status code returned by the service
        status: u16,
        /// Error text returned by the service
        message: String,
    },

    /// An upload from URL was still pending after the last status poll
    #[error("Upload {token} still pending after {polls} status checks")]
    StatusTimeout {
        /// Token returned by `from_url/`
        token: String,
        /// Number of status polls performed
        polls: u32,
    },

    /// The requested file or group does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure raised inside the HTTP middleware stack
    #[error("Middleware error: {0}")]
    Middleware(String),

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest_middleware::Error> for UploadcareError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Reqwest(err) => Self::Network(err),
            reqwest_middleware::Error::Middleware(err) => Self::Middleware(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for UploadcareError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
