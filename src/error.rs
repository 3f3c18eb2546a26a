use thiserror::Error;

/// Error types for Entrez client operations
#[derive(Error, Debug)]
pub enum PubMedError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML document could not be read at all
    ///
    /// Individual malformed records inside an otherwise readable document
    /// are skipped during decoding and never produce this error.
    #[error("XML parsing failed: {message}")]
    XmlError { message: String },

    /// Upstream returned a non-success HTTP status
    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, PubMedError>;
