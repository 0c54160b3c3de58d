use thiserror::Error;

/// Errors raised by a [`crate::transport::SupportTransport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed server payload: {0}")]
    Decode(String),
}
