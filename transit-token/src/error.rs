use thiserror::Error;

/// Errors produced while decoding a bearer token.
///
/// These never reach end users directly. The validity oracle folds every
/// variant into an "invalid token" outcome.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token does not have the `header.payload.signature` shape
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// A segment is not valid base64url
    #[error("Invalid token encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The payload segment is not a JSON object
    #[error("Invalid token payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl TokenError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        TokenError::Malformed(msg.into())
    }
}
