use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Unknown delivery scheme: {0}")]
    UnknownDeliveryScheme(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
