use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),
}
