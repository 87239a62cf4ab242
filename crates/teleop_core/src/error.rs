use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeleopError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("no connection to {url} within {timeout_ms} ms")]
    ConnectTimeout { url: String, timeout_ms: u64 },
    #[error("command channel closed")]
    ChannelClosed,
}

pub type Result<T, E = TeleopError> = std::result::Result<T, E>;
