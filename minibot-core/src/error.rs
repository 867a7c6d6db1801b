use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    /// The platform accepted the call but reported failure, or every probed
    /// send/edit variant was rejected.
    #[error("API error: {0}")]
    Api(String),

    #[error("Handler error: {0}")]
    Handler(String),

    /// Network or deserialization failure talking to the platform.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
