use thiserror::Error;

/// Errors raised while loading configuration or content.
///
/// The animation controllers themselves never return these.
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Content parse error: {0}")]
    ContentParse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown reveal direction: {0}")]
    UnknownDirection(String),
}

pub type Result<T> = std::result::Result<T, MotionError>;
