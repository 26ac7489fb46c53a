use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] transit_auth::ConfigError),

    #[error("Token error: {0}")]
    Token(#[from] transit_auth::TokenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Access denied: {0}")]
    Denied(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
