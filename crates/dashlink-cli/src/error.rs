//! Error handling for the dashlink CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("link error: {0}")]
    Link(#[from] dashlink_core::LinkError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("the wifi receiver needs --ip <sender address>")]
    MissingServerAddress,

    #[error("no dashboard sensor found before the scan timed out")]
    NoDeviceFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(err.to_string())
    }
}
