//! Command implementations.

pub mod browse;
pub mod dashboard;
pub mod session;

use serde::Serialize;
use thiserror::Error;

use lampstand_client::{ApiError, ConfigError, StoreError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Missing input: {0}")]
    MissingInput(&'static str),
}

/// Write `value` to stdout as pretty JSON.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write plain text to stdout.
#[allow(clippy::print_stdout)]
pub fn print_text(text: &str) {
    println!("{text}");
}
