//! CLI error types.

use authpop_ldap::LdapError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Directory error.
    #[error(transparent)]
    Directory(#[from] LdapError),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
