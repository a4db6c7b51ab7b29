//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like
//! passwords or bind credentials.

use thiserror::Error;

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("Security error: Only LDAPS is supported. URL must start with 'ldaps://'. STARTTLS and plain LDAP are not allowed.")]
    InsecureProtocol,

    /// Malformed search filter template.
    #[error("Invalid search filter: {0}")]
    InvalidFilter(String),

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// TLS/SSL error.
    #[error("LDAP TLS error: {0}")]
    Tls(String),

    /// Bind (authentication) failed.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// Search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),

    /// Timeout error.
    #[error("LDAP operation timed out")]
    Timeout,

    /// Pool exhausted.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Protocol error from LDAP server.
    #[error("LDAP protocol error: {0}")]
    Protocol(String),

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),

    /// A directory query failed while resolving authorities.
    ///
    /// Callers must read this as "no authorities could be determined",
    /// never as "the principal has no authorities".
    #[error("Directory query failed: {0}")]
    Transport(#[source] Box<LdapError>),
}

impl LdapError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a TLS error.
    #[must_use]
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Creates a search error.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Creates an invalid filter error.
    #[must_use]
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    /// Wraps a client failure as a transport failure.
    ///
    /// Already-wrapped errors are returned unchanged so that nesting never
    /// exceeds one level.
    #[must_use]
    pub fn into_transport(self) -> Self {
        match self {
            Self::Transport(_) => self,
            other => Self::Transport(Box::new(other)),
        }
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Tls(_) | Self::Timeout | Self::PoolExhausted
        )
    }

    /// Checks if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::InsecureProtocol | Self::Tls(_) | Self::Bind(_))
    }

    /// Checks if this is the failure kind surfaced by authority resolution.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;
