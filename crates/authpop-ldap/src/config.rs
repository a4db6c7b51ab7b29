//! Directory connection and group search configuration.
//!
//! ## Security Requirements
//!
//! **CRITICAL**: Only LDAPS (LDAP over TLS) is supported.
//!
//! - Connection URLs MUST start with `ldaps://`
//! - STARTTLS is NOT supported (vulnerable to downgrade attacks)
//! - Plain `ldap://` is NOT supported (credentials transmitted in cleartext)

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LdapError, LdapResult};
use crate::filter::FilterTemplate;

/// Default nested search depth.
pub const DEFAULT_MAX_SEARCH_DEPTH: u32 = 10;

/// Default attribute holding a group's role label.
pub const DEFAULT_GROUP_ROLE_ATTRIBUTE: &str = "cn";

/// Default prefix prepended to every role.
pub const DEFAULT_ROLE_PREFIX: &str = "ROLE_";

// ============================================================================
// Connection Configuration
// ============================================================================

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base DN.
    Base,
    /// Search one level below the base DN.
    #[default]
    OneLevel,
    /// Search the entire subtree.
    Subtree,
}

impl SearchScope {
    /// Converts to ldap3 scope.
    #[must_use]
    pub const fn to_ldap3(&self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// LDAP connection configuration.
///
/// ## Security Requirements
///
/// The `connection_url` MUST use the `ldaps://` scheme.
/// Any attempt to use `ldap://` or STARTTLS will be rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// LDAP server URL (MUST be ldaps://).
    pub connection_url: String,

    /// Bind DN for service account.
    pub bind_dn: String,

    /// Bind credential (password).
    #[serde(skip_serializing, default)]
    pub bind_credential: String,

    /// Whether to validate server certificates.
    /// Should always be true in production.
    pub validate_certificates: bool,

    /// Scope applied to every group search.
    pub search_scope: SearchScope,

    /// Maximum connections in pool.
    pub pool_max_size: usize,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Read timeout for operations.
    pub read_timeout: Duration,
}

impl LdapConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> LdapConfigBuilder {
        LdapConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// ## Security
    ///
    /// This method enforces LDAPS-only connections.
    pub fn validate(&self) -> LdapResult<()> {
        // CRITICAL: Enforce LDAPS-only
        validate_ldaps_url(&self.connection_url)?;

        if self.bind_dn.is_empty() {
            return Err(LdapError::config("bind_dn cannot be empty"));
        }

        if self.pool_max_size == 0 {
            return Err(LdapError::config("pool_max_size must be at least 1"));
        }

        Ok(())
    }
}

/// Validates that a URL uses LDAPS.
///
/// ## Security
///
/// **CRITICAL**: Only `ldaps://` URLs are accepted.
/// - `ldap://` is rejected (cleartext credentials)
/// - STARTTLS is not supported (vulnerable to downgrade attacks)
fn validate_ldaps_url(url: &str) -> LdapResult<()> {
    let url_lower = url.to_lowercase();

    if !url_lower.starts_with("ldaps://") {
        return Err(LdapError::InsecureProtocol);
    }

    // "ldaps://" is 8 chars
    if url.len() <= 8 {
        return Err(LdapError::config("Invalid LDAPS URL: missing host"));
    }

    Ok(())
}

/// Builder for LDAP connection configuration.
#[derive(Debug, Default)]
pub struct LdapConfigBuilder {
    connection_url: Option<String>,
    bind_dn: Option<String>,
    bind_credential: Option<String>,
    validate_certificates: bool,
    search_scope: SearchScope,
    pool_max_size: usize,
    connection_timeout: Duration,
    read_timeout: Duration,
}

impl LdapConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validate_certificates: true,
            pool_max_size: 10,
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }

    /// Sets the connection URL (must be ldaps://).
    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    /// Sets the bind DN.
    #[must_use]
    pub fn bind_dn(mut self, dn: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self
    }

    /// Sets the bind credential (password).
    #[must_use]
    pub fn bind_credential(mut self, credential: impl Into<String>) -> Self {
        self.bind_credential = Some(credential.into());
        self
    }

    /// Sets whether to validate certificates.
    #[must_use]
    pub const fn validate_certificates(mut self, validate: bool) -> Self {
        self.validate_certificates = validate;
        self
    }

    /// Sets the search scope.
    #[must_use]
    pub const fn search_scope(mut self, scope: SearchScope) -> Self {
        self.search_scope = scope;
        self
    }

    /// Sets the maximum pool size.
    #[must_use]
    pub const fn pool_max_size(mut self, max: usize) -> Self {
        self.pool_max_size = max;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing
    /// - Connection URL does not use LDAPS
    pub fn build(self) -> LdapResult<LdapConfig> {
        let config = LdapConfig {
            connection_url: self
                .connection_url
                .ok_or_else(|| LdapError::config("connection_url is required"))?,
            bind_dn: self
                .bind_dn
                .ok_or_else(|| LdapError::config("bind_dn is required"))?,
            bind_credential: self
                .bind_credential
                .ok_or_else(|| LdapError::config("bind_credential is required"))?,
            validate_certificates: self.validate_certificates,
            search_scope: self.search_scope,
            pool_max_size: self.pool_max_size,
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
        };

        // Validate configuration (includes LDAPS check)
        config.validate()?;

        Ok(config)
    }
}

// ============================================================================
// Group Search Configuration
// ============================================================================

/// Settings for nested group search.
///
/// Immutable once built. The requested attribute set already contains the
/// role attribute, so concurrent traversals share it without locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSearchConfig {
    group_search_base: Option<String>,
    group_search_filter: FilterTemplate,
    group_role_attribute: String,
    role_prefix: String,
    convert_to_upper_case: bool,
    default_role: Option<String>,
    max_search_depth: u32,
    requested_attributes: BTreeSet<String>,
}

impl GroupSearchConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> GroupSearchConfigBuilder {
        GroupSearchConfigBuilder::new()
    }

    /// Returns the group search base, or `None` when group search is disabled.
    #[must_use]
    pub fn group_search_base(&self) -> Option<&str> {
        self.group_search_base.as_deref()
    }

    /// Returns whether group search is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.group_search_base.is_some()
    }

    /// Returns the group search filter template.
    #[must_use]
    pub const fn group_search_filter(&self) -> &FilterTemplate {
        &self.group_search_filter
    }

    /// Returns the attribute holding role labels.
    #[must_use]
    pub fn group_role_attribute(&self) -> &str {
        &self.group_role_attribute
    }

    /// Returns the role prefix.
    #[must_use]
    pub fn role_prefix(&self) -> &str {
        &self.role_prefix
    }

    /// Returns whether role labels are uppercased.
    #[must_use]
    pub const fn convert_to_upper_case(&self) -> bool {
        self.convert_to_upper_case
    }

    /// Returns the role granted to every principal, if any.
    #[must_use]
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref()
    }

    /// Returns the maximum number of nested search levels.
    #[must_use]
    pub const fn max_search_depth(&self) -> u32 {
        self.max_search_depth
    }

    /// Returns the attributes fetched for each group entry.
    #[must_use]
    pub const fn requested_attributes(&self) -> &BTreeSet<String> {
        &self.requested_attributes
    }
}

impl Default for GroupSearchConfig {
    fn default() -> Self {
        GroupSearchConfigBuilder::new().finish()
    }
}

/// Builder for group search configuration.
#[derive(Debug, Clone)]
pub struct GroupSearchConfigBuilder {
    group_search_base: Option<String>,
    group_search_filter: Option<String>,
    group_role_attribute: String,
    role_prefix: String,
    convert_to_upper_case: bool,
    default_role: Option<String>,
    max_search_depth: u32,
    requested_attributes: BTreeSet<String>,
}

impl Default for GroupSearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupSearchConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            group_search_base: None,
            group_search_filter: None,
            group_role_attribute: DEFAULT_GROUP_ROLE_ATTRIBUTE.to_string(),
            role_prefix: DEFAULT_ROLE_PREFIX.to_string(),
            convert_to_upper_case: true,
            default_role: None,
            max_search_depth: DEFAULT_MAX_SEARCH_DEPTH,
            requested_attributes: BTreeSet::new(),
        }
    }

    /// Sets the group search base. An empty base disables group search.
    #[must_use]
    pub fn group_search_base(mut self, base: impl Into<String>) -> Self {
        self.group_search_base = Some(base.into());
        self
    }

    /// Sets the group search filter template.
    #[must_use]
    pub fn group_search_filter(mut self, filter: impl Into<String>) -> Self {
        self.group_search_filter = Some(filter.into());
        self
    }

    /// Sets the attribute holding role labels.
    #[must_use]
    pub fn group_role_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.group_role_attribute = attribute.into();
        self
    }

    /// Sets the role prefix.
    #[must_use]
    pub fn role_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.role_prefix = prefix.into();
        self
    }

    /// Sets whether role labels are uppercased.
    #[must_use]
    pub const fn convert_to_upper_case(mut self, upper: bool) -> Self {
        self.convert_to_upper_case = upper;
        self
    }

    /// Sets a role granted to every principal.
    #[must_use]
    pub fn default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    /// Sets the maximum number of nested search levels.
    #[must_use]
    pub const fn max_search_depth(mut self, depth: u32) -> Self {
        self.max_search_depth = depth;
        self
    }

    /// Adds attributes to fetch for each group entry.
    #[must_use]
    pub fn requested_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_attributes
            .extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::InvalidFilter` if the filter template is malformed.
    pub fn build(mut self) -> LdapResult<GroupSearchConfig> {
        let filter = match self.group_search_filter.take() {
            Some(raw) => FilterTemplate::parse(raw)?,
            None => FilterTemplate::default(),
        };

        Ok(self.assemble(filter))
    }

    fn finish(self) -> GroupSearchConfig {
        self.assemble(FilterTemplate::default())
    }

    fn assemble(self, group_search_filter: FilterTemplate) -> GroupSearchConfig {
        let group_search_base = self
            .group_search_base
            .filter(|base| !base.trim().is_empty());

        let mut requested_attributes = self.requested_attributes;
        if !self.group_role_attribute.trim().is_empty() {
            requested_attributes.insert(self.group_role_attribute.clone());
        }

        let default_role = self.default_role.filter(|role| !role.is_empty());

        GroupSearchConfig {
            group_search_base,
            group_search_filter,
            group_role_attribute: self.group_role_attribute,
            role_prefix: self.role_prefix,
            convert_to_upper_case: self.convert_to_upper_case,
            default_role,
            max_search_depth: self.max_search_depth,
            requested_attributes,
        }
    }
}
