//! CLI configuration.
//!
//! Read from `~/.authpop/authpop.toml` unless `--config` names another file:
//!
//! ```toml
//! output_format = "table"
//!
//! [directory]
//! connection_url = "ldaps://ldap.example.com:636"
//! bind_dn = "cn=reader,dc=example,dc=com"
//! search_scope = "SUBTREE"
//! read_timeout_secs = 10
//!
//! [groups]
//! search_base = "ou=groups,dc=example,dc=com"
//! search_filter = "(uniqueMember={0})"
//! max_search_depth = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use authpop_ldap::config::{
    DEFAULT_GROUP_ROLE_ATTRIBUTE, DEFAULT_MAX_SEARCH_DEPTH, DEFAULT_ROLE_PREFIX,
};
use authpop_ldap::{GroupSearchConfig, LdapConfig, SearchScope};
use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Directory connection settings.
    #[serde(default)]
    pub directory: DirectorySection,

    /// Group search settings.
    #[serde(default)]
    pub groups: GroupsSection,
}

/// `[directory]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    /// LDAPS URL of the directory server.
    pub connection_url: String,

    /// DN of the service account used for searches.
    pub bind_dn: String,

    /// Service account password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_credential: Option<String>,

    /// Whether to validate server certificates.
    pub validate_certificates: bool,

    /// Scope of each group search.
    pub search_scope: SearchScope,

    /// Maximum pooled connections.
    pub pool_max_size: usize,

    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,

    /// Per-search timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            connection_url: String::new(),
            bind_dn: String::new(),
            bind_credential: None,
            validate_certificates: true,
            search_scope: SearchScope::default(),
            pool_max_size: 10,
            connection_timeout_secs: 5,
            read_timeout_secs: 30,
        }
    }
}

/// `[groups]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsSection {
    /// Base DN for group searches. Unset disables group search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_base: Option<String>,

    /// Filter template; `{0}` is the member DN, `{1}` its label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_filter: Option<String>,

    /// Attribute holding role labels.
    pub role_attribute: String,

    /// Prefix prepended to every role.
    pub role_prefix: String,

    /// Whether role labels are uppercased.
    pub convert_to_upper_case: bool,

    /// Role granted to every user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_role: Option<String>,

    /// Maximum nested search levels.
    pub max_search_depth: u32,

    /// Extra attributes fetched for each group.
    pub requested_attributes: Vec<String>,
}

impl Default for GroupsSection {
    fn default() -> Self {
        Self {
            search_base: None,
            search_filter: None,
            role_attribute: DEFAULT_GROUP_ROLE_ATTRIBUTE.to_string(),
            role_prefix: DEFAULT_ROLE_PREFIX.to_string(),
            convert_to_upper_case: true,
            default_role: None,
            max_search_depth: DEFAULT_MAX_SEARCH_DEPTH,
            requested_attributes: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config_path = Self::resolve_path(path)?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves configuration to `path`, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> CliResult<PathBuf> {
        let config_path = Self::resolve_path(path)?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    /// Gets the default configuration file path.
    pub fn config_path() -> CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".authpop").join("authpop.toml"))
    }

    /// Gets the effective configuration file path.
    pub fn resolve_path(path: Option<&Path>) -> CliResult<PathBuf> {
        path.map_or_else(Self::config_path, |p| Ok(p.to_path_buf()))
    }

    /// Replaces the bind credential when one was supplied outside the file.
    #[must_use]
    pub fn with_bind_credential(mut self, credential: Option<String>) -> Self {
        if let Some(credential) = credential {
            self.directory.bind_credential = Some(credential);
        }
        self
    }

    /// Builds the directory connection configuration.
    pub fn ldap_config(&self) -> CliResult<LdapConfig> {
        let dir = &self.directory;
        if dir.connection_url.is_empty() {
            return Err(CliError::Config(
                "directory.connection_url is not set".to_string(),
            ));
        }

        let credential = dir.bind_credential.as_deref().ok_or_else(|| {
            CliError::Config(
                "no bind credential; set directory.bind_credential or AUTHPOP_BIND_CREDENTIAL"
                    .to_string(),
            )
        })?;

        let config = LdapConfig::builder()
            .connection_url(&dir.connection_url)
            .bind_dn(&dir.bind_dn)
            .bind_credential(credential)
            .validate_certificates(dir.validate_certificates)
            .search_scope(dir.search_scope)
            .pool_max_size(dir.pool_max_size)
            .connection_timeout(Duration::from_secs(dir.connection_timeout_secs))
            .read_timeout(Duration::from_secs(dir.read_timeout_secs))
            .build()?;

        Ok(config)
    }

    /// Builds the group search configuration.
    pub fn group_search_config(&self, max_depth: Option<u32>) -> CliResult<GroupSearchConfig> {
        let groups = &self.groups;

        let mut builder = GroupSearchConfig::builder()
            .group_role_attribute(&groups.role_attribute)
            .role_prefix(&groups.role_prefix)
            .convert_to_upper_case(groups.convert_to_upper_case)
            .max_search_depth(max_depth.unwrap_or(groups.max_search_depth))
            .requested_attributes(groups.requested_attributes.iter().cloned());

        if let Some(base) = &groups.search_base {
            builder = builder.group_search_base(base);
        }
        if let Some(filter) = &groups.search_filter {
            builder = builder.group_search_filter(filter);
        }
        if let Some(role) = &groups.default_role {
            builder = builder.default_role(role);
        }

        Ok(builder.build()?)
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Role names only, one per line.
    Quiet,
}
