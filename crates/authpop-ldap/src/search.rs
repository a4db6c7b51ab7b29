//! LDAP search operations.
//!
//! Provides the `ldap3`-backed [`DirectorySearchClient`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use ldap3::SearchEntry;

use crate::client::DirectorySearchClient;
use crate::config::LdapConfig;
use crate::connection::LdapConnectionPool;
use crate::entry::DirectoryEntry;
use crate::error::{LdapError, LdapResult};
use crate::filter::{FilterTemplate, FILTER_SLOTS};

/// Searches an LDAP directory over a pooled LDAPS connection.
pub struct LdapDirectoryClient {
    pool: LdapConnectionPool,
}

impl LdapDirectoryClient {
    /// Creates a client, validating the configuration first.
    ///
    /// No connection is opened until the first search.
    pub fn new(config: LdapConfig) -> LdapResult<Self> {
        config.validate()?;
        Ok(Self {
            pool: LdapConnectionPool::new(config),
        })
    }

    /// Tests connectivity and the service account bind.
    pub async fn test_connection(&self) -> LdapResult<()> {
        self.pool.test_connection().await
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        self.pool.config()
    }
}

#[async_trait]
impl DirectorySearchClient for LdapDirectoryClient {
    async fn search(
        &self,
        base: &str,
        filter: &FilterTemplate,
        params: [&str; FILTER_SLOTS],
        attributes: &BTreeSet<String>,
    ) -> LdapResult<Vec<DirectoryEntry>> {
        let rendered = filter.render(params);
        let config = self.pool.config();
        let scope = config.search_scope.to_ldap3();
        let timeout = config.read_timeout;
        let attrs: Vec<&str> = attributes.iter().map(String::as_str).collect();

        let mut conn = self.pool.get().await?;

        let outcome = conn
            .ldap_mut()
            .with_timeout(timeout)
            .search(base, scope, &rendered, attrs)
            .await
            .map_err(classify)
            .and_then(|rs| rs.success().map_err(classify));

        let (rs, _result) = match outcome {
            Ok(found) => found,
            Err(e) => {
                conn.invalidate();
                return Err(e);
            }
        };

        let entries: Vec<DirectoryEntry> = rs
            .into_iter()
            .map(SearchEntry::construct)
            .map(DirectoryEntry::from_search_entry)
            .collect();

        tracing::trace!(
            base = %base,
            filter = %rendered,
            count = entries.len(),
            "LDAP search complete"
        );

        Ok(entries)
    }
}

/// Maps ldap3 failures onto the crate's error kinds.
fn classify(err: ldap3::LdapError) -> LdapError {
    match err {
        ldap3::LdapError::Timeout { .. } => LdapError::Timeout,
        ldap3::LdapError::LdapResult { result } => {
            LdapError::Search(format!("{} (rc={})", result.text, result.rc))
        }
        other => LdapError::Search(other.to_string()),
    }
}
