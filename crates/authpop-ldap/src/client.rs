//! Directory search seam.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::DirectoryEntry;
use crate::error::LdapResult;
use crate::filter::{FilterTemplate, FILTER_SLOTS};

/// Executes multi-valued attribute searches against a directory.
///
/// Implementations must be thread-safe and support concurrent access.
/// Timeouts, retries and connection handling belong to the implementation.
#[async_trait]
pub trait DirectorySearchClient: Send + Sync {
    /// Searches `base` with `filter`, rendered with `params`.
    ///
    /// Every returned entry carries its own DN. An empty `attributes` set
    /// asks for all user attributes.
    ///
    /// ## Errors
    ///
    /// Returns an error on connectivity or protocol failure.
    async fn search(
        &self,
        base: &str,
        filter: &FilterTemplate,
        params: [&str; FILTER_SLOTS],
        attributes: &BTreeSet<String>,
    ) -> LdapResult<Vec<DirectoryEntry>>;
}

#[async_trait]
impl<T: DirectorySearchClient + ?Sized> DirectorySearchClient for Arc<T> {
    async fn search(
        &self,
        base: &str,
        filter: &FilterTemplate,
        params: [&str; FILTER_SLOTS],
        attributes: &BTreeSet<String>,
    ) -> LdapResult<Vec<DirectoryEntry>> {
        (**self).search(base, filter, params, attributes).await
    }
}
