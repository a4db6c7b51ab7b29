//! Nested group resolution.
//!
//! Follows group-of-group membership from a principal up through its parent
//! groups and turns every group found into an [`Authority`].
//!
//! ## Traversal
//!
//! Each level issues one search for the groups listing the current root as a
//! member. Entries are handled depth-first in the order the directory returns
//! them: an entry's roles are registered, then its own parents are searched
//! before the next sibling is looked at.
//!
//! Two things stop a branch:
//!
//! - Registering a `(role, dn)` pair that is already in the result set. The
//!   entry has been reached along the same edge before, so the branch is a
//!   membership cycle and is not descended into.
//! - The depth budget reaching zero.
//!
//! The same DN reached under two different roles is a diamond, not a cycle,
//! and both roles are kept.

use std::collections::HashSet;
use std::sync::Arc;
use std::vec;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::authority::{normalize_role, Authority, AuthoritySet};
use crate::client::DirectorySearchClient;
use crate::config::GroupSearchConfig;
use crate::entry::DirectoryEntry;
use crate::error::{LdapError, LdapResult};

/// Counters collected during one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    /// Directory queries issued.
    pub queries: usize,
    /// Branches stopped because a `(role, dn)` pair was seen again.
    pub cycles_detected: usize,
    /// Branches stopped by the depth limit.
    pub depth_exhausted: usize,
}

/// Authorities found for a principal, with traversal counters.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The flattened authority set.
    pub authorities: AuthoritySet,
    /// Traversal counters.
    pub stats: ResolutionStats,
}

/// One level of the traversal: the entries still to be handled and the depth
/// budget left for searching their parents.
struct Frame {
    entries: vec::IntoIter<DirectoryEntry>,
    depth: u32,
}

/// Resolves nested group membership into a flat authority set.
///
/// The resolver holds no per-call state, so one instance can serve any
/// number of concurrent resolutions.
#[derive(Clone)]
pub struct NestedGroupResolver {
    client: Arc<dyn DirectorySearchClient>,
    config: Arc<GroupSearchConfig>,
}

impl NestedGroupResolver {
    /// Creates a resolver over a directory client.
    #[must_use]
    pub fn new(client: Arc<dyn DirectorySearchClient>, config: GroupSearchConfig) -> Self {
        if !config.is_enabled() {
            info!("No group search base configured; nested group search is disabled");
        }

        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Returns the group search configuration.
    #[must_use]
    pub fn config(&self) -> &GroupSearchConfig {
        &self.config
    }

    /// Resolves the authorities reachable from `principal_dn`.
    ///
    /// `principal_label` fills slot `{1}` of the search filter on the first
    /// query.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Transport` if any directory query fails. No partial
    /// result is returned.
    pub async fn resolve(
        &self,
        principal_dn: &str,
        principal_label: &str,
    ) -> LdapResult<AuthoritySet> {
        self.resolve_with_stats(principal_dn, principal_label)
            .await
            .map(|resolution| resolution.authorities)
    }

    /// Resolves authorities and reports traversal counters.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Transport` if any directory query fails.
    #[instrument(skip(self), fields(principal = %principal_dn))]
    pub async fn resolve_with_stats(
        &self,
        principal_dn: &str,
        principal_label: &str,
    ) -> LdapResult<Resolution> {
        let mut resolution = Resolution::default();

        let Some(base) = self.config.group_search_base() else {
            return Ok(resolution);
        };

        let Some(root) = self
            .search_level(
                base,
                principal_dn,
                principal_label,
                self.config.max_search_depth(),
                &mut resolution.stats,
            )
            .await?
        else {
            return Ok(resolution);
        };

        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth;

            let (dn, label, circular) = self.register(entry, &mut resolution.authorities);

            if circular {
                resolution.stats.cycles_detected += 1;
                warn!(
                    dn = %dn,
                    "Membership cycle detected; not searching parents of this group"
                );
                continue;
            }

            if let Some(next) = self
                .search_level(base, &dn, &label, depth - 1, &mut resolution.stats)
                .await?
            {
                stack.push(next);
            }
        }

        debug!(
            authorities = resolution.authorities.len(),
            queries = resolution.stats.queries,
            cycles = resolution.stats.cycles_detected,
            depth_exhausted = resolution.stats.depth_exhausted,
            "Nested group search complete"
        );

        Ok(resolution)
    }

    /// Adds the configured default role, attributed to `user_dn`.
    pub fn add_default_role(&self, user_dn: &str, authorities: &mut AuthoritySet) {
        if let Some(default_role) = self.config.default_role() {
            let role = normalize_role(
                default_role,
                self.config.convert_to_upper_case(),
                self.config.role_prefix(),
            );
            authorities.insert(Authority::new(role, user_dn));
        }
    }

    /// Searches for the groups listing `root_dn` as a member.
    ///
    /// Returns `None` without querying when the depth budget is spent.
    async fn search_level(
        &self,
        base: &str,
        root_dn: &str,
        root_label: &str,
        depth: u32,
        stats: &mut ResolutionStats,
    ) -> LdapResult<Option<Frame>> {
        if depth == 0 {
            stats.depth_exhausted += 1;
            debug!(root = %root_dn, "Search depth exhausted");
            return Ok(None);
        }

        let filter = self.config.group_search_filter();
        debug!(
            base = %base,
            filter = %filter,
            root = %root_dn,
            label = %root_label,
            depth,
            "Searching for parent groups"
        );

        stats.queries += 1;
        let entries = self
            .client
            .search(
                base,
                filter,
                [root_dn, root_label],
                self.config.requested_attributes(),
            )
            .await
            .map_err(LdapError::into_transport)?;

        Ok(Some(Frame {
            entries: entries.into_iter(),
            depth,
        }))
    }

    /// Registers the authorities of one entry.
    ///
    /// Returns the entry's DN, the label for searching its parents, and
    /// whether any of its `(role, dn)` pairs had already been registered.
    fn register(
        &self,
        entry: DirectoryEntry,
        authorities: &mut AuthoritySet,
    ) -> (String, String, bool) {
        let raw_roles = distinct(entry.values(self.config.group_role_attribute()));
        let DirectoryEntry { dn, attributes } = entry;
        let attributes = Arc::new(attributes);

        let mut circular = false;
        for raw in &raw_roles {
            let role = normalize_role(
                raw,
                self.config.convert_to_upper_case(),
                self.config.role_prefix(),
            );
            let added = authorities.insert(Authority::with_attributes(
                role,
                dn.clone(),
                Arc::clone(&attributes),
            ));
            if !added {
                circular = true;
            }
        }

        let label = raw_roles.into_iter().next().unwrap_or_else(|| dn.clone());
        (dn, label, circular)
    }
}

/// Drops repeated values, keeping first-seen order.
fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .iter()
        .filter(|value| seen.insert(value.as_str()))
        .cloned()
        .collect()
}

/// Supplies the authorities granted to an authenticated user.
#[async_trait]
pub trait AuthoritiesPopulator: Send + Sync {
    /// Returns the authorities for the user at `user_dn`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the authorities cannot be determined.
    async fn granted_authorities(&self, user_dn: &str, username: &str)
        -> LdapResult<AuthoritySet>;
}

#[async_trait]
impl AuthoritiesPopulator for NestedGroupResolver {
    async fn granted_authorities(
        &self,
        user_dn: &str,
        username: &str,
    ) -> LdapResult<AuthoritySet> {
        let mut authorities = self.resolve(user_dn, username).await?;
        self.add_default_role(user_dn, &mut authorities);
        Ok(authorities)
    }
}
