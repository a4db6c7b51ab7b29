//! In-memory directory.
//!
//! Answers group searches from a fixed set of entries. A search matches every
//! entry under the base whose membership attribute lists the identity passed
//! in slot `{0}`. Queries are recorded, and failures can be injected to
//! exercise error paths.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::DirectorySearchClient;
use crate::entry::DirectoryEntry;
use crate::error::{LdapError, LdapResult};
use crate::filter::{FilterTemplate, FILTER_SLOTS};

/// A query received by [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    /// Search base.
    pub base: String,
    /// Filter with parameters substituted.
    pub filter: String,
    /// Root identity (slot `{0}`).
    pub identity: String,
    /// Root label (slot `{1}`).
    pub label: String,
    /// Requested attributes.
    pub attributes: BTreeSet<String>,
}

/// Directory backed by a fixed list of entries.
#[derive(Debug)]
pub struct InMemoryDirectory {
    entries: Vec<DirectoryEntry>,
    membership_attribute: String,
    queries: Mutex<Vec<RecordedQuery>>,
    fail_on: Option<usize>,
    issued: AtomicUsize,
}

impl InMemoryDirectory {
    /// Creates a directory whose groups list members in `member`.
    #[must_use]
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            membership_attribute: "member".to_string(),
            queries: Mutex::new(Vec::new()),
            fail_on: None,
            issued: AtomicUsize::new(0),
        }
    }

    /// Sets the attribute listing a group's members.
    #[must_use]
    pub fn with_membership_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.membership_attribute = attribute.into();
        self
    }

    /// Fails the `n`-th query (1-based) with a connection error.
    #[must_use]
    pub const fn fail_on_query(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Returns every query received so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().clone()
    }

    /// Returns the number of queries received so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Returns the entries the directory was built from.
    #[must_use]
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    fn projected(entry: &DirectoryEntry, attributes: &BTreeSet<String>) -> DirectoryEntry {
        if attributes.is_empty() {
            return entry.clone();
        }

        attributes
            .iter()
            .fold(DirectoryEntry::new(entry.dn.clone()), |out, name| {
                let values = entry.values(name);
                if values.is_empty() {
                    out
                } else {
                    out.with_attr(name.clone(), values.iter().cloned())
                }
            })
    }
}

#[async_trait]
impl DirectorySearchClient for InMemoryDirectory {
    async fn search(
        &self,
        base: &str,
        filter: &FilterTemplate,
        params: [&str; FILTER_SLOTS],
        attributes: &BTreeSet<String>,
    ) -> LdapResult<Vec<DirectoryEntry>> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.queries.lock().push(RecordedQuery {
            base: base.to_string(),
            filter: filter.render(params),
            identity: params[0].to_string(),
            label: params[1].to_string(),
            attributes: attributes.clone(),
        });

        if self.fail_on == Some(n) {
            return Err(LdapError::connection(format!(
                "injected failure on query {n}"
            )));
        }

        let identity = params[0];
        let matches = self
            .entries
            .iter()
            .filter(|entry| is_under(&entry.dn, base))
            .filter(|entry| {
                entry
                    .values(&self.membership_attribute)
                    .iter()
                    .any(|member| member.eq_ignore_ascii_case(identity))
            })
            .map(|entry| Self::projected(entry, attributes))
            .collect();

        Ok(matches)
    }
}

/// Checks whether `dn` lies at or below `base`, ignoring case.
fn is_under(dn: &str, base: &str) -> bool {
    if base.is_empty() {
        return true;
    }

    let dn = dn.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    dn == base || dn.ends_with(&format!(",{base}"))
}
