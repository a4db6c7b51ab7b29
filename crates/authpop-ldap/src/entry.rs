//! Directory entries returned by group searches.

use std::collections::HashMap;

use ldap3::SearchEntry;

/// Well-known key under which an entry exposes its own distinguished name.
pub const DN_KEY: &str = "dn";

/// Represents a directory entry with parsed attributes.
///
/// Entries are built fresh for each search response and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished Name.
    pub dn: String,

    /// Attributes (all values are multi-valued).
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds values for an attribute.
    #[must_use]
    pub fn with_attr<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Creates a new entry from an ldap3 search result.
    ///
    /// Binary attributes are dropped; group role labels are always text.
    #[must_use]
    pub fn from_search_entry(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }

    /// Gets all values of an attribute.
    ///
    /// Attribute names are matched exactly first, then case-insensitively.
    /// [`DN_KEY`] yields the entry's own DN.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        if name == DN_KEY {
            return std::slice::from_ref(&self.dn);
        }

        if let Some(values) = self.attributes.get(name) {
            return values;
        }

        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Checks if the entry has an attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        !self.values(name).is_empty()
    }
}
