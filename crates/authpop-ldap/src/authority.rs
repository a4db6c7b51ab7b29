//! Authorities derived from directory groups.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;

/// Set of authorities produced by one resolution.
pub type AuthoritySet = HashSet<Authority>;

/// A normalized role name attributed to the directory entry it came from.
///
/// Two authorities are equal when both the role name and the source DN
/// match. The same role reached through two different entries is kept twice;
/// deriving the same role from the same entry again is a revisit.
#[derive(Debug, Clone, Serialize)]
pub struct Authority {
    role: String,
    dn: String,
    #[serde(skip)]
    attributes: Arc<HashMap<String, Vec<String>>>,
}

impl Authority {
    /// Creates an authority without entry attributes.
    #[must_use]
    pub fn new(role: impl Into<String>, dn: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            dn: dn.into(),
            attributes: Arc::default(),
        }
    }

    /// Creates an authority carrying the attributes of its source entry.
    #[must_use]
    pub fn with_attributes(
        role: impl Into<String>,
        dn: impl Into<String>,
        attributes: Arc<HashMap<String, Vec<String>>>,
    ) -> Self {
        Self {
            role: role.into(),
            dn: dn.into(),
            attributes,
        }
    }

    /// Returns the normalized role name.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the DN of the entry the role was derived from.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Returns the attributes of the source entry.
    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Vec<String>> {
        &self.attributes
    }

    /// Gets all values of a source entry attribute.
    ///
    /// Falls back to a case-insensitive match on the attribute name.
    #[must_use]
    pub fn attribute_values(&self, name: &str) -> &[String] {
        if let Some(values) = self.attributes.get(name) {
            return values;
        }

        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Gets the first value of a source entry attribute.
    #[must_use]
    pub fn first_attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute_values(name).first().map(String::as_str)
    }
}

impl PartialEq for Authority {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.dn == other.dn
    }
}

impl Eq for Authority {}

impl Hash for Authority {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.role.hash(state);
        self.dn.hash(state);
    }
}

/// Normalizes a raw role label.
///
/// Uppercases when requested, then prepends the prefix. An empty label
/// yields the prefix alone.
#[must_use]
pub fn normalize_role(raw: &str, convert_to_upper_case: bool, role_prefix: &str) -> String {
    let mut role = String::with_capacity(role_prefix.len() + raw.len());
    role.push_str(role_prefix);
    if convert_to_upper_case {
        role.push_str(&raw.to_uppercase());
    } else {
        role.push_str(raw);
    }
    role
}
