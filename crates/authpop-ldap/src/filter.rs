//! Search filter templates.
//!
//! Group search filters are written with positional placeholders, e.g.
//! `(member={0})` or `(|(member={0})(memberUid={1}))`. Slot `{0}` receives the
//! identity being searched for and slot `{1}` its label. Substituted values
//! are escaped per RFC 4515 so that they can never change the filter's shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LdapError, LdapResult};

/// Number of substitution slots a template may reference.
pub const FILTER_SLOTS: usize = 2;

/// A validated LDAP filter template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilterTemplate {
    raw: String,
}

impl FilterTemplate {
    /// Parses and validates a filter template.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::InvalidFilter` if the template is empty, has
    /// unbalanced parentheses, nests a `{` inside a brace group, or references
    /// a slot other than `{0}`/`{1}`.
    pub fn parse(raw: impl Into<String>) -> LdapResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(LdapError::invalid_filter("filter template cannot be empty"));
        }

        let mut open = 0usize;
        for c in raw.chars() {
            match c {
                '(' => open += 1,
                ')' => {
                    open = open.checked_sub(1).ok_or_else(|| {
                        LdapError::invalid_filter(format!("unbalanced ')' in '{raw}'"))
                    })?;
                }
                _ => {}
            }
        }
        if open != 0 {
            return Err(LdapError::invalid_filter(format!(
                "unbalanced '(' in '{raw}'"
            )));
        }

        for segment in Segments::new(&raw) {
            let Segment::Braced(token) = segment else {
                continue;
            };
            if token.contains('{') {
                return Err(LdapError::invalid_filter(format!("nested '{{' in '{raw}'")));
            }
            if !is_slot(token) {
                continue;
            }
            match token.parse::<usize>() {
                Ok(slot) if slot < FILTER_SLOTS => {}
                _ => {
                    return Err(LdapError::invalid_filter(format!(
                        "unknown placeholder '{{{token}}}' in '{raw}'"
                    )))
                }
            }
        }

        Ok(Self { raw })
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substitutes escaped parameters into the template.
    ///
    /// Text between braces that is not a slot number is copied verbatim.
    #[must_use]
    pub fn render(&self, params: [&str; FILTER_SLOTS]) -> String {
        let mut out = String::with_capacity(self.raw.len() + params[0].len());
        for segment in Segments::new(&self.raw) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Braced(token) => {
                    let value = is_slot(token)
                        .then(|| token.parse::<usize>().ok())
                        .flatten()
                        .and_then(|i| params.get(i));
                    match value {
                        Some(value) => out.push_str(&ldap_escape(value)),
                        None => {
                            out.push('{');
                            out.push_str(token);
                            out.push('}');
                        }
                    }
                }
            }
        }
        out
    }
}

impl Default for FilterTemplate {
    fn default() -> Self {
        Self {
            raw: "(member={0})".to_string(),
        }
    }
}

impl fmt::Display for FilterTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for FilterTemplate {
    type Error = LdapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FilterTemplate> for String {
    fn from(value: FilterTemplate) -> Self {
        value.raw
    }
}

/// Whether a brace group's text is a slot number.
fn is_slot(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// A piece of a filter template.
enum Segment<'a> {
    /// Text copied as is.
    Literal(&'a str),
    /// Text between a `{` and the next `}`.
    Braced(&'a str),
}

/// Splits a template into literal text and brace groups.
///
/// A `{` opens a group that ends at the next `}`; a `{` with no closing
/// brace is literal.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(raw: &'a str) -> Self {
        Self { rest: raw }
    }

    fn take_rest(&mut self) -> &'a str {
        std::mem::take(&mut self.rest)
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find('{') {
            Some(0) => {
                let after = &self.rest[1..];
                match after.find('}') {
                    Some(end) => {
                        self.rest = &after[end + 1..];
                        Some(Segment::Braced(&after[..end]))
                    }
                    None => Some(Segment::Literal(self.take_rest())),
                }
            }
            Some(start) => {
                let (text, rest) = self.rest.split_at(start);
                self.rest = rest;
                Some(Segment::Literal(text))
            }
            None => Some(Segment::Literal(self.take_rest())),
        }
    }
}

/// Escapes special characters in LDAP filter values.
#[must_use]
pub fn ldap_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}
