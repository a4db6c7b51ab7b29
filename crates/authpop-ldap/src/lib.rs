//! # authpop-ldap
//!
//! Nested LDAP group search for authority population.
//!
//! Given a principal's DN, [`NestedGroupResolver`] finds every group the
//! principal belongs to directly or through other groups, and turns each one
//! into an [`Authority`] such as `ROLE_DEVELOPERS`. Directory access goes
//! through [`DirectorySearchClient`]; this crate ships an `ldap3`-backed
//! implementation and an in-memory one.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use authpop_ldap::{GroupSearchConfig, LdapConfig, LdapDirectoryClient, NestedGroupResolver};
//!
//! # async fn example() -> authpop_ldap::LdapResult<()> {
//! let client = LdapDirectoryClient::new(
//!     LdapConfig::builder()
//!         .connection_url("ldaps://ldap.example.com:636")
//!         .bind_dn("cn=reader,dc=example,dc=com")
//!         .bind_credential("secret")
//!         .build()?,
//! )?;
//!
//! let groups = GroupSearchConfig::builder()
//!     .group_search_base("ou=groups,dc=example,dc=com")
//!     .build()?;
//!
//! let resolver = NestedGroupResolver::new(Arc::new(client), groups);
//! let _authorities = resolver
//!     .resolve("uid=alice,ou=people,dc=example,dc=com", "alice")
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod authority;
pub mod client;
pub mod config;
pub mod connection;
pub mod entry;
pub mod error;
pub mod filter;
pub mod memory;
pub mod populator;
pub mod search;

pub use authority::{normalize_role, Authority, AuthoritySet};
pub use client::DirectorySearchClient;
pub use config::{
    GroupSearchConfig, GroupSearchConfigBuilder, LdapConfig, LdapConfigBuilder, SearchScope,
};
pub use entry::{DirectoryEntry, DN_KEY};
pub use error::{LdapError, LdapResult};
pub use filter::{ldap_escape, FilterTemplate, FILTER_SLOTS};
pub use memory::{InMemoryDirectory, RecordedQuery};
pub use populator::{AuthoritiesPopulator, NestedGroupResolver, Resolution, ResolutionStats};
pub use search::LdapDirectoryClient;
