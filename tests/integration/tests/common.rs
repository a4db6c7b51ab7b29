//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use authpop_ldap::{
    AuthoritySet, DirectoryEntry, DirectorySearchClient, GroupSearchConfig,
    GroupSearchConfigBuilder, InMemoryDirectory, NestedGroupResolver,
};

/// Base DN of every group in the fixture directory.
pub const GROUPS_BASE: &str = "ou=groups,dc=example,dc=com";

/// Test environment wiring a resolver to an in-memory directory.
pub struct TestEnv {
    /// Directory the resolver searches.
    pub directory: Arc<InMemoryDirectory>,
    /// Resolver under test.
    pub resolver: NestedGroupResolver,
}

impl TestEnv {
    /// Creates an environment over the organisation fixture.
    pub fn new(config: GroupSearchConfig) -> Self {
        Self::with_directory(organisation(), config)
    }

    /// Creates an environment over a custom directory.
    pub fn with_directory(directory: InMemoryDirectory, config: GroupSearchConfig) -> Self {
        init_tracing();

        let directory = Arc::new(directory);
        let client: Arc<dyn DirectorySearchClient> = directory.clone();
        Self {
            directory,
            resolver: NestedGroupResolver::new(client, config),
        }
    }
}

/// Initializes tracing once for the whole test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("authpop_ldap=debug")
        .with_test_writer()
        .try_init();
}

/// Group search settings scoped to [`GROUPS_BASE`].
pub fn groups_config() -> GroupSearchConfigBuilder {
    GroupSearchConfig::builder().group_search_base(GROUPS_BASE)
}

/// DN of a person.
pub fn person_dn(uid: &str) -> String {
    format!("uid={uid},ou=people,dc=example,dc=com")
}

/// DN of a group under [`GROUPS_BASE`].
pub fn group_dn(cn: &str) -> String {
    format!("cn={cn},{GROUPS_BASE}")
}

/// A group under [`GROUPS_BASE`] with the given members.
pub fn group(cn: &str, members: &[String]) -> DirectoryEntry {
    DirectoryEntry::new(group_dn(cn))
        .with_attr("cn", [cn])
        .with_attr("member", members.iter().cloned())
}

/// Sorted role names.
pub fn roles(authorities: &AuthoritySet) -> Vec<String> {
    let mut roles: Vec<String> = authorities.iter().map(|a| a.role().to_string()).collect();
    roles.sort();
    roles
}

/// Sorted `(role, dn)` pairs.
pub fn pairs(authorities: &AuthoritySet) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = authorities
        .iter()
        .map(|a| (a.role().to_string(), a.dn().to_string()))
        .collect();
    pairs.sort();
    pairs
}

/// Entries of a small organisation.
///
/// ```text
/// alice -> backend ----> engineering -> staff
///       -> frontend --/                /
/// bob   -> frontend                   /
/// carol -> staff ---------------------
///       -> oncall <-> incident          (cycle)
/// backend -> platform                   (cn: platform, infra)
/// alice -> legacy-admins                (outside the group base)
/// ```
pub fn organisation_entries() -> Vec<DirectoryEntry> {
    let alice = person_dn("alice");
    let bob = person_dn("bob");
    let carol = person_dn("carol");

    vec![
        group("backend", &[alice.clone()])
            .with_attr("description", ["Backend services team"]),
        group("frontend", &[bob, alice.clone()]),
        group("engineering", &[group_dn("backend"), group_dn("frontend")]),
        group("staff", &[group_dn("engineering"), carol.clone()]),
        DirectoryEntry::new(group_dn("platform"))
            .with_attr("cn", ["platform", "infra"])
            .with_attr("member", [group_dn("backend")]),
        group("oncall", &[carol, group_dn("incident")]),
        group("incident", &[group_dn("oncall")]),
        DirectoryEntry::new("cn=legacy-admins,ou=legacy,dc=example,dc=com")
            .with_attr("cn", ["legacy-admins"])
            .with_attr("member", [alice]),
    ]
}

/// The organisation as an in-memory directory.
pub fn organisation() -> InMemoryDirectory {
    InMemoryDirectory::new(organisation_entries())
}
