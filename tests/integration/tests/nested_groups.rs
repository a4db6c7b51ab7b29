//! Nested group resolution over the organisation fixture.

use authpop_ldap::{AuthoritiesPopulator, Authority, DirectoryEntry, InMemoryDirectory};

use crate::common::{
    group, group_dn, groups_config, organisation_entries, pairs, person_dn, roles, TestEnv,
};

#[tokio::test]
async fn test_transitive_closure() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().build()?);

    let resolution = env
        .resolver
        .resolve_with_stats(&person_dn("alice"), "alice")
        .await?;

    assert_eq!(
        roles(&resolution.authorities),
        vec![
            "ROLE_BACKEND",
            "ROLE_ENGINEERING",
            "ROLE_FRONTEND",
            "ROLE_INFRA",
            "ROLE_PLATFORM",
            "ROLE_STAFF",
        ]
    );
    assert!(resolution
        .authorities
        .contains(&Authority::new("ROLE_INFRA", group_dn("platform"))));
    assert_eq!(resolution.stats.queries, 6);
    assert_eq!(env.directory.query_count(), 6);

    Ok(())
}

#[tokio::test]
async fn test_result_is_independent_of_entry_order() -> anyhow::Result<()> {
    let forward = TestEnv::new(groups_config().build()?);

    let mut entries = organisation_entries();
    entries.reverse();
    let reversed =
        TestEnv::with_directory(InMemoryDirectory::new(entries), groups_config().build()?);

    let alice = person_dn("alice");
    let a = forward.resolver.resolve(&alice, "alice").await?;
    let b = reversed.resolver.resolve(&alice, "alice").await?;

    assert_eq!(pairs(&a), pairs(&b));

    Ok(())
}

#[tokio::test]
async fn test_groups_outside_base_are_ignored() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().build()?);

    let authorities = env.resolver.resolve(&person_dn("alice"), "alice").await?;

    assert!(authorities
        .iter()
        .all(|a| a.role() != "ROLE_LEGACY-ADMINS"));

    Ok(())
}

#[tokio::test]
async fn test_membership_cycle_terminates() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().max_search_depth(100).build()?);

    let resolution = env
        .resolver
        .resolve_with_stats(&person_dn("carol"), "carol")
        .await?;

    assert_eq!(
        roles(&resolution.authorities),
        vec!["ROLE_INCIDENT", "ROLE_ONCALL", "ROLE_STAFF"]
    );
    assert_eq!(resolution.stats.cycles_detected, 1);
    assert_eq!(resolution.stats.depth_exhausted, 0);
    assert_eq!(resolution.stats.queries, 4);

    Ok(())
}

#[tokio::test]
async fn test_two_group_cycle_from_group() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().build()?);

    let authorities = env.resolver.resolve(&group_dn("oncall"), "oncall").await?;

    assert_eq!(
        pairs(&authorities),
        vec![
            ("ROLE_INCIDENT".to_string(), group_dn("incident")),
            ("ROLE_ONCALL".to_string(), group_dn("oncall")),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_depth_zero_returns_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().max_search_depth(0).build()?);

    for uid in ["alice", "bob", "carol"] {
        let authorities = env.resolver.resolve(&person_dn(uid), uid).await?;
        assert!(authorities.is_empty(), "{uid} should have no authorities");
    }
    assert_eq!(env.directory.query_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_depth_limit_keeps_shallow_levels() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().max_search_depth(2).build()?);

    let resolution = env
        .resolver
        .resolve_with_stats(&person_dn("alice"), "alice")
        .await?;

    assert_eq!(
        roles(&resolution.authorities),
        vec![
            "ROLE_BACKEND",
            "ROLE_ENGINEERING",
            "ROLE_FRONTEND",
            "ROLE_INFRA",
            "ROLE_PLATFORM",
        ]
    );
    assert_eq!(resolution.stats.queries, 3);
    assert_eq!(resolution.stats.depth_exhausted, 2);

    Ok(())
}

#[tokio::test]
async fn test_diamond_membership() -> anyhow::Result<()> {
    // shared is reached from alice through both left and right, and carries
    // two role labels. Both labels survive; the second path stops at the
    // repeated pairs.
    let alice = person_dn("alice");
    let directory = InMemoryDirectory::new(vec![
        group("left", &[alice.clone()]),
        group("right", &[alice.clone()]),
        DirectoryEntry::new(group_dn("shared"))
            .with_attr("cn", ["shared", "common"])
            .with_attr("member", [group_dn("left"), group_dn("right")]),
        group("top", &[group_dn("shared")]),
    ]);
    let env = TestEnv::with_directory(directory, groups_config().build()?);

    let resolution = env.resolver.resolve_with_stats(&alice, "alice").await?;

    assert_eq!(
        roles(&resolution.authorities),
        vec![
            "ROLE_COMMON",
            "ROLE_LEFT",
            "ROLE_RIGHT",
            "ROLE_SHARED",
            "ROLE_TOP",
        ]
    );
    assert_eq!(resolution.stats.cycles_detected, 1);
    // alice, left, shared, top, right. shared is not searched again.
    assert_eq!(resolution.stats.queries, 5);

    Ok(())
}

#[tokio::test]
async fn test_disabled_base_issues_no_query() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().group_search_base("").build()?);

    let authorities = env.resolver.resolve(&person_dn("alice"), "alice").await?;

    assert!(authorities.is_empty());
    assert_eq!(env.directory.query_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_granted_authorities_with_default_role() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().default_role("employee").build()?);
    let bob = person_dn("bob");

    let authorities = env.resolver.granted_authorities(&bob, "bob").await?;

    assert_eq!(
        pairs(&authorities),
        vec![
            ("ROLE_EMPLOYEE".to_string(), bob.clone()),
            ("ROLE_ENGINEERING".to_string(), group_dn("engineering")),
            ("ROLE_FRONTEND".to_string(), group_dn("frontend")),
            ("ROLE_STAFF".to_string(), group_dn("staff")),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_custom_filter_and_role_attribute() -> anyhow::Result<()> {
    let alice = person_dn("alice");
    let directory = InMemoryDirectory::new(vec![
        DirectoryEntry::new("ou=auditors,ou=groups,dc=example,dc=com")
            .with_attr("ou", ["auditors"])
            .with_attr("uniqueMember", [alice.clone()]),
    ])
    .with_membership_attribute("uniqueMember");
    let config = groups_config()
        .group_search_filter("(&(objectClass=groupOfUniqueNames)(uniqueMember={0}))")
        .group_role_attribute("ou")
        .role_prefix("GRP_")
        .build()?;
    let env = TestEnv::with_directory(directory, config);

    let authorities = env.resolver.resolve(&alice, "alice").await?;

    assert_eq!(roles(&authorities), vec!["GRP_AUDITORS"]);
    let queries = env.directory.queries();
    assert_eq!(
        queries[0].filter,
        "(&(objectClass=groupOfUniqueNames)(uniqueMember=uid=alice,ou=people,dc=example,dc=com))"
    );
    assert!(queries[0].attributes.contains("ou"));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_resolutions_are_independent() -> anyhow::Result<()> {
    let env = TestEnv::new(groups_config().build()?);

    let mut handles = Vec::new();
    for uid in ["alice", "bob", "carol", "alice", "bob", "carol"] {
        let resolver = env.resolver.clone();
        handles.push(tokio::spawn(async move {
            resolver.resolve(&person_dn(uid), uid).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(roles(&handle.await??));
    }

    assert_eq!(results[0], results[3]);
    assert_eq!(results[1], results[4]);
    assert_eq!(results[2], results[5]);
    assert_eq!(
        results[1],
        vec!["ROLE_ENGINEERING", "ROLE_FRONTEND", "ROLE_STAFF"]
    );

    Ok(())
}
