//! Directory failures surface as a single transport error with no partial
//! result.

use authpop_ldap::{AuthoritiesPopulator, LdapError};

use crate::common::{groups_config, organisation, person_dn, TestEnv};

#[tokio::test]
async fn test_failure_on_second_level_aborts() -> anyhow::Result<()> {
    let env = TestEnv::with_directory(organisation().fail_on_query(2), groups_config().build()?);

    let result = env.resolver.resolve(&person_dn("alice"), "alice").await;

    let err = result.expect_err("resolution must fail");
    assert!(err.is_transport_error());
    assert_eq!(env.directory.query_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failure_deep_in_traversal_aborts() -> anyhow::Result<()> {
    // Five of alice's six searches succeed before the last one fails.
    let env = TestEnv::with_directory(organisation().fail_on_query(6), groups_config().build()?);

    let result = env.resolver.resolve_with_stats(&person_dn("alice"), "alice").await;

    assert!(matches!(result, Err(LdapError::Transport(_))));

    Ok(())
}

#[tokio::test]
async fn test_failure_on_first_query() -> anyhow::Result<()> {
    let env = TestEnv::with_directory(organisation().fail_on_query(1), groups_config().build()?);

    let err = env
        .resolver
        .resolve(&person_dn("bob"), "bob")
        .await
        .expect_err("resolution must fail");

    match err {
        LdapError::Transport(inner) => {
            assert!(inner.is_connection_error());
            assert!(!inner.is_transport_error());
            assert!(inner.to_string().contains("injected failure"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_default_role_not_granted_on_failure() -> anyhow::Result<()> {
    let env = TestEnv::with_directory(
        organisation().fail_on_query(2),
        groups_config().default_role("employee").build()?,
    );

    let result = env
        .resolver
        .granted_authorities(&person_dn("alice"), "alice")
        .await;

    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_failure_does_not_affect_other_resolutions() -> anyhow::Result<()> {
    let failing =
        TestEnv::with_directory(organisation().fail_on_query(1), groups_config().build()?);
    let healthy = TestEnv::new(groups_config().build()?);

    let alice = person_dn("alice");
    let (bad, good) = tokio::join!(
        failing.resolver.resolve(&alice, "alice"),
        healthy.resolver.resolve(&alice, "alice"),
    );

    assert!(bad.is_err());
    assert_eq!(good?.len(), 6);

    Ok(())
}
