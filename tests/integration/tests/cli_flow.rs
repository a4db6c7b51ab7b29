//! Resolution driven through the CLI configuration and report types.

use authpop_cli::cli::ResolveArgs;
use authpop_cli::commands::resolve::resolve_principal;
use authpop_cli::{CliConfig, CliError};

use crate::common::{group_dn, organisation, person_dn, TestEnv};

const CONFIG: &str = r#"
output_format = "json"

[directory]
connection_url = "ldaps://ldap.example.com:636"
bind_dn = "cn=reader,dc=example,dc=com"

[groups]
search_base = "ou=groups,dc=example,dc=com"
default_role = "employee"
requested_attributes = ["description"]
"#;

fn args(user_dn: String) -> ResolveArgs {
    ResolveArgs {
        user_dn,
        username: None,
        max_depth: None,
        stats: false,
    }
}

#[tokio::test]
async fn test_resolve_from_config_file() -> anyhow::Result<()> {
    let config = CliConfig::parse(CONFIG)?;
    let env = TestEnv::with_directory(organisation(), config.group_search_config(None)?);

    let report = resolve_principal(&env.resolver, &args(person_dn("alice"))).await?;

    assert_eq!(report.username, "alice");
    let roles: Vec<&str> = report.authorities.iter().map(|a| a.role.as_str()).collect();
    assert_eq!(
        roles,
        vec![
            "ROLE_BACKEND",
            "ROLE_EMPLOYEE",
            "ROLE_ENGINEERING",
            "ROLE_FRONTEND",
            "ROLE_INFRA",
            "ROLE_PLATFORM",
            "ROLE_STAFF",
        ]
    );
    assert!(report.stats.is_none());

    // The username fills slot {1} on the first search only.
    let queries = env.directory.queries();
    assert_eq!(queries[0].label, "alice");
    assert_eq!(queries[1].identity, group_dn("backend"));
    assert_eq!(queries[1].label, "backend");
    assert!(queries[0].attributes.contains("description"));

    Ok(())
}

#[tokio::test]
async fn test_max_depth_override_and_stats() -> anyhow::Result<()> {
    let config = CliConfig::parse(CONFIG)?;
    let env = TestEnv::with_directory(organisation(), config.group_search_config(Some(1))?);

    let mut args = args(person_dn("carol"));
    args.username = Some("Carol".to_string());
    args.stats = true;

    let report = resolve_principal(&env.resolver, &args).await?;

    let roles: Vec<&str> = report.authorities.iter().map(|a| a.role.as_str()).collect();
    assert_eq!(roles, vec!["ROLE_EMPLOYEE", "ROLE_ONCALL", "ROLE_STAFF"]);

    let stats = report.stats.expect("stats requested");
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.depth_exhausted, 2);
    assert_eq!(env.directory.queries()[0].label, "Carol");

    Ok(())
}

#[tokio::test]
async fn test_report_json_shape() -> anyhow::Result<()> {
    let config = CliConfig::parse(CONFIG)?;
    let env = TestEnv::with_directory(organisation(), config.group_search_config(None)?);

    let mut with_stats = args(person_dn("bob"));
    with_stats.stats = true;
    let report = resolve_principal(&env.resolver, &with_stats).await?;
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["user_dn"], person_dn("bob"));
    assert_eq!(json["authorities"][0]["role"], "ROLE_EMPLOYEE");
    assert_eq!(json["authorities"][0]["source"], person_dn("bob"));
    assert_eq!(json["stats"]["queries"], 4);

    let report = resolve_principal(&env.resolver, &args(person_dn("bob"))).await?;
    let json = serde_json::to_value(&report)?;
    assert!(json.get("stats").is_none());

    Ok(())
}

#[tokio::test]
async fn test_missing_base_grants_only_default_role() -> anyhow::Result<()> {
    let mut config = CliConfig::parse(CONFIG)?;
    config.groups.search_base = None;
    let env = TestEnv::with_directory(organisation(), config.group_search_config(None)?);

    let report = resolve_principal(&env.resolver, &args(person_dn("alice"))).await?;

    assert_eq!(report.authorities.len(), 1);
    assert_eq!(report.authorities[0].role, "ROLE_EMPLOYEE");
    assert_eq!(env.directory.query_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_blank_user_dn_is_rejected() -> anyhow::Result<()> {
    let config = CliConfig::parse(CONFIG)?;
    let env = TestEnv::with_directory(organisation(), config.group_search_config(None)?);

    let result = resolve_principal(&env.resolver, &args("  ".to_string())).await;

    assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    assert_eq!(env.directory.query_count(), 0);

    Ok(())
}
