//! Authority resolution command.

use std::sync::Arc;

use authpop_ldap::{Authority, LdapDirectoryClient, NestedGroupResolver, ResolutionStats};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::ResolveArgs;
use crate::config::OutputFormat;
use crate::output::{info, output, warning};
use crate::{CliConfig, CliError, CliResult};

/// Authority row for display.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Tabled)]
pub struct AuthorityDisplay {
    /// Normalized role name.
    pub role: String,
    /// DN of the entry the role came from.
    pub source: String,
}

impl From<&Authority> for AuthorityDisplay {
    fn from(authority: &Authority) -> Self {
        Self {
            role: authority.role().to_string(),
            source: authority.dn().to_string(),
        }
    }
}

/// Result of resolving one user.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    /// DN of the user.
    pub user_dn: String,
    /// Label used for the first search.
    pub username: String,
    /// Authorities, sorted by role then source.
    pub authorities: Vec<AuthorityDisplay>,
    /// Traversal counters, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ResolutionStats>,
}

/// Runs the resolve command against the configured directory.
pub async fn run_resolve(
    args: ResolveArgs,
    config: &CliConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let client = LdapDirectoryClient::new(config.ldap_config()?)?;
    let resolver = NestedGroupResolver::new(
        Arc::new(client),
        config.group_search_config(args.max_depth)?,
    );

    if !resolver.config().is_enabled() && format == OutputFormat::Table {
        warning("groups.search_base is not set; only the default role can be granted");
    }

    let report = resolve_principal(&resolver, &args).await?;
    print_report(&report, format)
}

/// Resolves a user's authorities, including the default role.
pub async fn resolve_principal(
    resolver: &NestedGroupResolver,
    args: &ResolveArgs,
) -> CliResult<ResolveReport> {
    if args.user_dn.trim().is_empty() {
        return Err(CliError::InvalidArgument("user DN cannot be empty".to_string()));
    }

    let username = args
        .username
        .clone()
        .unwrap_or_else(|| first_rdn_value(&args.user_dn).to_string());

    let mut resolution = resolver.resolve_with_stats(&args.user_dn, &username).await?;
    resolver.add_default_role(&args.user_dn, &mut resolution.authorities);

    let mut authorities: Vec<AuthorityDisplay> = resolution
        .authorities
        .iter()
        .map(AuthorityDisplay::from)
        .collect();
    authorities.sort();

    Ok(ResolveReport {
        user_dn: args.user_dn.clone(),
        username,
        authorities,
        stats: args.stats.then_some(resolution.stats),
    })
}

/// Prints a report in the requested format.
pub fn print_report(report: &ResolveReport, format: OutputFormat) -> CliResult<()> {
    output(report, &report.authorities, format, |row| row.role.as_str())?;
    if let (OutputFormat::Table, Some(stats)) = (format, report.stats) {
        println!();
        info(&format!(
            "{} queries, {} cycles stopped, {} branches at depth limit",
            stats.queries, stats.cycles_detected, stats.depth_exhausted
        ));
    }
    Ok(())
}

/// Returns the value of a DN's first RDN, or the whole DN if it has none.
///
/// `uid=alice,ou=people,dc=example,dc=com` yields `alice`.
#[must_use]
pub fn first_rdn_value(dn: &str) -> &str {
    let rdn = dn.split(',').next().unwrap_or(dn);
    match rdn.split_once('=') {
        Some((_, value)) if !value.trim().is_empty() => value.trim(),
        _ => dn,
    }
}
