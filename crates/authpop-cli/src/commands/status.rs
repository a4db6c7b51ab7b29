//! Directory status command.

use authpop_ldap::LdapDirectoryClient;

use crate::output::{info, success};
use crate::{CliConfig, CliResult};

/// Checks that the directory is reachable and the service account can bind.
pub async fn run_status(config: &CliConfig) -> CliResult<()> {
    let ldap = config.ldap_config()?;
    info(&format!("Checking directory at {}...", ldap.connection_url));

    let client = LdapDirectoryClient::new(ldap)?;
    client.test_connection().await?;

    success("Directory is reachable");
    println!();
    println!("Bind DN: {}", client.config().bind_dn);
    println!("Search scope: {:?}", client.config().search_scope);
    println!(
        "Group search base: {}",
        config.groups.search_base.as_deref().unwrap_or("(disabled)")
    );

    Ok(())
}
