//! Configuration management commands.

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::output::{confirm, info, prompt, success};
use crate::{CliConfig, CliResult};

/// Runs a config command.
pub fn run_config(
    cmd: ConfigCommand,
    config: &mut CliConfig,
    path: Option<&Path>,
) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config, path),
        ConfigCommand::Init { force } => init_config(config, path, force),
        ConfigCommand::Path => {
            println!("{}", CliConfig::resolve_path(path)?.display());
            Ok(())
        }
    }
}

/// Shows the current configuration.
fn show_config(config: &CliConfig, path: Option<&Path>) -> CliResult<()> {
    let config_path = CliConfig::resolve_path(path)?;

    info(&format!("Configuration file: {}", config_path.display()));
    println!();
    println!("output_format: {:?}", config.output_format);

    let dir = &config.directory;
    println!();
    println!("[directory]");
    println!("connection_url: {}", dir.connection_url);
    println!("bind_dn: {}", dir.bind_dn);
    println!(
        "bind_credential: {}",
        mask_credential(dir.bind_credential.as_deref())
    );
    println!("validate_certificates: {}", dir.validate_certificates);
    println!("search_scope: {:?}", dir.search_scope);
    println!("pool_max_size: {}", dir.pool_max_size);
    println!("connection_timeout_secs: {}", dir.connection_timeout_secs);
    println!("read_timeout_secs: {}", dir.read_timeout_secs);

    let groups = &config.groups;
    println!();
    println!("[groups]");
    println!(
        "search_base: {}",
        groups.search_base.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "search_filter: {}",
        groups.search_filter.as_deref().unwrap_or("(member={0})")
    );
    println!("role_attribute: {}", groups.role_attribute);
    println!("role_prefix: {}", groups.role_prefix);
    println!("convert_to_upper_case: {}", groups.convert_to_upper_case);
    if let Some(role) = &groups.default_role {
        println!("default_role: {role}");
    }
    println!("max_search_depth: {}", groups.max_search_depth);
    if !groups.requested_attributes.is_empty() {
        println!(
            "requested_attributes: {}",
            groups.requested_attributes.join(", ")
        );
    }

    Ok(())
}

/// Initializes configuration interactively.
fn init_config(config: &mut CliConfig, path: Option<&Path>, force: bool) -> CliResult<()> {
    let config_path = CliConfig::resolve_path(path)?;

    if config_path.exists()
        && !force
        && !confirm(&format!("{} exists. Overwrite?", config_path.display()))?
    {
        info("Keeping existing configuration.");
        return Ok(());
    }

    info("Initializing authpop configuration...");
    println!();

    config.directory.connection_url =
        prompt("Directory URL (ldaps://)", &config.directory.connection_url)?;
    config.directory.bind_dn = prompt("Bind DN", &config.directory.bind_dn)?;

    let base = prompt(
        "Group search base",
        config.groups.search_base.as_deref().unwrap_or(""),
    )?;
    config.groups.search_base = Some(base).filter(|b| !b.is_empty());

    let saved = config.save(Some(&config_path))?;

    println!();
    success(&format!("Configuration saved to: {}", saved.display()));
    info("Set AUTHPOP_BIND_CREDENTIAL to supply the bind password.");
    Ok(())
}

/// Masks a credential for display.
fn mask_credential(credential: Option<&str>) -> &'static str {
    match credential {
        Some(c) if !c.is_empty() => "****",
        _ => "(not set)",
    }
}
