//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;

/// authpop - resolve nested LDAP group membership into authorities.
#[derive(Debug, Parser)]
#[command(name = "authpop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ~/.authpop/authpop.toml).
    #[arg(short, long, env = "AUTHPOP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind credential for the service account (overrides config).
    #[arg(long, env = "AUTHPOP_BIND_CREDENTIAL", hide_env_values = true)]
    pub bind_credential: Option<String>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the authorities granted to a user.
    Resolve(ResolveArgs),

    /// Check directory connectivity and the service account bind.
    Status,

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `resolve`.
#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    /// DN of the user.
    pub user_dn: String,

    /// Username passed as `{1}` in the group search filter.
    ///
    /// Defaults to the value of the DN's first RDN.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Maximum nested search levels (overrides config).
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Print traversal statistics.
    #[arg(long)]
    pub stats: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Create a configuration file interactively.
    Init {
        /// Overwrite an existing file without asking.
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path.
    Path,
}
