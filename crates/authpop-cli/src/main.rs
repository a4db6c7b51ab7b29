//! # authpop
//!
//! Resolves nested LDAP group membership into authorities.

#![forbid(unsafe_code)]

use authpop_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_resolve, run_status},
    config::CliConfig,
    output::error,
};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();
    let mut config = match CliConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };
    let format = cli.output.unwrap_or(config.output_format);

    let result = match cli.command {
        Command::Resolve(args) => {
            let config = config.with_bind_credential(cli.bind_credential);
            run_resolve(args, &config, format).await
        }
        Command::Status => {
            let config = config.with_bind_credential(cli.bind_credential);
            run_status(&config).await
        }
        Command::Config(cmd) => run_config(cmd, &mut config, config_path),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
