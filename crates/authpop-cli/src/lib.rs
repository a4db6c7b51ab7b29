//! # authpop-cli
//!
//! Command-line front end for `authpop-ldap`.
//!
//! This crate provides:
//! - Authority resolution for a user DN, with optional traversal statistics
//! - Directory connectivity checks
//! - Configuration file management

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
