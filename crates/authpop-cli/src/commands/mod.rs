//! Command implementations.

pub mod config;
pub mod resolve;
pub mod status;

pub use config::run_config;
pub use resolve::run_resolve;
pub use status::run_status;
