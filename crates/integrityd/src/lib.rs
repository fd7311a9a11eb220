#![cfg_attr(not(feature = "bin"), allow(dead_code))]

mod audit;
pub mod command;
pub mod config;
mod error;
mod runner;

pub use crate::audit::AUDIT_SCHEMA;
pub use crate::config::{load_config, IntegrityConfig, CONFIG_SCHEMA, RUNTIME_ROOT_ENV};
pub use crate::error::CliError;

#[cfg(feature = "bin")]
pub mod cli;

#[cfg(feature = "bin")]
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    cli::run()
}
