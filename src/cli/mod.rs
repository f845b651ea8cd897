//! CLI module
//!
//! - init: create the data directory layout
//! - serve: boot the document store and run the HTTP API

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, is_initialized, open_state, run, run_command, serve, Config};
pub use errors::{CliError, CliResult};
