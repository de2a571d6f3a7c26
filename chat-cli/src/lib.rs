//! # chat-cli
//!
//! `marketchat` command line: env config, store selection and one
//! subcommand per chat operation.

pub mod cli;
pub mod config;
pub mod run;

pub use cli::{Cli, Commands};
pub use config::{AppConfig, StoreType};
pub use run::{open_store, run_command};
