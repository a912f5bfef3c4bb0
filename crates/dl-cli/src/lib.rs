//! Driver ledger CLI library.
//!
//! This crate provides the operator-facing CLI for the driver ledger.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
