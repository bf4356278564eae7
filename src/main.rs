//! Seedmix - playlist generation from seed tracks.
//!
//! Proxies the Spotify Web API, turns up to five seed tracks into a
//! playlist through a chain of recommendation strategies, names it, and
//! keeps it in a local SQLite database until it is exported.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod keystore;
pub mod naming;
pub mod playlist;
pub mod recommend;
#[cfg(test)]
pub mod test_utils;
pub mod textgen;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so `--json` output stays machine-readable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("seedmix=info".parse()?))
        .init();

    if !cli::run_command(&args)? {
        cli::Cli::command().print_help()?;
    }
    Ok(())
}
