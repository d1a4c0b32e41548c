//! cdnpin - content-addressed CDN publishing for static assets.

#![allow(dead_code)]

mod cdn;
mod cli;
mod config;
mod core;
mod css;
mod hash;
mod logger;
mod path;
mod publish;
mod store;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::CdnpinConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = CdnpinConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Publish { paths } => cli::publish::run(config, paths),
        Commands::Url { paths, protocol } => cli::url::run(&config, paths, *protocol),
        Commands::Purge { older_than } => cli::purge::run(config, older_than.as_deref()),
    }
}
