//! Command-line interface definitions.

use crate::core::Protocol;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// cdnpin asset publishing CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: cdnpin.toml)
    #[arg(short = 'C', long, default_value = "cdnpin.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Hash assets, upload versioned objects and print their CDN URLs
    #[command(visible_alias = "p")]
    Publish {
        /// Assets to publish (web-root-relative or filesystem paths)
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Print the public URL an asset currently resolves to
    #[command(visible_alias = "u")]
    Url {
        /// Assets to resolve
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Force a URL scheme instead of the configured default
        #[arg(short, long, value_enum)]
        protocol: Option<Protocol>,
    },

    /// Delete stale CDN objects not referenced by any hash record
    Purge {
        /// Age expression, e.g. "-6 months" (default from config)
        #[arg(short, long, value_name = "AGE")]
        older_than: Option<String>,
    },
}
