//! Command-line interface module.

mod args;

pub mod publish;
pub mod purge;
pub mod url;

pub use args::{Cli, Commands};
