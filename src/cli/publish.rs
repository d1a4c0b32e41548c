//! `publish` command: hash, upload and report URLs.

use super::Cli;
use crate::config::CdnpinConfig;
use crate::log;
use crate::publish::Publisher;
use anyhow::{Result, bail};
use clap::CommandFactory;

/// Publish each path, printing the resulting CDN URL.
///
/// All paths are checked up front; nothing is uploaded when any of them
/// cannot be located, so a typo does not leave a batch half-published.
pub fn run(config: CdnpinConfig, paths: &[String]) -> Result<()> {
    let publisher = Publisher::new(config)?;

    let mut missing = Vec::new();
    for path in paths {
        match publisher.locate(path) {
            Ok(file) if file.is_file() => {}
            Ok(file) => missing.push(format!("{path} (looked at `{}`)", file.display())),
            Err(e) => missing.push(format!("{path} ({e})")),
        }
    }
    if !missing.is_empty() {
        let usage = Cli::command().render_usage();
        bail!("cannot locate: {}\n{usage}", missing.join(", "));
    }

    for path in paths {
        let url = publisher.publish(path)?;
        log!("publish"; "{path} -> {url}");
    }
    Ok(())
}
