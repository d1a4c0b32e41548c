//! `url` command: read-only URL resolution.

use crate::config::CdnpinConfig;
use crate::core::Protocol;
use crate::publish::UrlResolver;
use anyhow::Result;

/// Print the URL each path currently resolves to, one per line.
///
/// Needs no object store: resolution reads only the hash records.
pub fn run(config: &CdnpinConfig, paths: &[String], protocol: Option<Protocol>) -> Result<()> {
    let resolver = UrlResolver::new(config);
    for (_, url) in resolver.resolve_many(paths, protocol) {
        println!("{url}");
    }
    Ok(())
}
