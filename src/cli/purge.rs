//! `purge` command: delete stale CDN objects.

use crate::config::CdnpinConfig;
use crate::log;
use crate::publish::Publisher;
use anyhow::Result;

pub fn run(config: CdnpinConfig, older_than: Option<&str>) -> Result<()> {
    let publisher = Publisher::new(config)?;
    let deleted = publisher.purge(older_than)?;
    log!("purge"; "{deleted} object(s) deleted");
    Ok(())
}
