//! The publishing pipeline: wires path resolution, hashing, stylesheet
//! rewriting and the object store together.

use crate::cdn::{CdnNamer, CdnSync, age};
use crate::config::CdnpinConfig;
use crate::core::{Protocol, PublishError};
use crate::css;
use crate::hash::HashStore;
use crate::path::{AssetPath, PathResolver};
use crate::store::{self, ObjectStore};
use crate::{debug, log};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Read-side of the pipeline: turns asset paths into public URLs from
/// whatever hashes are on record.
///
/// Needs no object store, so URL resolution works even where the CDN
/// credentials are absent.
pub struct UrlResolver {
    resolver: PathResolver,
    hashes: HashStore,
    namer: CdnNamer,
}

impl UrlResolver {
    pub fn new(config: &CdnpinConfig) -> Self {
        Self {
            resolver: PathResolver::new(
                config.paths.webroot.clone(),
                config.paths.app_root.clone(),
                config.translation_pairs(),
            ),
            hashes: HashStore::new(config.paths.hash_dir.clone()),
            namer: CdnNamer::from_config(config),
        }
    }

    /// Public URL for a raw asset path.
    ///
    /// Falls back to the canonical local path when no hash is on record.
    pub fn resolve(&self, raw: &str, protocol: Option<Protocol>) -> Result<String, PublishError> {
        let asset = self.resolver.canonicalize(raw)?;
        let stem = self.resolver.record_stem(&asset)?;
        let hash = self.hashes.lookup(&stem)?;
        Ok(self.namer.resolve_url(&asset, hash.as_ref(), protocol))
    }

    /// Resolve several paths, pairing each input with its URL.
    ///
    /// An unresolvable input maps to itself; a template helper should
    /// never lose an asset reference outright.
    pub fn resolve_many(&self, raws: &[String], protocol: Option<Protocol>) -> Vec<(String, String)> {
        raws.iter()
            .map(|raw| {
                let url = self
                    .resolve(raw, protocol)
                    .unwrap_or_else(|_| raw.clone());
                (raw.clone(), url)
            })
            .collect()
    }

    /// Versioned object name for a published asset.
    ///
    /// Unlike URL resolution this is strict: no hash on record is
    /// `NoHash`.
    pub fn object_name(&self, raw: &str) -> Result<String, PublishError> {
        let asset = self.resolver.canonicalize(raw)?;
        let stem = self.resolver.record_stem(&asset)?;
        let hash = self
            .hashes
            .lookup(&stem)?
            .ok_or_else(|| PublishError::NoHash(asset.as_str().to_string()))?;
        CdnNamer::object_name(&asset, &hash)
    }
}

/// Full pipeline: everything [`UrlResolver`] does plus hashing,
/// stylesheet rewriting, transfer and retention.
pub struct Publisher {
    urls: UrlResolver,
    config: CdnpinConfig,
    sync: CdnSync,
}

impl Publisher {
    /// Build against the provider declared in config.
    pub fn new(config: CdnpinConfig) -> Result<Self, PublishError> {
        let store = store::from_config(&config.cdn)?;
        Ok(Self::with_store(config, store))
    }

    /// Build against an explicit store.
    pub fn with_store(config: CdnpinConfig, store: Box<dyn ObjectStore>) -> Self {
        Self {
            urls: UrlResolver::new(&config),
            sync: CdnSync::new(store),
            config,
        }
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    /// Locate a raw input path on disk without publishing it.
    pub fn locate(&self, raw: &str) -> Result<PathBuf, PublishError> {
        self.urls.resolver.locate(raw)
    }

    /// Publish one asset: hash it, record the hash, upload the
    /// versioned object, and return the public URL.
    ///
    /// Stylesheets get their image references republished and rewritten
    /// to CDN URLs first; the rewritten variant is what gets uploaded,
    /// and the original path's record points at its content.
    pub fn publish(&self, raw: &str) -> Result<String, PublishError> {
        let file = self.urls.resolver.locate(raw)?;
        if !file.is_file() {
            return Err(PublishError::NotFound(file));
        }
        let asset = self.urls.resolver.canonicalize(raw)?;
        let stem = self.urls.resolver.record_stem(&asset)?;

        let translated = if css::is_stylesheet(&file) {
            self.rewrite_stylesheet(&asset, &file)?
        } else {
            None
        };

        let (hash, upload_source) = match &translated {
            Some(sibling) => {
                let translated_stem = match stem.rsplit_once('.') {
                    Some((base, ext)) => format!("{base}_translated.{ext}"),
                    None => format!("{stem}_translated"),
                };
                let hash = self.urls.hashes.compute_and_store(sibling, &translated_stem)?;
                // The original path must resolve to the rewritten bytes
                self.urls.hashes.copy_record(&translated_stem, &stem)?;
                (hash, sibling.as_path())
            }
            None => (
                self.urls.hashes.compute_and_store(&file, &stem)?,
                file.as_path(),
            ),
        };

        let object_name = CdnNamer::object_name(&asset, &hash)?;
        self.sync.transfer(&object_name, upload_source)?;
        Ok(self.urls.namer.resolve_url(&asset, Some(&hash), None))
    }

    /// Republish every image a stylesheet references and rewrite the
    /// references to their CDN URLs.
    ///
    /// Returns the rewritten sibling file, or `None` when nothing
    /// changed. Unresolvable references are skipped, not fatal; a
    /// stylesheet with one broken image still publishes.
    fn rewrite_stylesheet(
        &self,
        asset: &AssetPath,
        file: &Path,
    ) -> Result<Option<PathBuf>, PublishError> {
        let content =
            fs::read_to_string(file).map_err(|e| PublishError::Io(file.to_path_buf(), e))?;
        let mut rewritten = content.clone();

        for reference in css::extract_references(&content) {
            let token = css::normalize_reference(&reference, asset.dir());
            let image = match self.urls.resolver.canonicalize(&token) {
                Ok(image) => image,
                Err(e) => {
                    debug!("publish"; "skip `{reference}` in {asset}: {e}");
                    continue;
                }
            };
            if !self.urls.resolver.to_filesystem_path(&image).is_file() {
                debug!("publish"; "skip `{reference}` in {asset}: file not found");
                continue;
            }

            match self.publish(image.as_str()) {
                Ok(url) => {
                    if url != reference {
                        rewritten = css::substitute(&rewritten, &reference, &url);
                    }
                }
                Err(e) => {
                    log!("error"; "could not republish `{reference}` from {asset}: {e}");
                }
            }
        }

        if rewritten == content {
            return Ok(None);
        }
        let sibling = css::translated_sibling(file);
        fs::write(&sibling, rewritten)
            .map_err(|e| PublishError::Io(sibling.clone(), e))?;
        Ok(Some(sibling))
    }

    /// Delete stale remote objects.
    ///
    /// Everything with a hash on record is kept regardless of age;
    /// everything else goes when strictly older than the cutoff.
    pub fn purge(&self, older_than: Option<&str>) -> anyhow::Result<usize> {
        let cutoff = age::resolve_cutoff(
            older_than,
            &self.config.purge.default_older_than,
            Utc::now(),
        )?;
        let protected = self.urls.hashes.all_hashes();
        debug!(
            "purge";
            "cutoff {cutoff}, {} hash(es) protected",
            protected.len()
        );
        Ok(self.sync.purge(cutoff, &protected)?)
    }
}
