//! Versioned object names and public URL resolution.

use crate::config::CdnpinConfig;
use crate::core::{Protocol, PublishError};
use crate::hash::ContentHash;
use crate::path::{AssetPath, split_extension};

/// Turns canonical asset paths into versioned CDN object names and
/// public URLs.
///
/// URL resolution never fails: anything that prevents building a CDN
/// URL (serving disabled, no hash on record, unusable filename) falls
/// back to the local web-root path, so page rendering survives an
/// unpublished or broken asset.
#[derive(Debug, Clone)]
pub struct CdnNamer {
    disabled: bool,
    always_use_https: bool,
    http_base: String,
    https_base: String,
}

impl CdnNamer {
    pub fn new(
        disabled: bool,
        always_use_https: bool,
        http_base: String,
        https_base: String,
    ) -> Self {
        Self {
            disabled,
            always_use_https,
            http_base,
            https_base,
        }
    }

    pub fn from_config(config: &CdnpinConfig) -> Self {
        Self::new(
            config.presentation.disabled,
            config.presentation.always_use_https,
            config.cdn.http.clone(),
            config.cdn.https.clone(),
        )
    }

    /// Versioned object name: `{base}_{hash}.{ext}` from the asset's
    /// basename. Directory parts never appear in object names.
    pub fn object_name(asset: &AssetPath, hash: &ContentHash) -> Result<String, PublishError> {
        let (base, ext) = split_extension(asset.file_name())?;
        Ok(format!("{base}_{hash}.{ext}"))
    }

    /// Public URL for an asset, given whatever hash is on record.
    pub fn resolve_url(
        &self,
        asset: &AssetPath,
        hash: Option<&ContentHash>,
        protocol: Option<Protocol>,
    ) -> String {
        if self.disabled {
            return asset.as_str().to_string();
        }
        let Some(hash) = hash else {
            return asset.as_str().to_string();
        };
        let Ok(name) = Self::object_name(asset, hash) else {
            return asset.as_str().to_string();
        };

        let protocol = protocol.unwrap_or(if self.always_use_https {
            Protocol::Https
        } else {
            Protocol::Http
        });
        let base = match protocol {
            Protocol::Http => &self.http_base,
            Protocol::Https => &self.https_base,
        };
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}
