//! Remote object storage behind the CDN.
//!
//! All provider differences live behind [`ObjectStore`]; the rest of the
//! pipeline never inspects which provider is configured. Provider
//! selection happens exactly once, in [`from_config`].

mod dir;

#[cfg(test)]
pub mod memory;

pub use dir::DirStore;

use crate::config::CdnConfig;
use crate::core::PublishError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// One object as reported by a store listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub name: String,
    /// Content digest as reported by the store (lowercase hex).
    pub hash: String,
    pub last_modified: DateTime<Utc>,
}

/// Storage backend for published objects.
pub trait ObjectStore {
    /// Whether an object with this exact name exists.
    fn exists(&self, name: &str) -> Result<bool, PublishError>;

    /// Upload a local file as `name`, overwriting any existing object.
    ///
    /// `content_type` and `extra_headers` are best-effort: providers
    /// without a metadata channel ignore them.
    fn upload(
        &self,
        name: &str,
        source: &Path,
        content_type: Option<&str>,
        extra_headers: &[(&str, &str)],
    ) -> Result<(), PublishError>;

    /// List objects, optionally restricted to a name prefix.
    fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteObject>, PublishError>;

    /// Delete one object by exact name.
    fn delete(&self, name: &str) -> Result<(), PublishError>;
}

// Lets tests keep a handle to a store after handing it to the pipeline.
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn exists(&self, name: &str) -> Result<bool, PublishError> {
        (**self).exists(name)
    }

    fn upload(
        &self,
        name: &str,
        source: &Path,
        content_type: Option<&str>,
        extra_headers: &[(&str, &str)],
    ) -> Result<(), PublishError> {
        (**self).upload(name, source, content_type, extra_headers)
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteObject>, PublishError> {
        (**self).list(prefix)
    }

    fn delete(&self, name: &str) -> Result<(), PublishError> {
        (**self).delete(name)
    }
}

/// Declared CDN provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Directory-backed store (local or mounted CDN origin).
    #[default]
    Dir,
    /// Recognized in config but not implemented yet.
    S3,
}

/// Build the configured store. The one place provider dispatch happens.
pub fn from_config(cdn: &CdnConfig) -> Result<Box<dyn ObjectStore>, PublishError> {
    match cdn.provider {
        Provider::Dir => Ok(Box::new(DirStore::ensure_container(
            &cdn.store_dir,
            &cdn.container,
        )?)),
        Provider::S3 => Err(PublishError::UnsupportedProvider("s3".to_string())),
    }
}
