//! Directory-backed object store.
//!
//! Objects live as plain files under `{store_dir}/{container}/`. This is
//! the store for a CDN origin that is a mounted or synced directory, and
//! it doubles as a local dry-run target. The filesystem carries no
//! metadata channel, so content types and headers are accepted and
//! dropped.

use super::{ObjectStore, RemoteObject};
use crate::core::PublishError;
use crate::hash::ContentHash;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker file identifying a container directory this tool manages.
const CONTAINER_MARKER: &str = ".public";

#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open the container under `store_dir`, creating it (and its
    /// marker) when absent.
    pub fn ensure_container(store_dir: &Path, container: &str) -> Result<Self, PublishError> {
        let root = store_dir.join(container);
        fs::create_dir_all(&root)
            .map_err(|e| PublishError::Remote(format!("create container `{container}`: {e}")))?;
        let marker = root.join(CONTAINER_MARKER);
        if !marker.exists() {
            fs::write(&marker, "")
                .map_err(|e| PublishError::Remote(format!("mark container `{container}`: {e}")))?;
        }
        Ok(Self { root })
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ObjectStore for DirStore {
    fn exists(&self, name: &str) -> Result<bool, PublishError> {
        Ok(self.object_path(name).is_file())
    }

    fn upload(
        &self,
        name: &str,
        source: &Path,
        _content_type: Option<&str>,
        _extra_headers: &[(&str, &str)],
    ) -> Result<(), PublishError> {
        let target = self.object_path(name);
        fs::copy(source, &target)
            .map_err(|e| PublishError::Remote(format!("upload `{name}`: {e}")))?;
        Ok(())
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteObject>, PublishError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| PublishError::Remote(format!("list container: {e}")))?;

        let mut objects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PublishError::Remote(format!("list container: {e}")))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name == CONTAINER_MARKER || !path.is_file() {
                continue;
            }
            if let Some(prefix) = prefix
                && !name.starts_with(prefix)
            {
                continue;
            }

            let hash = ContentHash::of_file(&path)?;
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| PublishError::Remote(format!("stat `{name}`: {e}")))?;

            objects.push(RemoteObject {
                name: name.to_string(),
                hash: hash.as_str().to_string(),
                last_modified: modified.into(),
            });
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    fn delete(&self, name: &str) -> Result<(), PublishError> {
        fs::remove_file(self.object_path(name))
            .map_err(|e| PublishError::Remote(format!("delete `{name}`: {e}")))
    }
}
