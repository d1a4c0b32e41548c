//! Object transfer and retention against the configured store.

use crate::core::PublishError;
use crate::store::{ObjectStore, RemoteObject};
use crate::{debug, log};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use std::path::Path;

/// Served cross-origin so stylesheets and scripts load from any host.
const CORS_HEADER: (&str, &str) = ("Access-Control-Allow-Origin", "*");

/// Drives uploads and retention against one [`ObjectStore`].
pub struct CdnSync {
    store: Box<dyn ObjectStore>,
}

impl CdnSync {
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload a file under its versioned object name.
    ///
    /// Versioned names are content-addressed, so an existing object with
    /// the same name already has the same bytes and the transfer is
    /// skipped. Returns whether an upload actually happened.
    pub fn transfer(&self, object_name: &str, source: &Path) -> Result<bool, PublishError> {
        if self.store.exists(object_name)? {
            debug!("transfer"; "{object_name} already exists, skipping upload");
            return Ok(false);
        }
        let content_type = match object_name.rsplit_once('.').map(|(_, ext)| ext) {
            Some("css") => Some("text/css"),
            Some("js") => Some("text/javascript"),
            _ => None,
        };
        self.store
            .upload(object_name, source, content_type, &[CORS_HEADER])?;
        Ok(true)
    }

    /// Delete objects older than `cutoff` whose hash is not in
    /// `protected`.
    ///
    /// Any hash on record protects its object regardless of age. An
    /// object exactly at the cutoff is kept. Returns the number of
    /// deleted objects.
    pub fn purge(
        &self,
        cutoff: DateTime<Utc>,
        protected: &FxHashSet<String>,
    ) -> Result<usize, PublishError> {
        let mut deleted = 0;
        for object in self.store.list(None)? {
            if protected.contains(&object.hash) {
                debug!("purge"; "keep {} (hash on record)", object.name);
                continue;
            }
            if object.last_modified >= cutoff {
                debug!(
                    "purge";
                    "keep {} (modified {}, cutoff {cutoff})",
                    object.name,
                    object.last_modified
                );
                continue;
            }
            self.store.delete(&object.name)?;
            log!("purge"; "deleted {}", object.name);
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Delete one object by exact name.
    pub fn delete_object(&self, name: &str) -> Result<(), PublishError> {
        self.store.delete(name)
    }

    /// Metadata for one object, `None` when it does not exist.
    pub fn object_details(&self, name: &str) -> Result<Option<RemoteObject>, PublishError> {
        Ok(self
            .store
            .list(Some(name))?
            .into_iter()
            .find(|o| o.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemStore;
    use chrono::Duration;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sync_with_store() -> (CdnSync, Arc<MemStore>) {
        let store = Arc::new(MemStore::new());
        (CdnSync::new(Box::new(Arc::clone(&store))), store)
    }

    #[test]
    fn test_transfer_skips_existing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("site.css");
        fs::write(&source, "body {}").unwrap();

        let (sync, store) = sync_with_store();
        assert!(sync.transfer("site_h.css", &source).unwrap());
        assert!(!sync.transfer("site_h.css", &source).unwrap());
        assert_eq!(store.upload_count(), 1);
    }

    #[test]
    fn test_transfer_sets_content_type_and_cors() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("site.css");
        let js = dir.path().join("app.js");
        let png = dir.path().join("logo.png");
        fs::write(&css, "body {}").unwrap();
        fs::write(&js, "var x;").unwrap();
        fs::write(&png, "png").unwrap();

        let (sync, store) = sync_with_store();
        sync.transfer("site_h.css", &css).unwrap();
        sync.transfer("app_h.js", &js).unwrap();
        sync.transfer("logo_h.png", &png).unwrap();

        let obj = store.object("site_h.css").unwrap();
        assert_eq!(obj.content_type.as_deref(), Some("text/css"));
        assert_eq!(
            obj.headers,
            [("Access-Control-Allow-Origin".to_string(), "*".to_string())]
        );
        assert_eq!(
            store.object("app_h.js").unwrap().content_type.as_deref(),
            Some("text/javascript")
        );
        assert_eq!(store.object("logo_h.png").unwrap().content_type, None);
    }

    #[test]
    fn test_purge_respects_protection_and_cutoff() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        fs::write(&a, "aaa").unwrap();
        fs::write(&b, "bbb").unwrap();
        fs::write(&c, "ccc").unwrap();

        let (sync, store) = sync_with_store();
        sync.transfer("a_1.css", &a).unwrap();
        sync.transfer("b_2.css", &b).unwrap();
        sync.transfer("c_3.css", &c).unwrap();

        let now = Utc::now();
        let old = now - Duration::days(400);
        store.set_modified("a_1.css", old);
        store.set_modified("b_2.css", old);
        // c stays recent

        // a's hash is on record, so only b goes
        let mut protected = FxHashSet::default();
        protected.insert(
            crate::hash::ContentHash::of_bytes("aaa")
                .as_str()
                .to_string(),
        );

        let cutoff = now - Duration::days(180);
        assert_eq!(sync.purge(cutoff, &protected).unwrap(), 1);
        assert_eq!(store.names(), ["a_1.css", "c_3.css"]);
    }

    #[test]
    fn test_purge_keeps_object_at_cutoff() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "aaa").unwrap();

        let (sync, store) = sync_with_store();
        sync.transfer("a_1.css", &a).unwrap();

        let cutoff = Utc::now() - Duration::days(10);
        store.set_modified("a_1.css", cutoff);

        assert_eq!(sync.purge(cutoff, &FxHashSet::default()).unwrap(), 0);
        assert_eq!(store.names(), ["a_1.css"]);
    }

    #[test]
    fn test_delete_object() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "aaa").unwrap();

        let (sync, store) = sync_with_store();
        sync.transfer("a_1.css", &a).unwrap();

        sync.delete_object("a_1.css").unwrap();
        assert!(store.names().is_empty());
        assert!(sync.delete_object("a_1.css").is_err());
    }

    #[test]
    fn test_object_details() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "aaa").unwrap();

        let (sync, _store) = sync_with_store();
        sync.transfer("a_1.css", &a).unwrap();

        let details = sync.object_details("a_1.css").unwrap().unwrap();
        assert_eq!(details.hash, crate::hash::ContentHash::of_bytes("aaa").as_str());
        assert!(sync.object_details("missing").unwrap().is_none());
    }
}
