//! In-memory object store for pipeline tests.

use super::{ObjectStore, RemoteObject};
use crate::core::PublishError;
use crate::hash::ContentHash;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct MemObject {
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub last_modified: DateTime<Utc>,
}

/// Records every upload so tests can assert on metadata and on how many
/// transfers actually happened.
#[derive(Debug, Default)]
pub struct MemStore {
    objects: Mutex<Vec<MemObject>>,
    uploads: Mutex<usize>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `upload` calls, including overwrites.
    pub fn upload_count(&self) -> usize {
        *self.uploads.lock().unwrap()
    }

    pub fn object(&self, name: &str) -> Option<MemObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.name == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Backdate an object for retention tests.
    pub fn set_modified(&self, name: &str, when: DateTime<Utc>) {
        let mut objects = self.objects.lock().unwrap();
        if let Some(object) = objects.iter_mut().find(|o| o.name == name) {
            object.last_modified = when;
        }
    }
}

impl ObjectStore for MemStore {
    fn exists(&self, name: &str) -> Result<bool, PublishError> {
        Ok(self.objects.lock().unwrap().iter().any(|o| o.name == name))
    }

    fn upload(
        &self,
        name: &str,
        source: &Path,
        content_type: Option<&str>,
        extra_headers: &[(&str, &str)],
    ) -> Result<(), PublishError> {
        let data =
            fs::read(source).map_err(|e| PublishError::Remote(format!("upload `{name}`: {e}")))?;
        let object = MemObject {
            name: name.to_string(),
            data,
            content_type: content_type.map(str::to_string),
            headers: extra_headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            last_modified: Utc::now(),
        };

        let mut objects = self.objects.lock().unwrap();
        objects.retain(|o| o.name != name);
        objects.push(object);
        *self.uploads.lock().unwrap() += 1;
        Ok(())
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<RemoteObject>, PublishError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| prefix.is_none_or(|p| o.name.starts_with(p)))
            .map(|o| RemoteObject {
                name: o.name.clone(),
                hash: ContentHash::of_bytes(&o.data).as_str().to_string(),
                last_modified: o.last_modified,
            })
            .collect())
    }

    fn delete(&self, name: &str) -> Result<(), PublishError> {
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|o| o.name != name);
        if objects.len() == before {
            return Err(PublishError::Remote(format!("delete `{name}`: no such object")));
        }
        Ok(())
    }
}
