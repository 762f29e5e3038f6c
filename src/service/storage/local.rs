use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::service::storage::Storage;
use crate::service::storage::types::{
    PutObjectOptions, StorageError, StorageResult, StoredObject,
};

const META_SUFFIX: &str = ".meta";

// Object metadata lives in a sidecar file next to the bytes; the filesystem
// itself keeps neither a content type nor an etag.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: Option<String>,
    etag: String,
}

#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: &str) -> Self {
        let root_path = Path::new(root);
        if !root_path.exists() {
            fs::create_dir_all(root_path).expect("Failed to create local storage directory");
        }
        Self {
            root: root_path.to_path_buf(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{META_SUFFIX}"))
    }

    fn read_meta(&self, key: &str) -> Option<ObjectMeta> {
        let raw = fs::read(self.meta_path(key)).ok()?;
        serde_json::from_slice(&raw).ok()
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        options: PutObjectOptions<'_>,
    ) -> StorageResult<()> {
        let full_path = self.object_path(key);
        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    error!("Failed to create directory for local storage: {}", e);
                    StorageError::Put("Failed to create directory".to_string())
                })?;
            }
        }

        let meta = ObjectMeta {
            content_type: options.content_type.map(|ct| ct.to_string()),
            etag: format!("{:x}", md5::compute(&data)),
        };
        fs::write(&full_path, &data)
            .map_err(|e| StorageError::Put(format!("Failed to write to file: {}", e)))?;
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| StorageError::Put(format!("Failed to encode metadata: {}", e)))?;
        fs::write(self.meta_path(key), meta_bytes)
            .map_err(|e| StorageError::Put(format!("Failed to write metadata: {}", e)))
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let full_path = self.object_path(key);
        let data = fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound
            } else {
                StorageError::Get(format!("Failed to read file: {}", e))
            }
        })?;

        let meta = self.read_meta(key);
        Ok(StoredObject {
            data: Bytes::from(data),
            content_type: meta.as_ref().and_then(|m| m.content_type.clone()),
            etag: meta.map(|m| m.etag),
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let _ = fs::remove_file(self.meta_path(key));
        match fs::remove_file(self.object_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete(format!(
                "Failed to delete file: {}",
                e
            ))),
        }
    }
}
