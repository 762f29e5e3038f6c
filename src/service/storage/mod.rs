use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{StorageConfig, StorageDriver};
use crate::service::storage::local::LocalStorage;
use crate::service::storage::s3::S3Storage;
use crate::service::storage::types::{PutObjectOptions, StorageResult, StoredObject};

pub mod local;
pub mod s3;
pub mod types;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        options: PutObjectOptions<'_>,
    ) -> StorageResult<()>;
    async fn get_object(&self, key: &str) -> StorageResult<StoredObject>;
    /// Deleting a key that does not exist is not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;
}

pub async fn build_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    match config.driver {
        StorageDriver::Local => Ok(Arc::new(LocalStorage::new(&config.local.root))),
        StorageDriver::S3 => {
            if let Some(s3_config) = config.s3.as_ref() {
                Ok(Arc::new(S3Storage::new(s3_config).await?))
            } else {
                Ok(Arc::new(LocalStorage::new(&config.local.root)))
            }
        }
    }
}
