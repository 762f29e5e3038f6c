use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to put object: {0}")]
    Put(String),
    #[error("failed to get object: {0}")]
    Get(String),
    #[error("failed to delete object: {0}")]
    Delete(String),
    #[error("object not found")]
    NotFound,
    #[error("configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Default, Clone)]
pub struct PutObjectOptions<'a> {
    pub content_type: Option<&'a str>,
}

/// Object bytes together with the metadata the store keeps for them.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}
