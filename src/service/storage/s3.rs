use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{
    Client, Config,
    config::{Credentials, Region},
};
use bytes::Bytes;
use tracing::info;

use crate::config::S3StorageConfig;
use crate::service::storage::Storage;
use crate::service::storage::types::{
    PutObjectOptions, StorageError, StorageResult, StoredObject,
};

/// S3-compatible driver. A custom endpoint with path-style addressing covers
/// R2 and minio in addition to AWS.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(config: &S3StorageConfig) -> StorageResult<Self> {
        let region = config
            .region
            .clone()
            .ok_or_else(|| StorageError::Config("s3 region is not configured".to_string()))?;
        let access_key = config
            .access_key
            .clone()
            .ok_or_else(|| StorageError::Config("s3 access key is not configured".to_string()))?;
        let secret_key = config
            .secret_key
            .clone()
            .ok_or_else(|| StorageError::Config("s3 secret key is not configured".to_string()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "default");
        let mut s3_config_builder = Config::builder()
            .region(Region::new(region))
            .credentials_provider(credentials)
            .behavior_version_latest();

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint.as_str())
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());
        info!("S3 storage initialized for bucket: {}", &config.bucket);
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        options: PutObjectOptions<'_>,
    ) -> StorageResult<()> {
        let stream = ByteStream::from(data);
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(stream);

        if let Some(content_type) = options.content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Put(e.to_string()))
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound
                } else {
                    StorageError::Get(e.to_string())
                }
            })?;

        let content_type = resp.content_type().map(|ct| ct.to_string());
        let etag = resp.e_tag().map(|etag| etag.trim_matches('"').to_string());
        let data = resp
            .body
            .collect()
            .await
            .map(|d| d.into_bytes())
            .map_err(|e| StorageError::Get(e.to_string()))?;

        Ok(StoredObject {
            data,
            content_type,
            etag,
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        // S3 DeleteObject succeeds for missing keys.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Delete(e.to_string()))
    }
}
