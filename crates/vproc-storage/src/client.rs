//! S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use vproc_models::ArtifactRef;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectStore, VIDEO_CONTENT_TYPE};

/// S3-compatible object store client (MinIO).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new client from configuration. Does not connect.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "minio",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env()?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::bucket_error(format!("connectivity check failed: {}", e)))?;
        Ok(())
    }

    /// Make sure the bucket exists, creating it when missing.
    pub async fn ensure_bucket(&self) -> StorageResult<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Bucket {} exists", self.bucket);
                return Ok(());
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                debug!("Bucket {} not found, creating it", self.bucket);
            }
            Err(e) => {
                return Err(StorageError::bucket_error(format!(
                    "failed to check bucket {}: {}",
                    self.bucket, e
                )))
            }
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Created bucket {}", self.bucket);
                Ok(())
            }
            // Another worker replica won the race.
            Err(e)
                if e.as_service_error().is_some_and(|se| {
                    se.is_bucket_already_owned_by_you() || se.is_bucket_already_exists()
                }) =>
            {
                Ok(())
            }
            Err(e) => Err(StorageError::bucket_error(format!(
                "failed to create bucket {}: {}",
                self.bucket, e
            ))),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, artifact: &ArtifactRef, dest: &Path) -> StorageResult<()> {
        let key = artifact.key();
        debug!("Downloading {} to {}", key, dest.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::not_found(key.clone())
                } else {
                    StorageError::download_failed(format!("{}: {}", key, e))
                }
            })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::download_failed(format!("failed to create directory: {}", e))
            })?;
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            StorageError::download_failed(format!("failed to create {}: {}", dest.display(), e))
        })?;

        let mut body = response.body.into_async_read();
        let copied = async {
            let bytes = tokio::io::copy(&mut body, &mut file).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(bytes)
        }
        .await;

        match copied {
            Ok(bytes) => {
                info!("Downloaded {} to {} ({} bytes)", key, dest.display(), bytes);
                Ok(())
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    warn!("Failed to remove partial download {}: {}", dest.display(), rm);
                }
                Err(StorageError::download_failed(format!(
                    "failed to write {}: {}",
                    dest.display(),
                    e
                )))
            }
        }
    }

    async fn store(&self, src: &Path, artifact: &ArtifactRef) -> StorageResult<()> {
        let key = artifact.key();
        debug!("Uploading {} to {}", src.display(), key);

        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", src.display(), e)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(VIDEO_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", key, e)))?;

        info!("Uploaded {} to {}/{}", src.display(), self.bucket, key);
        Ok(())
    }
}
