//! Object store configuration.

use crate::error::{StorageError, StorageResult};

/// Configuration for the S3-compatible object store.
#[derive(Clone)]
pub struct StorageConfig {
    /// Endpoint URL (scheme added from `use_ssl` when missing)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (MinIO accepts any; defaults to "us-east-1")
    pub region: String,
    /// Whether the endpoint speaks TLS
    pub use_ssl: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::config_error(format!("{} not set", key)))
        };

        let use_ssl = lookup("MINIO_USE_SSL")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            endpoint_url: endpoint_url(&required("MINIO_ENDPOINT")?, use_ssl),
            access_key_id: required("MINIO_ROOT_USER")?,
            secret_access_key: required("MINIO_ROOT_PASSWORD")?,
            bucket_name: required("MINIO_BUCKET_NAME")?,
            region: lookup("MINIO_REGION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "us-east-1".to_string()),
            use_ssl,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the worker cannot start with.
    pub fn validate(&self) -> StorageResult<()> {
        let fields = [
            ("endpoint", &self.endpoint_url),
            ("access key", &self.access_key_id),
            ("secret key", &self.secret_access_key),
            ("bucket", &self.bucket_name),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(StorageError::config_error(format!("{} is empty", name)));
            }
        }
        Ok(())
    }
}

/// MinIO endpoints are usually given as `host:port`.
fn endpoint_url(endpoint: &str, use_ssl: bool) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{}", endpoint)
    } else {
        format!("http://{}", endpoint)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base() -> HashMap<String, String> {
        [
            ("MINIO_ENDPOINT", "minio:9000"),
            ("MINIO_ROOT_USER", "admin"),
            ("MINIO_ROOT_PASSWORD", "secret"),
            ("MINIO_BUCKET_NAME", "videos"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_endpoint_scheme_follows_ssl_flag() {
        let mut env = base();
        let config = StorageConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.endpoint_url, "http://minio:9000");
        assert_eq!(config.region, "us-east-1");

        env.insert("MINIO_USE_SSL".into(), "true".into());
        let config = StorageConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.endpoint_url, "https://minio:9000");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut env = base();
        env.remove("MINIO_ROOT_PASSWORD");
        let err = StorageConfig::from_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("MINIO_ROOT_PASSWORD"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let env = base();
        let config = StorageConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("<redacted>"));
    }
}
