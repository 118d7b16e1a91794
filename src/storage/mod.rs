//! Blob storage client
//!
//! Objects live under a single configured bucket. The store covers the
//! five calls the pipeline needs: upload, download, time-limited signed
//! URLs, batched removal, and a bounded listing used by the purge job.

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// One stored object as reported by a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    pub created_at: String,
}

impl StoredObject {
    /// Parse the object's creation timestamp
    pub fn created(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Bucket-scoped blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes to a path, overwriting any existing object
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<()>;

    /// Download an object's bytes
    async fn download(&self, path: &str) -> Result<Vec<u8>>;

    /// Create a time-limited signed URL for an object
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String>;

    /// Remove objects by path in one call
    async fn remove(&self, paths: &[String]) -> Result<()>;

    /// List objects oldest-first, up to `limit`
    async fn list(&self, limit: usize) -> Result<Vec<StoredObject>>;
}

#[derive(Debug, Clone, Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct SignResponse {
    #[serde(alias = "signedURL")]
    signed_url: String,
}

#[derive(Debug, Clone, Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
struct ListRequest {
    prefix: String,
    limit: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Debug, Clone, Serialize)]
struct SortBy {
    column: String,
    order: String,
}

/// Client for an HTTP object-storage service
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    bucket: String,
    api_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(config: &StorageConfig, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            bucket: config.bucket.clone(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid storage URL: {}", e)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let url = self.endpoint(&format!("/object/{}/{}", self.bucket, path))?;
        self.authorize(self.client.post(url))
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Storage(format!("Upload failed: {}", e)))?;
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.endpoint(&format!("/object/{}/{}", self.bucket, path))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Storage(format!("Download failed: {}", e)))?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        let url = self.endpoint(&format!("/object/sign/{}/{}", self.bucket, path))?;
        let response = self
            .authorize(self.client.post(url))
            .json(&SignRequest {
                expires_in: ttl_secs,
            })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Storage(format!("Signing failed: {}", e)))?;

        let parsed: SignResponse = response.json().await?;
        // Services may return a relative signing path
        if parsed.signed_url.starts_with('/') {
            Ok(self.endpoint(&parsed.signed_url)?.to_string())
        } else {
            Ok(parsed.signed_url)
        }
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.endpoint(&format!("/object/{}", self.bucket))?;
        self.authorize(self.client.delete(url))
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Storage(format!("Removal failed: {}", e)))?;
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredObject>> {
        let url = self.endpoint(&format!("/object/list/{}", self.bucket))?;
        let response = self
            .authorize(self.client.post(url))
            .json(&ListRequest {
                prefix: String::new(),
                limit,
                sort_by: SortBy {
                    column: "created_at".to_string(),
                    order: "asc".to_string(),
                },
            })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Storage(format!("Listing failed: {}", e)))?;

        Ok(response.json().await?)
    }
}
