//! Video transcript fetch service client

use crate::config::TranscriptConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Fetches the transcript of a hosted video by URL
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, video_url: &str) -> Result<String>;
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptResponse {
    transcript: String,
}

/// Client for an HTTP transcript-fetch service
pub struct HttpTranscriptFetcher {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTranscriptFetcher {
    pub fn new(config: &TranscriptConfig, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl TranscriptFetcher for HttpTranscriptFetcher {
    async fn fetch(&self, video_url: &str) -> Result<String> {
        let mut url = self
            .base_url
            .join("/transcript")
            .map_err(|e| Error::Config(format!("Invalid transcript service URL: {}", e)))?;
        url.query_pairs_mut().append_pair("url", video_url);

        let mut builder = self.client.get(url);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let parsed: TranscriptResponse = response.json().await?;
        Ok(parsed.transcript)
    }
}
