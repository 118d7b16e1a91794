//! Speech-to-text service client
//!
//! Covers the three calls the transcription flow needs: uploading media
//! bytes, submitting a job for a reachable audio URL, and polling job
//! status. The optional `AudioTranscoder` seam turns mixed media into an
//! audio-only stream before upload; without one, the flow falls back to
//! submitting a signed URL of the original object.

use crate::config::SpeechConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static AUDIO_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp3|m4a|aac|wav|flac|ogg|opus)$").unwrap());

/// Whether a filename already names an audio container the service accepts
pub fn has_audio_extension(filename: &str) -> bool {
    AUDIO_EXT.is_match(filename)
}

/// Reported state of a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechJobState {
    Queued,
    Processing,
    Completed,
    Error,
}

impl SpeechJobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SpeechJobState::Completed | SpeechJobState::Error)
    }
}

/// A transcription job's polled status
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechJobStatus {
    pub id: String,
    pub status: SpeechJobState,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The speech-to-text service
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Upload raw media bytes, returning a URL the service can transcribe
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String>;

    /// Submit a transcription job for an audio URL, returning the job id
    async fn submit(&self, audio_url: &str) -> Result<String>;

    /// Poll a job's status
    async fn status(&self, job_id: &str) -> Result<SpeechJobStatus>;
}

/// Optional collaborator that strips a media stream down to audio
///
/// `Ok(None)` means the media has no extractable audio track; the caller
/// falls back to submitting the original. An `Err` is a real transcode
/// failure and aborts the run.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn extract_audio(&self, media: &[u8]) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Serialize)]
struct SubmitRequest<'a> {
    audio_url: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

/// Client for an HTTP speech-to-text service
pub struct HttpSpeechClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpSpeechClient {
    pub fn new(config: &SpeechConfig, api_key: Option<String>) -> Result<Self> {
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

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid speech service URL: {}", e)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("authorization", key),
            None => builder,
        }
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechClient {
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String> {
        let url = self.endpoint("/v2/upload")?;
        let response = self
            .authorize(self.client.post(url))
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.upload_url)
    }

    async fn submit(&self, audio_url: &str) -> Result<String> {
        let url = self.endpoint("/v2/transcript")?;
        let response = self
            .authorize(self.client.post(url))
            .json(&SubmitRequest { audio_url })
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let parsed: SubmitResponse = response.json().await?;
        Ok(parsed.id)
    }

    async fn status(&self, job_id: &str) -> Result<SpeechJobStatus> {
        let url = self.endpoint(&format!("/v2/transcript/{}", job_id))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Transcription(e.to_string()))?;

        Ok(response.json().await?)
    }
}
