//! Scripted collaborator stubs shared across orchestrator tests

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::extract::{FieldSpec, MetadataExtractor};
use crate::meta::MetaDb;
use crate::speech::{AudioTranscoder, SpeechJobState, SpeechJobStatus, SpeechToText};
use crate::storage::{BlobStore, StoredObject};
use crate::store::VectorStore;
use crate::transcript::TranscriptFetcher;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tempfile::TempDir;

pub async fn setup_db() -> (MetaDb, VectorStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    let db = MetaDb::new(&tmp.path().join("test.db")).await.unwrap();
    let store = VectorStore::new(&db);
    (db, store, tmp)
}

/// Embedder that fails every call whose text contains `fail_marker`
pub struct StubEmbedder {
    pub dimension: usize,
    pub fail_marker: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail_marker: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(dimension: usize, marker: &str) -> Self {
        Self {
            dimension,
            fail_marker: Some(marker.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker) {
                return Err(Error::Embedding("stub embed failure".to_string()));
            }
        }
        Ok(vec![0.25; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "stub-embed"
    }
}

/// Extractor returning a fixed field map
pub struct StubExtractor {
    pub result: Map<String, Value>,
    pub calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            result: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MetadataExtractor for StubExtractor {
    async fn extract(&self, _fields: &[FieldSpec], text: &str) -> Result<Map<String, Value>> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(self.result.clone())
    }
}

/// In-memory blob store
pub struct StubBlob {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub removed: Mutex<Vec<String>>,
    pub listing: Vec<StoredObject>,
    pub fail_remove: bool,
}

impl StubBlob {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
            listing: Vec::new(),
            fail_remove: false,
        }
    }

    pub fn with_object(path: &str, bytes: &[u8]) -> Self {
        let stub = Self::new();
        stub.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        stub
    }

    pub fn removed_paths(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for StubBlob {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("Object not found: {}", path)))
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        Ok(format!("https://blob.test/sign/{}?ttl={}", path, ttl_secs))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if self.fail_remove {
            return Err(Error::Storage("stub removal failure".to_string()));
        }
        let mut removed = self.removed.lock().unwrap();
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            removed.push(path.clone());
            objects.remove(path);
        }
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<StoredObject>> {
        Ok(self.listing.iter().take(limit).cloned().collect())
    }
}

/// Speech service with a scripted status sequence
pub struct StubSpeech {
    pub statuses: Mutex<VecDeque<SpeechJobStatus>>,
    pub submitted_url: Mutex<Option<String>>,
    pub uploaded_bytes: Mutex<Option<Vec<u8>>>,
}

impl StubSpeech {
    pub fn with_statuses(statuses: Vec<SpeechJobStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            submitted_url: Mutex::new(None),
            uploaded_bytes: Mutex::new(None),
        }
    }

    pub fn completed(text: &str) -> Self {
        Self::with_statuses(vec![status(SpeechJobState::Completed, Some(text), None)])
    }

    pub fn submitted(&self) -> Option<String> {
        self.submitted_url.lock().unwrap().clone()
    }
}

pub fn status(state: SpeechJobState, text: Option<&str>, error: Option<&str>) -> SpeechJobStatus {
    SpeechJobStatus {
        id: "job-test".to_string(),
        status: state,
        text: text.map(String::from),
        error: error.map(String::from),
    }
}

#[async_trait]
impl SpeechToText for StubSpeech {
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String> {
        *self.uploaded_bytes.lock().unwrap() = Some(bytes);
        Ok("https://upload.test/media".to_string())
    }

    async fn submit(&self, audio_url: &str) -> Result<String> {
        *self.submitted_url.lock().unwrap() = Some(audio_url.to_string());
        Ok("job-test".to_string())
    }

    async fn status(&self, _job_id: &str) -> Result<SpeechJobStatus> {
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.pop_front() {
            Some(s) => Ok(s),
            // Scripts that run out stay in-flight
            None => Ok(status(SpeechJobState::Processing, None, None)),
        }
    }
}

/// Transcoder with a fixed outcome
pub struct StubTranscoder {
    pub output: Option<Vec<u8>>,
    pub fail: bool,
}

#[async_trait]
impl AudioTranscoder for StubTranscoder {
    async fn extract_audio(&self, _media: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.fail {
            return Err(Error::Transcription("stub transcode failure".to_string()));
        }
        Ok(self.output.clone())
    }
}

/// Transcript fetcher returning fixed text
pub struct StubFetcher {
    pub text: String,
    pub requested: Mutex<Option<String>>,
}

impl StubFetcher {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            requested: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TranscriptFetcher for StubFetcher {
    async fn fetch(&self, video_url: &str) -> Result<String> {
        *self.requested.lock().unwrap() = Some(video_url.to_string());
        Ok(self.text.clone())
    }
}
