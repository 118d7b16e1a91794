//! Document registration
//!
//! Creates document rows for the three intake paths: local file uploads,
//! pasted text, and YouTube URLs. Uploads land in blob storage under
//! `{owner}/{document_id}/{filename}` before the row is written, so a
//! failed upload leaves no record behind.

use crate::error::{Error, Result};
use crate::meta::{Document, MetaDb, SourceKind};
use crate::speech::has_audio_extension;
use crate::storage::BlobStore;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;
use url::Url;

static VIDEO_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(mp4|mov|avi)$").unwrap());

/// Classify an upload by its file extension
pub fn infer_source_kind(filename: &str) -> SourceKind {
    if VIDEO_EXT.is_match(filename) {
        SourceKind::Video
    } else if has_audio_extension(filename) {
        SourceKind::Audio
    } else {
        SourceKind::Document
    }
}

/// Upload a local file and register it for transcription
pub async fn register_file(
    db: &MetaDb,
    blobs: &dyn BlobStore,
    owner_id: &str,
    path: &Path,
) -> Result<Document> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid file path: {}", path.display())))?
        .to_string();

    let bytes = tokio::fs::read(path).await?;
    let kind = infer_source_kind(&filename);

    let mut doc = Document::new(owner_id.to_string(), filename.clone(), kind, None);
    let storage_path = format!("{}/{}/{}", owner_id, doc.id, filename);
    blobs.upload(&storage_path, bytes).await?;
    doc.source_url = Some(storage_path);
    db.insert_document(&doc).await?;

    info!(
        document_id = %doc.id,
        kind = %doc.source_kind,
        "Registered {}", doc.filename
    );
    Ok(doc)
}

/// Register pasted text, complete on arrival
pub async fn register_text(
    db: &MetaDb,
    owner_id: &str,
    title: &str,
    content: &str,
) -> Result<Document> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(Error::InvalidInput(
            "Title and content are required".to_string(),
        ));
    }

    let doc = Document::new_completed(
        owner_id.to_string(),
        title.to_string(),
        SourceKind::Text,
        content.to_string(),
    );
    db.insert_document(&doc).await?;

    info!(document_id = %doc.id, "Registered pasted text: {}", doc.filename);
    Ok(doc)
}

/// Register a YouTube URL for transcript fetching
pub async fn register_youtube(db: &MetaDb, owner_id: &str, url: &str) -> Result<Document> {
    if Url::parse(url).is_err() {
        return Err(Error::InvalidInput(format!("Invalid URL: {}", url)));
    }

    let doc = Document::new(
        owner_id.to_string(),
        format!("YouTube: {}", url),
        SourceKind::Youtube,
        Some(url.to_string()),
    );
    db.insert_document(&doc).await?;

    info!(document_id = %doc.id, "Registered {}", doc.filename);
    Ok(doc)
}
