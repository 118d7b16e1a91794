//! Status inspection
//!
//! Read-only views over the metadata database and vector tables, one
//! global and one per document, shaped for both JSON and console output.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{DocumentStage, GlobalStats, MetaDb};
use crate::store::{VectorStore, VectorTarget};
use serde::{Deserialize, Serialize};
use tracing::info;

/// System-wide status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub owner_id: String,
    pub embedding_model: String,
    pub documents_processing: usize,
    pub documents_completed: usize,
    pub documents_error: usize,
    pub primary_vectors: usize,
    pub secondary_vectors: usize,
    pub db_stats: GlobalStats,
}

/// One document's stage, flattened for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatusInfo {
    pub id: String,
    pub filename: String,
    pub source_kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_job: Option<String>,
    pub transcript_chars: usize,
    pub created_at: String,
}

/// Get system status
pub async fn global_status(
    config: &Config,
    db: &MetaDb,
    store: &VectorStore,
) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = db.get_global_stats().await?;
    let by_status = db.count_documents_by_status().await?;
    let count_for = |status: &str| {
        by_status
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        owner_id: config.owner_id.clone(),
        embedding_model: config.embedding.model.clone(),
        documents_processing: count_for("processing"),
        documents_completed: count_for("completed"),
        documents_error: count_for("error"),
        primary_vectors: store.count(VectorTarget::Primary).await?,
        secondary_vectors: store.count(VectorTarget::Secondary).await?,
        db_stats,
    })
}

/// Get one document's status
pub async fn document_status(db: &MetaDb, document_id: &str) -> Result<DocumentStatusInfo> {
    let doc = db
        .get_document(document_id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

    let mut info = DocumentStatusInfo {
        id: doc.id.clone(),
        filename: doc.filename.clone(),
        source_kind: doc.source_kind.clone(),
        status: doc.status.clone(),
        progress: None,
        error: None,
        vector_count: None,
        transcript_job: None,
        transcript_chars: doc
            .transcript_text
            .as_deref()
            .map(|t| t.chars().count())
            .unwrap_or(0),
        created_at: doc.created_at.clone(),
    };

    match doc.stage()? {
        DocumentStage::Processing { progress } => info.progress = Some(progress),
        DocumentStage::Completed {
            ingestion,
            transcript_job,
        } => {
            info.vector_count = ingestion.map(|mark| mark.vector_count);
            info.transcript_job = transcript_job;
        }
        DocumentStage::Error { message } => info.error = Some(message),
    }

    Ok(info)
}

/// Print global status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 scrivener Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("Owner: {}", status.owner_id);
    println!("Embedding Model: {}", status.embedding_model);
    println!("\nDocuments: {}", status.db_stats.document_count);
    println!("  Processing: {}", status.documents_processing);
    println!("  Completed: {}", status.documents_completed);
    println!("  Error: {}", status.documents_error);
    println!("\nVectors:");
    println!("  Primary: {}", status.primary_vectors);
    println!("  Secondary: {}", status.secondary_vectors);
    println!("\nIngestions: {}", status.db_stats.ingestion_count);
    println!("Links: {}", status.db_stats.link_count);
    println!("Metadata fields: {}", status.db_stats.field_count);
}

/// Print one document's status to console
pub fn print_document_status(info: &DocumentStatusInfo) {
    println!("\n📄 {} [{}]", info.filename, info.source_kind);
    println!("  ID: {}", info.id);
    println!("  Status: {}", info.status);
    if let Some(progress) = info.progress {
        println!("  Progress: {}%", progress);
    }
    if let Some(error) = &info.error {
        println!("  Error: {}", error);
    }
    if let Some(count) = info.vector_count {
        println!("  Vectors: {}", count);
    }
    if let Some(job) = &info.transcript_job {
        println!("  Transcript job: {}", job);
    }
    println!("  Transcript: {} chars", info.transcript_chars);
    println!("  Created: {}", info.created_at);
}
