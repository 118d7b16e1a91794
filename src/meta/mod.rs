//! Metadata storage using SQLite
//!
//! This module handles all local metadata storage including:
//! - Documents (uploads, pasted text, YouTube captures)
//! - Ingestions (manifests of vectors written per document)
//! - Metadata fields (the extraction vocabulary)
//! - Links (curated external references)

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::VectorTarget;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a document's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Audio,
    Document,
    Youtube,
    Text,
}

impl SourceKind {
    /// Whether documents of this kind keep an object in blob storage.
    /// YouTube and pasted-text documents only carry an external URL or
    /// nothing at all.
    pub fn has_stored_object(&self) -> bool {
        matches!(
            self,
            SourceKind::Video | SourceKind::Audio | SourceKind::Document
        )
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Video => write!(f, "video"),
            SourceKind::Audio => write!(f, "audio"),
            SourceKind::Document => write!(f, "document"),
            SourceKind::Youtube => write!(f, "youtube"),
            SourceKind::Text => write!(f, "text"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "video" => Ok(SourceKind::Video),
            "audio" => Ok(SourceKind::Audio),
            "document" => Ok(SourceKind::Document),
            "youtube" => Ok(SourceKind::Youtube),
            "text" => Ok(SourceKind::Text),
            _ => Err(Error::Config(format!("Unknown source kind: {}", s))),
        }
    }
}

/// Document status (derived from the stage, kept as a queryable column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Processing => write!(f, "processing"),
            DocumentStatus::Completed => write!(f, "completed"),
            DocumentStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(DocumentStatus::Processing),
            "completed" => Ok(DocumentStatus::Completed),
            "error" => Ok(DocumentStatus::Error),
            _ => Err(Error::Config(format!("Unknown document status: {}", s))),
        }
    }
}

/// Ingestion outcome recorded on a completed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionMark {
    pub vector_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

/// Lifecycle stage of a document
///
/// A processing document carries only its progress; a completed document
/// carries its transcript provenance and (once ingested) the ingestion
/// outcome; a failed document carries the failure message. The stage is
/// stored as JSON alongside the derived status column, and both are always
/// written together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DocumentStage {
    Processing {
        progress: u8,
    },
    Completed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ingestion: Option<IngestionMark>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript_job: Option<String>,
    },
    Error {
        message: String,
    },
}

impl DocumentStage {
    pub fn status(&self) -> DocumentStatus {
        match self {
            DocumentStage::Processing { .. } => DocumentStatus::Processing,
            DocumentStage::Completed { .. } => DocumentStatus::Completed,
            DocumentStage::Error { .. } => DocumentStatus::Error,
        }
    }
}

/// A document row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub filename: String,
    pub source_kind: String,
    pub source_url: Option<String>,
    pub transcript_text: Option<String>,
    pub status: String,
    pub stage_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Create a new document in the processing stage
    pub fn new(
        owner_id: String,
        filename: String,
        kind: SourceKind,
        source_url: Option<String>,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        let stage = DocumentStage::Processing { progress: 0 };
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            filename,
            source_kind: kind.to_string(),
            source_url,
            transcript_text: None,
            status: stage.status().to_string(),
            stage_json: serde_json::to_string(&stage).unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Create a document that already has its transcript (pasted text)
    pub fn new_completed(
        owner_id: String,
        filename: String,
        kind: SourceKind,
        transcript: String,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        let stage = DocumentStage::Completed {
            ingestion: None,
            transcript_job: None,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            filename,
            source_kind: kind.to_string(),
            source_url: None,
            transcript_text: Some(transcript),
            status: stage.status().to_string(),
            stage_json: serde_json::to_string(&stage).unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn kind(&self) -> Result<SourceKind> {
        self.source_kind.parse()
    }

    pub fn stage(&self) -> Result<DocumentStage> {
        Ok(serde_json::from_str(&self.stage_json)?)
    }
}

/// A recorded ingestion manifest
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub id: String,
    pub owner_id: String,
    pub document_id: String,
    pub vector_ids_json: String,
    pub chunk_count: i64,
    pub target_table: String,
    pub external_link: Option<String>,
    pub created_at: String,
}

impl IngestionRecord {
    pub fn new(
        owner_id: String,
        document_id: String,
        vector_ids: &[String],
        target: VectorTarget,
        external_link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            document_id,
            vector_ids_json: serde_json::to_string(vector_ids).unwrap_or_default(),
            chunk_count: vector_ids.len() as i64,
            target_table: target.to_string(),
            external_link,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn vector_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.vector_ids_json).unwrap_or_default()
    }

    pub fn target(&self) -> Result<VectorTarget> {
        self.target_table.parse()
    }
}

/// A metadata field definition
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MetadataFieldDef {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub example: Option<String>,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl MetadataFieldDef {
    pub fn new(owner_id: String, name: String, example: Option<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name,
            example,
            enabled: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A curated link
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub embedding_json: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl LinkRecord {
    pub fn new(owner_id: String, name: String, url: String, description: Option<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name,
            url,
            description,
            embedding_json: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Metadata database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Connect to the metadata database
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    /// Create database with path directly (without full config)
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        let db = Self::open(db_path).await?;

        // Auto-initialize schema if needed
        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    async fn open(db_path: &std::path::Path) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='documents'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    /// Access the underlying pool (shared with the vector store)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ===== Document Operations =====

    /// Insert a new document
    pub async fn insert_document(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, owner_id, filename, source_kind, source_url, transcript_text, status, stage_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.owner_id)
        .bind(&doc.filename)
        .bind(&doc.source_kind)
        .bind(&doc.source_url)
        .bind(&doc.transcript_text)
        .bind(&doc.status)
        .bind(&doc.stage_json)
        .bind(&doc.created_at)
        .bind(&doc.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get document by ID
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    /// List documents for an owner, newest first
    pub async fn list_documents(&self, owner_id: &str) -> Result<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    /// Write a document's stage and its derived status in one statement
    pub async fn set_stage(&self, id: &str, stage: &DocumentStage) -> Result<()> {
        let stage_json = serde_json::to_string(stage)?;
        sqlx::query(
            r#"
            UPDATE documents SET status = ?, stage_json = ?, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(stage.status().to_string())
        .bind(stage_json)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Advance the progress of a processing document
    pub async fn set_progress(&self, id: &str, progress: u8) -> Result<()> {
        self.set_stage(id, &DocumentStage::Processing { progress })
            .await
    }

    /// Store a transcript and move the document to completed
    pub async fn save_transcript(
        &self,
        id: &str,
        transcript: &str,
        transcript_job: Option<String>,
    ) -> Result<()> {
        let stage = DocumentStage::Completed {
            ingestion: None,
            transcript_job,
        };
        let stage_json = serde_json::to_string(&stage)?;
        sqlx::query(
            r#"
            UPDATE documents SET transcript_text = ?, status = ?, stage_json = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(transcript)
        .bind(stage.status().to_string())
        .bind(stage_json)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stamp a completed document with its ingestion outcome, preserving
    /// the transcript provenance already on the stage
    pub async fn set_ingestion_mark(&self, id: &str, mark: IngestionMark) -> Result<()> {
        let doc = self
            .get_document(id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

        let transcript_job = match doc.stage()? {
            DocumentStage::Completed { transcript_job, .. } => transcript_job,
            _ => None,
        };

        self.set_stage(
            id,
            &DocumentStage::Completed {
                ingestion: Some(mark),
                transcript_job,
            },
        )
        .await
    }

    /// Delete a document row
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a document together with its ingestion manifests and the
    /// vector rows they reference, all in a single transaction
    pub async fn delete_document_cascade(
        &self,
        id: &str,
        manifests: &[IngestionRecord],
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let mut deleted = 0u64;
        for record in manifests {
            let Ok(target) = record.target() else {
                warn!(
                    "Skipping manifest {} with unknown target {}",
                    record.id, record.target_table
                );
                continue;
            };
            let vector_ids = record.vector_ids();
            if vector_ids.is_empty() {
                continue;
            }
            let placeholders = vector_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let query = format!(
                "DELETE FROM {} WHERE id IN ({})",
                target.table(),
                placeholders
            );
            let mut q = sqlx::query(&query);
            for vid in &vector_ids {
                q = q.bind(vid);
            }
            deleted += q.execute(&mut *tx).await?.rows_affected();
        }

        sqlx::query("DELETE FROM ingestions WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted)
    }

    // ===== Ingestion Operations =====

    /// Insert an ingestion manifest
    pub async fn insert_ingestion(&self, record: &IngestionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ingestions (id, owner_id, document_id, vector_ids_json, chunk_count, target_table, external_link, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.document_id)
        .bind(&record.vector_ids_json)
        .bind(record.chunk_count)
        .bind(&record.target_table)
        .bind(&record.external_link)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get all ingestion manifests for a document
    pub async fn ingestions_for_document(&self, document_id: &str) -> Result<Vec<IngestionRecord>> {
        let records = sqlx::query_as::<_, IngestionRecord>(
            "SELECT * FROM ingestions WHERE document_id = ? ORDER BY created_at",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Delete all ingestion manifests for a document
    pub async fn delete_ingestions_for_document(&self, document_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM ingestions WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Metadata Field Operations =====

    /// Insert a metadata field definition
    pub async fn insert_field(&self, field: &MetadataFieldDef) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO metadata_fields (id, owner_id, name, example, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&field.id)
        .bind(&field.owner_id)
        .bind(&field.name)
        .bind(&field.example)
        .bind(field.enabled)
        .bind(&field.created_at)
        .bind(&field.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List all metadata field definitions for an owner
    pub async fn list_fields(&self, owner_id: &str) -> Result<Vec<MetadataFieldDef>> {
        let fields = sqlx::query_as::<_, MetadataFieldDef>(
            "SELECT * FROM metadata_fields WHERE owner_id = ? ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    /// List only the enabled metadata field definitions for an owner
    pub async fn enabled_fields(&self, owner_id: &str) -> Result<Vec<MetadataFieldDef>> {
        let fields = sqlx::query_as::<_, MetadataFieldDef>(
            "SELECT * FROM metadata_fields WHERE owner_id = ? AND enabled = 1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    /// Toggle a metadata field definition
    pub async fn set_field_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE metadata_fields SET enabled = ?, updated_at = ? WHERE id = ?")
            .bind(enabled)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a metadata field definition
    pub async fn delete_field(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM metadata_fields WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Link Operations =====

    /// Insert a link
    pub async fn insert_link(&self, link: &LinkRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO links (id, owner_id, name, url, description, embedding_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id)
        .bind(&link.owner_id)
        .bind(&link.name)
        .bind(&link.url)
        .bind(&link.description)
        .bind(&link.embedding_json)
        .bind(&link.created_at)
        .bind(&link.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get link by ID
    pub async fn get_link(&self, id: &str) -> Result<Option<LinkRecord>> {
        let link = sqlx::query_as::<_, LinkRecord>("SELECT * FROM links WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(link)
    }

    /// List links for an owner, newest first
    pub async fn list_links(&self, owner_id: &str) -> Result<Vec<LinkRecord>> {
        let links = sqlx::query_as::<_, LinkRecord>(
            "SELECT * FROM links WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    /// Delete a link row
    pub async fn delete_link(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ===== Statistics =====

    /// Get global statistics
    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        let document_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        let ingestion_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM ingestions")
            .fetch_one(&self.pool)
            .await?;

        let link_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
            .fetch_one(&self.pool)
            .await?;

        let field_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM metadata_fields")
            .fetch_one(&self.pool)
            .await?;

        Ok(GlobalStats {
            document_count: document_count as usize,
            ingestion_count: ingestion_count as usize,
            link_count: link_count as usize,
            field_count: field_count as usize,
        })
    }

    /// Document counts grouped by the derived status column
    pub async fn count_documents_by_status(&self) -> Result<Vec<(String, usize)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM documents GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(s, n)| (s, n as usize)).collect())
    }
}

/// Global statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub document_count: usize,
    pub ingestion_count: usize,
    pub link_count: usize,
    pub field_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (MetaDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = MetaDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let (db, _tmp) = setup_test_db().await;

        let doc = Document::new(
            "owner-1".to_string(),
            "talk.mp4".to_string(),
            SourceKind::Video,
            Some("uploads/talk.mp4".to_string()),
        );
        db.insert_document(&doc).await.unwrap();

        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, "processing");
        assert_eq!(
            loaded.stage().unwrap(),
            DocumentStage::Processing { progress: 0 }
        );

        db.set_progress(&doc.id, 42).await.unwrap();
        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.stage().unwrap(),
            DocumentStage::Processing { progress: 42 }
        );

        db.save_transcript(&doc.id, "hello world", Some("job-7".to_string()))
            .await
            .unwrap();
        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
        assert_eq!(loaded.transcript_text.as_deref(), Some("hello world"));
        match loaded.stage().unwrap() {
            DocumentStage::Completed {
                ingestion,
                transcript_job,
            } => {
                assert!(ingestion.is_none());
                assert_eq!(transcript_job.as_deref(), Some("job-7"));
            }
            other => panic!("unexpected stage: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingestion_mark_preserves_transcript_job() {
        let (db, _tmp) = setup_test_db().await;

        let doc = Document::new(
            "owner-1".to_string(),
            "talk.mp4".to_string(),
            SourceKind::Video,
            None,
        );
        db.insert_document(&doc).await.unwrap();
        db.save_transcript(&doc.id, "text", Some("job-9".to_string()))
            .await
            .unwrap();

        db.set_ingestion_mark(
            &doc.id,
            IngestionMark {
                vector_count: 3,
                external_link: None,
            },
        )
        .await
        .unwrap();

        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        match loaded.stage().unwrap() {
            DocumentStage::Completed {
                ingestion,
                transcript_job,
            } => {
                assert_eq!(ingestion.unwrap().vector_count, 3);
                assert_eq!(transcript_job.as_deref(), Some("job-9"));
            }
            other => panic!("unexpected stage: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_stage_replaces_progress() {
        let (db, _tmp) = setup_test_db().await;

        let doc = Document::new(
            "owner-1".to_string(),
            "notes.pdf".to_string(),
            SourceKind::Document,
            Some("uploads/notes.pdf".to_string()),
        );
        db.insert_document(&doc).await.unwrap();
        db.set_progress(&doc.id, 10).await.unwrap();

        db.set_stage(
            &doc.id,
            &DocumentStage::Error {
                message: "boom".to_string(),
            },
        )
        .await
        .unwrap();

        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, "error");
        assert_eq!(
            loaded.stage().unwrap(),
            DocumentStage::Error {
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_ingestion_manifest_round_trip() {
        let (db, _tmp) = setup_test_db().await;

        let doc = Document::new_completed(
            "owner-1".to_string(),
            "pasted".to_string(),
            SourceKind::Text,
            "some text".to_string(),
        );
        db.insert_document(&doc).await.unwrap();

        let ids = vec!["v1".to_string(), "v2".to_string()];
        let record = IngestionRecord::new(
            "owner-1".to_string(),
            doc.id.clone(),
            &ids,
            VectorTarget::Primary,
            Some("https://example.com".to_string()),
        );
        db.insert_ingestion(&record).await.unwrap();

        let records = db.ingestions_for_document(&doc.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vector_ids(), ids);
        assert_eq!(records[0].chunk_count, 2);
        assert_eq!(records[0].target().unwrap(), VectorTarget::Primary);
    }

    #[tokio::test]
    async fn test_cascade_delete_is_atomic() {
        let (db, _tmp) = setup_test_db().await;

        let doc = Document::new_completed(
            "owner-1".to_string(),
            "pasted".to_string(),
            SourceKind::Text,
            "some text".to_string(),
        );
        db.insert_document(&doc).await.unwrap();

        for vid in ["v1", "v2"] {
            sqlx::query(
                "INSERT INTO vectors_primary (id, content, embedding_json, metadata_json, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(vid)
            .bind("chunk")
            .bind("[0.1]")
            .bind("{}")
            .bind(Utc::now().to_rfc3339())
            .execute(db.pool())
            .await
            .unwrap();
        }

        let ids = vec!["v1".to_string(), "v2".to_string()];
        let record = IngestionRecord::new(
            "owner-1".to_string(),
            doc.id.clone(),
            &ids,
            VectorTarget::Primary,
            None,
        );
        db.insert_ingestion(&record).await.unwrap();

        let manifests = db.ingestions_for_document(&doc.id).await.unwrap();
        let deleted = db
            .delete_document_cascade(&doc.id, &manifests)
            .await
            .unwrap();
        assert_eq!(deleted, 2);

        assert!(db.get_document(&doc.id).await.unwrap().is_none());
        assert!(db
            .ingestions_for_document(&doc.id)
            .await
            .unwrap()
            .is_empty());
        let remaining: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors_primary")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_field_crud_and_enabled_filter() {
        let (db, _tmp) = setup_test_db().await;

        let f1 = MetadataFieldDef::new(
            "owner-1".to_string(),
            "author".to_string(),
            Some("Jane Doe".to_string()),
        );
        let f2 = MetadataFieldDef::new("owner-1".to_string(), "topic".to_string(), None);
        db.insert_field(&f1).await.unwrap();
        db.insert_field(&f2).await.unwrap();

        db.set_field_enabled(&f2.id, false).await.unwrap();

        let all = db.list_fields("owner-1").await.unwrap();
        assert_eq!(all.len(), 2);

        let enabled = db.enabled_fields("owner-1").await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "author");

        db.delete_field(&f1.id).await.unwrap();
        assert_eq!(db.list_fields("owner-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_crud() {
        let (db, _tmp) = setup_test_db().await;

        let mut link = LinkRecord::new(
            "owner-1".to_string(),
            "Docs".to_string(),
            "https://example.com/docs".to_string(),
            Some("Reference".to_string()),
        );
        link.embedding_json = Some("[0.5,0.5]".to_string());
        db.insert_link(&link).await.unwrap();

        let loaded = db.get_link(&link.id).await.unwrap().unwrap();
        assert_eq!(loaded.url, "https://example.com/docs");
        assert_eq!(loaded.embedding_json.as_deref(), Some("[0.5,0.5]"));

        assert_eq!(db.list_links("owner-1").await.unwrap().len(), 1);

        db.delete_link(&link.id).await.unwrap();
        assert!(db.get_link(&link.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_global_stats_and_status_breakdown() {
        let (db, _tmp) = setup_test_db().await;

        let processing = Document::new(
            "owner-1".to_string(),
            "talk.mp4".to_string(),
            SourceKind::Video,
            None,
        );
        db.insert_document(&processing).await.unwrap();

        for n in 0..2 {
            let doc = Document::new_completed(
                "owner-1".to_string(),
                format!("note-{}.txt", n),
                SourceKind::Text,
                "body".to_string(),
            );
            db.insert_document(&doc).await.unwrap();
        }

        let failed = Document::new(
            "owner-1".to_string(),
            "broken.pdf".to_string(),
            SourceKind::Document,
            None,
        );
        db.insert_document(&failed).await.unwrap();
        db.set_stage(
            &failed.id,
            &DocumentStage::Error {
                message: "no text".to_string(),
            },
        )
        .await
        .unwrap();

        let stats = db.get_global_stats().await.unwrap();
        assert_eq!(stats.document_count, 4);
        assert_eq!(stats.ingestion_count, 0);

        let by_status = db.count_documents_by_status().await.unwrap();
        let count = |status: &str| {
            by_status
                .iter()
                .find(|(s, _)| s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0)
        };
        assert_eq!(count("processing"), 1);
        assert_eq!(count("completed"), 2);
        assert_eq!(count("error"), 1);
    }
}
