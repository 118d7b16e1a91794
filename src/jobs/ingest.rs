//! Ingestion orchestrator
//!
//! Takes a completed document from transcript text to vector rows plus a
//! tracking manifest. Per-chunk embedding failures degrade the result set
//! instead of failing the run; only a run that produces zero vectors is an
//! error. Ingestion never rewrites the document stage on failure: the
//! stage belongs to transcription, and the job's own error channel carries
//! ingestion failures.

use crate::chunk::chunk_text;
use crate::config::ChunkConfig;
use crate::embed::{embed_with_retry, ChunkEmbedding, Embedder, RetryPolicy};
use crate::error::{Error, Result};
use crate::extract::{excerpt, FieldSpec, MetadataExtractor, EXTRACTION_EXCERPT_CHARS};
use crate::meta::{IngestionMark, IngestionRecord, MetaDb};
use crate::store::{estimated_tokens, VectorPayload, VectorStore, VectorTarget};
use serde::Serialize;
use serde_json::Map;
use tracing::{debug, info, warn};

/// What to ingest and where
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub document_id: String,
    pub owner_id: String,
    pub target: VectorTarget,
    pub external_link: Option<String>,
}

/// Result of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Vector rows actually written
    pub vector_count: usize,
    /// Chunks produced by the chunker, including ones that failed embedding
    pub chunk_count: usize,
}

/// Run one ingestion
pub async fn ingest_document(
    db: &MetaDb,
    store: &VectorStore,
    embedder: &dyn Embedder,
    extractor: &dyn MetadataExtractor,
    chunking: &ChunkConfig,
    retry: &RetryPolicy,
    request: &IngestRequest,
) -> Result<IngestOutcome> {
    let doc = db
        .get_document(&request.document_id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(request.document_id.clone()))?;

    let text = doc
        .transcript_text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::EmptyTranscript(doc.id.clone()))?;

    let field_defs = db.enabled_fields(&request.owner_id).await?;
    let extracted: Map<String, serde_json::Value> = if field_defs.is_empty() {
        debug!("No enabled metadata fields, skipping extraction");
        Map::new()
    } else {
        let specs: Vec<FieldSpec> = field_defs.iter().map(FieldSpec::from).collect();
        extractor
            .extract(&specs, excerpt(text, EXTRACTION_EXCERPT_CHARS))
            .await?
    };

    let chunks = chunk_text(text, chunking.target_chars, chunking.max_chars);
    info!(
        document_id = %doc.id,
        chunks = chunks.len(),
        "Starting ingestion"
    );

    let mut vector_ids: Vec<String> = Vec::new();
    for chunk in &chunks {
        match embed_with_retry(embedder, &chunk.content, retry).await {
            ChunkEmbedding::Embedded {
                vector,
                attempts,
                last_error,
            } => {
                let payload = VectorPayload {
                    extracted: &extracted,
                    owner_id: &request.owner_id,
                    document_id: &doc.id,
                    filename: &doc.filename,
                    source_kind: &doc.source_kind,
                    source_url: doc.source_url.as_deref(),
                    external_link: request.external_link.as_deref(),
                    chunk_index: chunk.index,
                    embedding_attempts: attempts,
                    embedding_error: last_error.as_deref(),
                    estimated_tokens: estimated_tokens(&chunk.content),
                }
                .build();

                match store
                    .insert(request.target, &chunk.content, &vector, &payload)
                    .await
                {
                    Ok(id) => vector_ids.push(id),
                    Err(e) => {
                        warn!(
                            chunk_index = chunk.index,
                            "Vector insert failed, skipping chunk: {}", e
                        );
                    }
                }
            }
            ChunkEmbedding::Failed { attempts, error } => {
                warn!(
                    chunk_index = chunk.index,
                    attempts, "Chunk failed embedding, skipping: {}", error
                );
            }
        }
    }

    if vector_ids.is_empty() {
        return Err(Error::NoVectors(doc.id.clone()));
    }

    let record = IngestionRecord::new(
        request.owner_id.clone(),
        doc.id.clone(),
        &vector_ids,
        request.target,
        request.external_link.clone(),
    );
    db.insert_ingestion(&record).await?;

    db.set_ingestion_mark(
        &doc.id,
        IngestionMark {
            vector_count: vector_ids.len(),
            external_link: request.external_link.clone(),
        },
    )
    .await?;

    info!(
        document_id = %doc.id,
        vectors = vector_ids.len(),
        chunks = chunks.len(),
        "Ingestion complete"
    );

    Ok(IngestOutcome {
        vector_count: vector_ids.len(),
        chunk_count: chunks.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::{setup_db, StubEmbedder, StubExtractor};
    use crate::meta::{Document, DocumentStage, MetadataFieldDef, SourceKind};

    const RETRY: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        backoff_ms: 1,
    };

    fn small_chunks() -> ChunkConfig {
        ChunkConfig {
            target_chars: 10,
            max_chars: 1000,
        }
    }

    fn request(document_id: &str, external_link: Option<&str>) -> IngestRequest {
        IngestRequest {
            document_id: document_id.to_string(),
            owner_id: "owner-1".to_string(),
            target: VectorTarget::Primary,
            external_link: external_link.map(String::from),
        }
    }

    async fn seed_text_document(db: &crate::meta::MetaDb, text: &str) -> Document {
        let doc = Document::new_completed(
            "owner-1".to_string(),
            "pasted".to_string(),
            SourceKind::Text,
            text.to_string(),
        );
        db.insert_document(&doc).await.unwrap();
        doc
    }

    #[tokio::test]
    async fn test_full_run_writes_vectors_manifest_and_mark() {
        let (db, store, _tmp) = setup_db().await;
        let doc = seed_text_document(&db, "alpha one\n\nbravo two\n\ncharlie three").await;

        let embedder = StubEmbedder::new(4);
        let extractor = StubExtractor::new(&[]);

        let outcome = ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request(&doc.id, Some("https://example.com/ref")),
        )
        .await
        .unwrap();

        assert_eq!(outcome.vector_count, 3);
        assert_eq!(outcome.chunk_count, 3);
        assert_eq!(store.count(VectorTarget::Primary).await.unwrap(), 3);

        let manifests = db.ingestions_for_document(&doc.id).await.unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].chunk_count, 3);
        assert_eq!(
            manifests[0].external_link.as_deref(),
            Some("https://example.com/ref")
        );

        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        match loaded.stage().unwrap() {
            DocumentStage::Completed { ingestion, .. } => {
                let mark = ingestion.unwrap();
                assert_eq!(mark.vector_count, 3);
                assert_eq!(mark.external_link.as_deref(), Some("https://example.com/ref"));
            }
            other => panic!("unexpected stage: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_embedding_failure_degrades() {
        let (db, store, _tmp) = setup_db().await;
        let doc = seed_text_document(
            &db,
            "alpha one\n\nbravo two\n\ncharlie xx\n\ndelta four\n\nDOOMED five",
        )
        .await;

        let embedder = StubEmbedder::failing_on(4, "DOOMED");
        let extractor = StubExtractor::new(&[]);

        let outcome = ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request(&doc.id, None),
        )
        .await
        .unwrap();

        // 4 of 5 chunks survive; the manifest counts produced vectors only
        assert_eq!(outcome.vector_count, 4);
        assert_eq!(outcome.chunk_count, 5);
        assert_eq!(store.count(VectorTarget::Primary).await.unwrap(), 4);

        let manifests = db.ingestions_for_document(&doc.id).await.unwrap();
        assert_eq!(manifests[0].chunk_count, 4);
        assert_eq!(manifests[0].vector_ids().len(), 4);

        // Failing chunk was attempted the full 3 times
        let doomed_calls = embedder
            .calls()
            .iter()
            .filter(|c| c.contains("DOOMED"))
            .count();
        assert_eq!(doomed_calls, 3);
    }

    #[tokio::test]
    async fn test_all_chunks_failing_is_error_without_manifest() {
        let (db, store, _tmp) = setup_db().await;
        let doc = seed_text_document(&db, "DOOMED a\n\nDOOMED b").await;

        let embedder = StubEmbedder::failing_on(4, "DOOMED");
        let extractor = StubExtractor::new(&[]);

        let err = ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request(&doc.id, None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::NoVectors(_)));
        assert!(err.is_terminal());
        assert_eq!(store.count(VectorTarget::Primary).await.unwrap(), 0);
        assert!(db
            .ingestions_for_document(&doc.id)
            .await
            .unwrap()
            .is_empty());

        // The stage is untouched: still completed, no ingestion mark
        let loaded = db.get_document(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, "completed");
        match loaded.stage().unwrap() {
            DocumentStage::Completed { ingestion, .. } => assert!(ingestion.is_none()),
            other => panic!("unexpected stage: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_document_rejected() {
        let (db, store, _tmp) = setup_db().await;
        let embedder = StubEmbedder::new(4);
        let extractor = StubExtractor::new(&[]);

        let err = ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request("nope", None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_document_without_text_rejected() {
        let (db, store, _tmp) = setup_db().await;

        let doc = Document::new(
            "owner-1".to_string(),
            "talk.mp4".to_string(),
            SourceKind::Video,
            Some("uploads/talk.mp4".to_string()),
        );
        db.insert_document(&doc).await.unwrap();

        let whitespace = seed_text_document(&db, "   \n ").await;

        let embedder = StubEmbedder::new(4);
        let extractor = StubExtractor::new(&[]);

        for id in [&doc.id, &whitespace.id] {
            let err = ingest_document(
                &db,
                &store,
                &embedder,
                &extractor,
                &small_chunks(),
                &RETRY,
                &request(id, None),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, Error::EmptyTranscript(_)));
        }
    }

    #[tokio::test]
    async fn test_extraction_skipped_without_enabled_fields() {
        let (db, store, _tmp) = setup_db().await;
        let doc = seed_text_document(&db, "plain text body").await;

        let mut disabled = MetadataFieldDef::new("owner-1".to_string(), "author".to_string(), None);
        disabled.enabled = false;
        db.insert_field(&disabled).await.unwrap();

        let embedder = StubEmbedder::new(4);
        let extractor = StubExtractor::new(&[("author", "ghost")]);

        ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request(&doc.id, None),
        )
        .await
        .unwrap();

        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extracted_fields_flow_into_payloads() {
        let (db, store, _tmp) = setup_db().await;
        let doc = seed_text_document(&db, "a body by someone").await;

        db.insert_field(&MetadataFieldDef::new(
            "owner-1".to_string(),
            "author".to_string(),
            Some("Jane".to_string()),
        ))
        .await
        .unwrap();

        let embedder = StubEmbedder::new(4);
        let extractor = StubExtractor::new(&[("author", "Someone")]);

        ingest_document(
            &db,
            &store,
            &embedder,
            &extractor,
            &small_chunks(),
            &RETRY,
            &request(&doc.id, None),
        )
        .await
        .unwrap();

        assert_eq!(extractor.call_count(), 1);

        let manifests = db.ingestions_for_document(&doc.id).await.unwrap();
        let vid = &manifests[0].vector_ids()[0];
        let row = store.get(VectorTarget::Primary, vid).await.unwrap().unwrap();
        let metadata = row.metadata();
        assert_eq!(metadata["author"], "Someone");
        assert_eq!(metadata["document_id"], doc.id);
        assert_eq!(metadata["source_kind"], "text");
        assert_eq!(metadata["embedding_status"], "success");
        assert_eq!(metadata["chunk_index"], 0);
    }
}
