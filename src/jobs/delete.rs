//! Deletion orchestrators
//!
//! Single deletion reverses an ingestion step by step: vector rows, then
//! tracking manifests, then the document row, then the stored blob. The
//! steps before the document row are best-effort and the blob removal is
//! best-effort; only a failure deleting the document row itself aborts,
//! which leaves the already-removed dependents gone. Multi-document
//! deletion instead runs row, manifest, and vector removal in one
//! transaction per document and aggregates per-document failures.

use crate::error::{Error, Result};
use crate::meta::MetaDb;
use crate::storage::BlobStore;
use crate::store::VectorStore;
use serde::Serialize;
use tracing::{info, warn};

/// Result of deleting one document
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub document_id: String,
    /// Vector rows removed across all of the document's manifests
    pub deleted_vectors: u64,
    /// Whether the stored blob was removed
    pub removed_blob: bool,
}

/// Aggregated result of a multi-document deletion
#[derive(Debug, Clone, Serialize)]
pub struct MultiDeleteOutcome {
    /// Documents fully deleted
    pub deleted: usize,
    pub deleted_vectors: u64,
    /// Per-document failure detail, one entry per document that failed
    pub errors: Vec<String>,
}

/// Delete one document and everything it produced
///
/// A missing document row is not an error: the remaining steps still clear
/// out any manifests and vector rows left behind by an earlier partial
/// deletion.
pub async fn delete_document(
    db: &MetaDb,
    store: &VectorStore,
    blobs: &dyn BlobStore,
    document_id: &str,
) -> Result<DeleteOutcome> {
    let doc = db.get_document(document_id).await?;
    if doc.is_none() {
        warn!(document_id, "Document row not found, removing leftovers");
    }

    let manifests = db.ingestions_for_document(document_id).await?;
    let mut deleted_vectors = 0u64;
    for record in &manifests {
        match record.target() {
            Ok(target) => match store.delete(target, &record.vector_ids()).await {
                Ok(n) => deleted_vectors += n,
                Err(e) => warn!(
                    manifest_id = %record.id,
                    "Vector deletion failed, continuing: {}", e
                ),
            },
            Err(e) => warn!(manifest_id = %record.id, "Skipping manifest: {}", e),
        }
    }

    db.delete_ingestions_for_document(document_id).await?;

    // The document row is the step that must not fail silently. Bailing
    // here skips blob removal, leaving the object orphaned but accounted.
    db.delete_document(document_id).await?;

    let mut removed_blob = false;
    if let Some(doc) = &doc {
        let stored = doc.kind().map(|k| k.has_stored_object()).unwrap_or(false);
        if let (true, Some(source)) = (stored, &doc.source_url) {
            match blobs.remove(&[source.clone()]).await {
                Ok(()) => removed_blob = true,
                Err(e) => warn!(
                    document_id,
                    "Blob removal failed, object orphaned at {}: {}", source, e
                ),
            }
        }
    }

    info!(document_id, deleted_vectors, removed_blob, "Document deleted");
    Ok(DeleteOutcome {
        document_id: document_id.to_string(),
        deleted_vectors,
        removed_blob,
    })
}

/// Delete several documents, each atomically, aggregating failures
///
/// Succeeds if at least one document was deleted. Blob removal happens in
/// one batch after the database work and stays best-effort.
pub async fn delete_documents(
    db: &MetaDb,
    blobs: &dyn BlobStore,
    document_ids: &[String],
) -> Result<MultiDeleteOutcome> {
    let mut outcome = MultiDeleteOutcome {
        deleted: 0,
        deleted_vectors: 0,
        errors: Vec::new(),
    };
    let mut blob_paths: Vec<String> = Vec::new();

    for id in document_ids {
        let doc = match db.get_document(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                outcome.errors.push(format!("{}: document not found", id));
                continue;
            }
            Err(e) => {
                outcome.errors.push(format!("{}: {}", id, e));
                continue;
            }
        };

        let manifests = match db.ingestions_for_document(id).await {
            Ok(manifests) => manifests,
            Err(e) => {
                outcome.errors.push(format!("{}: {}", id, e));
                continue;
            }
        };

        match db.delete_document_cascade(id, &manifests).await {
            Ok(deleted_vectors) => {
                outcome.deleted += 1;
                outcome.deleted_vectors += deleted_vectors;
                let stored = doc.kind().map(|k| k.has_stored_object()).unwrap_or(false);
                if let (true, Some(source)) = (stored, doc.source_url) {
                    blob_paths.push(source);
                }
            }
            Err(e) => {
                outcome.errors.push(format!("{}: {}", id, e));
            }
        }
    }

    if !blob_paths.is_empty() {
        if let Err(e) = blobs.remove(&blob_paths).await {
            warn!("Batch blob removal failed, objects orphaned: {}", e);
        }
    }

    if outcome.deleted == 0 && !outcome.errors.is_empty() {
        return Err(Error::Deletion(outcome.errors.join("; ")));
    }

    info!(
        deleted = outcome.deleted,
        deleted_vectors = outcome.deleted_vectors,
        failed = outcome.errors.len(),
        "Multi-document deletion finished"
    );
    Ok(outcome)
}
