//! Transcription orchestrator
//!
//! Turns a registered document's source media into transcript text and
//! moves the document to completed. Dispatches on source kind: media goes
//! through the speech service, stored files through text extraction, and
//! YouTube URLs through the transcript fetcher. Any failure inside a flow
//! is recorded on the document as an error stage before it propagates.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{Document, DocumentStage, MetaDb, SourceKind};
use crate::parse::{extract_document_text, DocumentExtractor};
use crate::speech::{has_audio_extension, AudioTranscoder, SpeechJobState, SpeechToText};
use crate::storage::BlobStore;
use crate::transcript::TranscriptFetcher;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Run transcription for one document
#[allow(clippy::too_many_arguments)]
pub async fn transcribe_document(
    db: &MetaDb,
    blobs: &dyn BlobStore,
    speech: &dyn SpeechToText,
    transcoder: Option<&dyn AudioTranscoder>,
    fetcher: &dyn TranscriptFetcher,
    extractor: &dyn DocumentExtractor,
    config: &Config,
    document_id: &str,
) -> Result<()> {
    let doc = db
        .get_document(document_id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(document_id.to_string()))?;

    let result = match doc.kind()? {
        SourceKind::Text => {
            // Pasted text is complete on arrival; rejecting it must not
            // disturb the stage already on the row.
            return Err(Error::InvalidInput(format!(
                "Document {} holds pasted text and needs no transcription",
                doc.id
            )));
        }
        SourceKind::Video | SourceKind::Audio => {
            transcribe_media(db, blobs, speech, transcoder, config, &doc).await
        }
        SourceKind::Document => transcribe_file(db, blobs, extractor, &doc).await,
        SourceKind::Youtube => transcribe_youtube(db, fetcher, &doc).await,
    };

    if let Err(e) = &result {
        let stage = DocumentStage::Error {
            message: e.to_string(),
        };
        if let Err(write_err) = db.set_stage(&doc.id, &stage).await {
            warn!(
                document_id = %doc.id,
                "Failed to record error stage: {}", write_err
            );
        }
    }
    result
}

/// Transcribe uploaded audio or video through the speech service
async fn transcribe_media(
    db: &MetaDb,
    blobs: &dyn BlobStore,
    speech: &dyn SpeechToText,
    transcoder: Option<&dyn AudioTranscoder>,
    config: &Config,
    doc: &Document,
) -> Result<()> {
    db.set_progress(&doc.id, 5).await?;

    let source = doc.source_url.as_deref().ok_or_else(|| {
        Error::InvalidInput(format!("Document {} has no stored media object", doc.id))
    })?;

    let ttl = config.storage.signed_url_ttl_secs;
    let audio_url = if has_audio_extension(&doc.filename) {
        // Already an audio container the service accepts.
        blobs.signed_url(source, ttl).await?
    } else if let Some(transcoder) = transcoder {
        let media = blobs.download(source).await?;
        match transcoder.extract_audio(&media).await? {
            Some(audio) => speech.upload_media(audio).await?,
            None => blobs.signed_url(source, ttl).await?,
        }
    } else {
        blobs.signed_url(source, ttl).await?
    };

    let job_id = speech.submit(&audio_url).await?;
    info!(document_id = %doc.id, job_id = %job_id, "Transcription job submitted");

    for attempt in 0..config.speech.max_poll_attempts {
        let status = speech.status(&job_id).await?;
        match status.status {
            SpeechJobState::Completed => {
                let text = status.text.unwrap_or_default();
                db.save_transcript(&doc.id, &text, Some(job_id)).await?;
                return Ok(());
            }
            SpeechJobState::Error => {
                return Err(Error::Transcription(
                    status
                        .error
                        .unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
            SpeechJobState::Queued | SpeechJobState::Processing => {
                db.set_progress(&doc.id, (10 + attempt).min(95) as u8).await?;
                sleep(Duration::from_millis(config.speech.poll_interval_ms)).await;
            }
        }
    }

    Err(Error::TranscriptionTimeout)
}

/// Extract text from a stored document file
async fn transcribe_file(
    db: &MetaDb,
    blobs: &dyn BlobStore,
    extractor: &dyn DocumentExtractor,
    doc: &Document,
) -> Result<()> {
    db.set_progress(&doc.id, 10).await?;

    let source = doc
        .source_url
        .as_deref()
        .ok_or_else(|| Error::InvalidInput(format!("Document {} has no stored object", doc.id)))?;

    let bytes = blobs.download(source).await?;
    let text = extract_document_text(extractor, &doc.filename, &bytes)?;
    db.save_transcript(&doc.id, &text, None).await?;
    Ok(())
}

/// Fetch a YouTube video's transcript
async fn transcribe_youtube(
    db: &MetaDb,
    fetcher: &dyn TranscriptFetcher,
    doc: &Document,
) -> Result<()> {
    let source = doc
        .source_url
        .as_deref()
        .ok_or_else(|| Error::InvalidInput(format!("Document {} has no video URL", doc.id)))?;

    let raw = fetcher.fetch(source).await?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyTranscript(doc.id.clone()));
    }
    db.save_transcript(&doc.id, trimmed, None).await?;
    Ok(())
}
