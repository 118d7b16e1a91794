//! Pipeline orchestrators
//!
//! Each orchestrator is a plain async function the CLI drives directly;
//! a job runner wrapping these in managed steps stays external. They
//! compose the collaborator traits, so tests script every dependency.

pub mod delete;
pub mod ingest;
pub mod link;
pub mod purge;
pub mod register;
pub mod status;
pub mod transcribe;

#[cfg(test)]
pub(crate) mod testing;

pub use delete::{delete_document, delete_documents, DeleteOutcome, MultiDeleteOutcome};
pub use ingest::{ingest_document, IngestOutcome, IngestRequest};
pub use link::{create_link, delete_link, LinkOutcome};
pub use purge::{purge_old_blobs, PurgeOutcome};
pub use register::{register_file, register_text, register_youtube};
pub use status::{
    document_status, global_status, print_document_status, print_status, DocumentStatusInfo,
    StatusInfo,
};
pub use transcribe::transcribe_document;
