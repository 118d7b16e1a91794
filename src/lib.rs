//! scrivener: transcription and ingestion pipeline for a personal
//! document corpus
//!
//! Documents arrive as uploads, pasted text, or YouTube URLs. The
//! transcription jobs turn each source into text; the ingestion job chunks
//! that text, extracts configured metadata fields, embeds each chunk, and
//! writes vector rows plus a tracking manifest used later for exact
//! deletion. All external services sit behind collaborator traits.

pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod meta;
pub mod parse;
pub mod speech;
pub mod storage;
pub mod store;
pub mod transcript;

pub use error::{Error, Result};
