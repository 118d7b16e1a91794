//! Vector payload assembly

use serde_json::{Map, Value};

/// Rough token estimate used for diagnostics (4 characters per token)
pub fn estimated_tokens(content: &str) -> usize {
    content.len().div_ceil(4)
}

/// Everything that goes into one vector row's metadata
///
/// Extracted field values come first; system-assigned and diagnostic keys
/// are written afterwards so they win any name collision with a
/// user-defined field.
#[derive(Debug)]
pub struct VectorPayload<'a> {
    pub extracted: &'a Map<String, Value>,
    pub owner_id: &'a str,
    pub document_id: &'a str,
    pub filename: &'a str,
    pub source_kind: &'a str,
    pub source_url: Option<&'a str>,
    pub external_link: Option<&'a str>,
    pub chunk_index: usize,
    pub embedding_attempts: u32,
    pub embedding_error: Option<&'a str>,
    pub estimated_tokens: usize,
}

impl VectorPayload<'_> {
    pub fn build(&self) -> Value {
        let mut map = self.extracted.clone();

        map.insert("owner_id".into(), Value::from(self.owner_id));
        map.insert("document_id".into(), Value::from(self.document_id));
        map.insert("filename".into(), Value::from(self.filename));
        map.insert("source_kind".into(), Value::from(self.source_kind));
        if let Some(url) = self.source_url {
            map.insert("source_url".into(), Value::from(url));
        }
        if let Some(link) = self.external_link {
            map.insert("external_link".into(), Value::from(link));
        }

        map.insert("chunk_index".into(), Value::from(self.chunk_index));
        map.insert("embedding_status".into(), Value::from("success"));
        map.insert(
            "embedding_attempts".into(),
            Value::from(self.embedding_attempts),
        );
        if let Some(err) = self.embedding_error {
            map.insert("embedding_error".into(), Value::from(err));
        }
        map.insert(
            "estimated_tokens".into(),
            Value::from(self.estimated_tokens),
        );

        Value::Object(map)
    }
}
