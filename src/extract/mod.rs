//! Structured metadata extraction
//!
//! Sends a document excerpt plus the owner's field vocabulary to the
//! extraction service and gets back a map of field name to value. Fields
//! the service cannot find in the text are simply absent from the result.

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::meta::MetadataFieldDef;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// How much of a document the ingestion flow offers to the extractor
pub const EXTRACTION_EXCERPT_CHARS: usize = 20_000;

/// One field the extractor should look for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl From<&MetadataFieldDef> for FieldSpec {
    fn from(def: &MetadataFieldDef) -> Self {
        Self {
            name: def.name.clone(),
            example: def.example.clone(),
        }
    }
}

/// A service that pulls structured field values out of free text
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, fields: &[FieldSpec], text: &str) -> Result<Map<String, Value>>;
}

/// Take the first `max_chars` characters of a document
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExtractRequest<'a> {
    fields: &'a [FieldSpec],
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExtractResponse {
    Wrapped { values: Map<String, Value> },
    Bare(Map<String, Value>),
}

impl ExtractResponse {
    fn into_values(self) -> Map<String, Value> {
        match self {
            ExtractResponse::Wrapped { values } => values,
            ExtractResponse::Bare(values) => values,
        }
    }
}

/// Extractor backed by an HTTP service
pub struct HttpMetadataExtractor {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpMetadataExtractor {
    pub fn new(config: &ExtractionConfig, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid extraction service URL: {}", e)))
    }
}

#[async_trait]
impl MetadataExtractor for HttpMetadataExtractor {
    async fn extract(&self, fields: &[FieldSpec], text: &str) -> Result<Map<String, Value>> {
        let url = self.endpoint("/v1/extract")?;
        let request = ExtractRequest { fields, text };

        let mut builder = self.client.post(url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Extraction(e.to_string()))?;

        let parsed: ExtractResponse = response.json().await?;
        Ok(parsed.into_values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> ExtractionConfig {
        ExtractionConfig {
            base_url: url.to_string(),
            api_key_env: "TEST_EXTRACTION_KEY".to_string(),
            timeout_secs: 5,
        }
    }

    fn field(name: &str) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            example: None,
        }
    }

    #[tokio::test]
    async fn test_extract_returns_field_map() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": {"author": "Jane Doe", "topic": "storage"}
            })))
            .mount(&server)
            .await;

        let extractor =
            HttpMetadataExtractor::new(&test_config(&server.uri()), Some("secret".to_string()))
                .unwrap();
        let values = extractor
            .extract(&[field("author"), field("topic")], "by Jane Doe, on storage")
            .await
            .unwrap();

        assert_eq!(values["author"], "Jane Doe");
        assert_eq!(values["topic"], "storage");
    }

    #[tokio::test]
    async fn test_bare_map_response_accepted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .and(body_partial_json(json!({"fields": [{"name": "author"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"author": "Someone"})))
            .mount(&server)
            .await;

        let extractor = HttpMetadataExtractor::new(&test_config(&server.uri()), None).unwrap();
        let values = extractor.extract(&[field("author")], "text").await.unwrap();
        assert_eq!(values["author"], "Someone");
    }

    #[tokio::test]
    async fn test_service_error_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/extract"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let extractor = HttpMetadataExtractor::new(&test_config(&server.uri()), None).unwrap();
        assert!(extractor.extract(&[field("author")], "text").await.is_err());
    }

    #[test]
    fn test_excerpt_char_boundaries() {
        assert_eq!(excerpt("hello", 10), "hello");
        assert_eq!(excerpt("hello", 3), "hel");
        // Multibyte characters count as one each
        let s = "ééééé";
        assert_eq!(excerpt(s, 2), "éé");
        assert_eq!(excerpt(s, 5), s);
    }
}
