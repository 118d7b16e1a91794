//! Embedding client and per-chunk retry policy
//!
//! The `Embedder` trait is the seam between orchestration and the actual
//! backend. `embed_with_retry` wraps a single chunk's embedding in the
//! bounded retry loop; exhausting retries is not an error at this level,
//! it yields a `ChunkEmbedding::Failed` the caller records and skips.

mod http_backend;

pub use http_backend::HttpEmbedder;

use crate::config::EmbeddingConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A backend that turns text into a fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Expected dimensionality of returned vectors
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Create the configured embedder
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(HttpEmbedder::new(config)?))
}

/// Per-chunk retry policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl From<&EmbeddingConfig> for RetryPolicy {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_ms: config.backoff_ms,
        }
    }
}

/// Outcome of embedding one chunk
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEmbedding {
    Embedded {
        vector: Vec<f32>,
        attempts: u32,
        /// Message from the most recent failed attempt, if any attempt
        /// failed before one succeeded
        last_error: Option<String>,
    },
    Failed {
        attempts: u32,
        error: String,
    },
}

/// Embed one chunk, retrying with linear backoff
///
/// The backoff grows with the attempt number: after failed attempt `n` the
/// loop sleeps `n * backoff_ms` before trying again.
pub async fn embed_with_retry(
    embedder: &dyn Embedder,
    text: &str,
    policy: &RetryPolicy,
) -> ChunkEmbedding {
    let mut last_error: Option<String> = None;

    for attempt in 1..=policy.max_attempts {
        match embedder.embed(text).await {
            Ok(vector) => {
                return ChunkEmbedding::Embedded {
                    vector,
                    attempts: attempt,
                    last_error,
                };
            }
            Err(e) => {
                warn!("Embedding attempt {} failed: {}", attempt, e);
                last_error = Some(e.to_string());
                if attempt < policy.max_attempts {
                    tokio::time::sleep(Duration::from_millis(
                        policy.backoff_ms * attempt as u64,
                    ))
                    .await;
                }
            }
        }
    }

    ChunkEmbedding::Failed {
        attempts: policy.max_attempts,
        error: last_error.unwrap_or_else(|| "Embedding failed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then succeeds
    struct FlakyEmbedder {
        remaining_failures: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl FlakyEmbedder {
        fn new(failures: u32) -> Self {
            Self {
                remaining_failures: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            *self.calls.lock().unwrap() += 1;
            let mut remaining = self.remaining_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Embedding("backend unavailable".to_string()));
            }
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "flaky-test"
        }
    }

    const POLICY: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        backoff_ms: 1,
    };

    #[tokio::test]
    async fn test_first_attempt_success() {
        let embedder = FlakyEmbedder::new(0);
        let outcome = embed_with_retry(&embedder, "chunk", &POLICY).await;
        assert_eq!(
            outcome,
            ChunkEmbedding::Embedded {
                vector: vec![0.1, 0.2, 0.3],
                attempts: 1,
                last_error: None,
            }
        );
        assert_eq!(embedder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_recovers_and_keeps_last_failure_message() {
        let embedder = FlakyEmbedder::new(2);
        let outcome = embed_with_retry(&embedder, "chunk", &POLICY).await;
        match outcome {
            ChunkEmbedding::Embedded {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    last_error.as_deref(),
                    Some("Embedding error: backend unavailable")
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(embedder.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_failure() {
        let embedder = FlakyEmbedder::new(10);
        let outcome = embed_with_retry(&embedder, "chunk", &POLICY).await;
        assert_eq!(
            outcome,
            ChunkEmbedding::Failed {
                attempts: 3,
                error: "Embedding error: backend unavailable".to_string(),
            }
        );
        assert_eq!(embedder.call_count(), 3);
    }
}
