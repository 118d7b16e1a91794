//! Scheduled blob purge
//!
//! Lists stored objects oldest-first and removes everything older than the
//! configured retention window. Objects whose creation timestamp cannot be
//! parsed are kept.

use crate::config::PurgeConfig;
use crate::error::Result;
use crate::storage::BlobStore;
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Result of one purge run
#[derive(Debug, Clone, Serialize)]
pub struct PurgeOutcome {
    /// Objects examined this run
    pub scanned: usize,
    /// Objects removed
    pub deleted: usize,
}

/// Remove stored blobs older than the retention window
pub async fn purge_old_blobs(blobs: &dyn BlobStore, config: &PurgeConfig) -> Result<PurgeOutcome> {
    let objects = blobs.list(config.list_limit).await?;
    let cutoff = Utc::now() - Duration::days(config.retention_days);

    let mut old_paths: Vec<String> = Vec::new();
    for object in &objects {
        match object.created() {
            Some(created) if created < cutoff => old_paths.push(object.name.clone()),
            Some(_) => {}
            None => warn!(
                name = %object.name,
                "Object has no parseable creation time, keeping"
            ),
        }
    }

    if !old_paths.is_empty() {
        blobs.remove(&old_paths).await?;
    }

    let outcome = PurgeOutcome {
        scanned: objects.len(),
        deleted: old_paths.len(),
    };
    info!(
        scanned = outcome.scanned,
        deleted = outcome.deleted,
        retention_days = config.retention_days,
        "Purge finished"
    );
    Ok(outcome)
}
