//! Vector row storage
//!
//! Vector records live in the same SQLite database as the metadata tables
//! so that deletions spanning both can share a transaction. There are two
//! fixed target tables; `VectorTarget` keeps table selection typed instead
//! of passing table names around as strings.

mod payload;

pub use payload::*;

use crate::error::{Error, Result};
use crate::meta::MetaDb;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Which vector table an ingestion writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorTarget {
    Primary,
    Secondary,
}

impl VectorTarget {
    /// The SQLite table backing this target
    pub fn table(&self) -> &'static str {
        match self {
            VectorTarget::Primary => "vectors_primary",
            VectorTarget::Secondary => "vectors_secondary",
        }
    }
}

impl std::fmt::Display for VectorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorTarget::Primary => write!(f, "primary"),
            VectorTarget::Secondary => write!(f, "secondary"),
        }
    }
}

impl FromStr for VectorTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(VectorTarget::Primary),
            "secondary" => Ok(VectorTarget::Secondary),
            _ => Err(Error::Config(format!("Unknown vector target: {}", s))),
        }
    }
}

/// A stored vector row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VectorRow {
    pub id: String,
    pub content: String,
    pub embedding_json: String,
    pub metadata_json: String,
    pub created_at: String,
}

impl VectorRow {
    pub fn embedding(&self) -> Vec<f32> {
        serde_json::from_str(&self.embedding_json).unwrap_or_default()
    }

    pub fn metadata(&self) -> serde_json::Value {
        serde_json::from_str(&self.metadata_json).unwrap_or(serde_json::Value::Null)
    }
}

/// Handle to the vector tables
#[derive(Clone)]
pub struct VectorStore {
    pool: SqlitePool,
}

impl VectorStore {
    /// Create a store sharing the metadata database's pool
    pub fn new(db: &MetaDb) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Insert one vector row, returning its generated identifier
    pub async fn insert(
        &self,
        target: VectorTarget,
        content: &str,
        embedding: &[f32],
        metadata: &serde_json::Value,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let query = format!(
            "INSERT INTO {} (id, content, embedding_json, metadata_json, created_at) VALUES (?, ?, ?, ?, ?)",
            target.table()
        );
        sqlx::query(&query)
            .bind(&id)
            .bind(content)
            .bind(serde_json::to_string(embedding)?)
            .bind(metadata.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Delete rows by ID, returning how many were removed
    pub async fn delete(&self, target: VectorTarget, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "DELETE FROM {} WHERE id IN ({})",
            target.table(),
            placeholders
        );
        let mut q = sqlx::query(&query);
        for id in ids {
            q = q.bind(id);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete rows whose metadata field equals the given value
    pub async fn delete_where_field(
        &self,
        target: VectorTarget,
        field: &str,
        value: &str,
    ) -> Result<u64> {
        let query = format!(
            "DELETE FROM {} WHERE json_extract(metadata_json, ?) = ?",
            target.table()
        );
        let result = sqlx::query(&query)
            .bind(format!("$.{}", field))
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Get a vector row by ID
    pub async fn get(&self, target: VectorTarget, id: &str) -> Result<Option<VectorRow>> {
        let query = format!("SELECT * FROM {} WHERE id = ?", target.table());
        let row = sqlx::query_as::<_, VectorRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Count rows in a target table
    pub async fn count(&self, target: VectorTarget) -> Result<usize> {
        let query = format!("SELECT COUNT(*) FROM {}", target.table());
        let count: i32 = sqlx::query_scalar(&query).fetch_one(&self.pool).await?;
        Ok(count as usize)
    }
}
