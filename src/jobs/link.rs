//! Curated link management
//!
//! Links are small named references kept alongside documents. Creating one
//! embeds its name and description once (no retry), stores the row, and
//! mirrors a searchable vector into the primary table. The mirror is
//! best-effort: a link without a vector is still usable and listable.

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::meta::{LinkRecord, MetaDb};
use crate::store::{VectorStore, VectorTarget};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

/// Result of creating a link
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutcome {
    pub link_id: String,
    /// The mirrored vector row, when the insert succeeded
    pub vector_id: Option<String>,
}

/// Create a link and mirror it into the primary vector table
pub async fn create_link(
    db: &MetaDb,
    store: &VectorStore,
    embedder: &dyn Embedder,
    owner_id: &str,
    name: &str,
    url: &str,
    description: Option<&str>,
) -> Result<LinkOutcome> {
    if Url::parse(url).is_err() {
        return Err(Error::InvalidInput(format!("Invalid URL: {}", url)));
    }

    let embed_input = match description {
        Some(d) => format!("{} {}", name, d),
        None => name.to_string(),
    };
    let embedding = embedder.embed(&embed_input).await?;

    let mut link = LinkRecord::new(
        owner_id.to_string(),
        name.to_string(),
        url.to_string(),
        description.map(String::from),
    );
    link.embedding_json = Some(serde_json::to_string(&embedding)?);
    db.insert_link(&link).await?;

    let mut content = format!("Link: {}\n", name);
    if let Some(d) = description {
        content.push_str(&format!("Description: {}\n", d));
    }
    content.push_str(&format!("URL: {}", url));

    let metadata = json!({
        "link_id": link.id,
        "link_name": name,
        "link_url": url,
        "source_kind": "link",
        "owner_id": owner_id,
    });

    let vector_id = match store
        .insert(VectorTarget::Primary, &content, &embedding, &metadata)
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(link_id = %link.id, "Vector mirror failed, link kept: {}", e);
            None
        }
    };

    info!(link_id = %link.id, name, "Link created");
    Ok(LinkOutcome {
        link_id: link.id,
        vector_id,
    })
}

/// Delete a link and its mirrored vector
pub async fn delete_link(db: &MetaDb, store: &VectorStore, link_id: &str) -> Result<()> {
    let link = db
        .get_link(link_id)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("Link not found: {}", link_id)))?;

    db.delete_link(&link.id).await?;

    if let Err(e) = store
        .delete_where_field(VectorTarget::Primary, "link_id", &link.id)
        .await
    {
        warn!(link_id = %link.id, "Mirrored vector removal failed: {}", e);
    }

    info!(link_id = %link.id, "Link deleted");
    Ok(())
}
