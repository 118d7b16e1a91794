//! SQLite schema definition

/// SQL schema for the metadata database
pub const SCHEMA_SQL: &str = r#"
-- Documents: registered uploads, pasted text, and YouTube captures
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    filename TEXT NOT NULL,
    source_kind TEXT NOT NULL,
    source_url TEXT,
    transcript_text TEXT,
    status TEXT NOT NULL,
    stage_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Ingestions: manifest of vectors written for a document
CREATE TABLE IF NOT EXISTS ingestions (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    document_id TEXT NOT NULL REFERENCES documents(id),
    vector_ids_json TEXT NOT NULL,
    chunk_count INTEGER NOT NULL,
    target_table TEXT NOT NULL,
    external_link TEXT,
    created_at TEXT NOT NULL
);

-- Metadata fields: the extraction vocabulary
CREATE TABLE IF NOT EXISTS metadata_fields (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    example TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(owner_id, name)
);

-- Links: standalone curated references
CREATE TABLE IF NOT EXISTS links (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT,
    embedding_json TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Vector rows, one table per target
CREATE TABLE IF NOT EXISTS vectors_primary (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    embedding_json TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vectors_secondary (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    embedding_json TEXT NOT NULL,
    metadata_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
CREATE INDEX IF NOT EXISTS idx_ingestions_document ON ingestions(document_id);
CREATE INDEX IF NOT EXISTS idx_fields_owner ON metadata_fields(owner_id);
CREATE INDEX IF NOT EXISTS idx_links_owner ON links(owner_id);
"#;
