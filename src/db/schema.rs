//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Manifests, one per METS origin URL
CREATE TABLE IF NOT EXISTS manifests (
    id TEXT PRIMARY KEY,
    origin TEXT NOT NULL UNIQUE,
    label TEXT NOT NULL,
    manifest TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_manifests_updated ON manifests(updated_at);

-- Identifiers extracted from the MODS record
CREATE TABLE IF NOT EXISTS identifiers (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    manifest_id TEXT NOT NULL REFERENCES manifests(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_identifiers_manifest ON identifiers(manifest_id);

-- IIIF Image API descriptors
CREATE TABLE IF NOT EXISTS iiif_images (
    id TEXT PRIMARY KEY,
    info TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS manifest_images (
    manifest_id TEXT NOT NULL REFERENCES manifests(id) ON DELETE CASCADE,
    iiif_image_id TEXT NOT NULL REFERENCES iiif_images(id) ON DELETE CASCADE,
    PRIMARY KEY (manifest_id, iiif_image_id)
);

CREATE INDEX IF NOT EXISTS idx_manifest_images_image ON manifest_images(iiif_image_id);

-- Image files with known dimensions, keyed by URL
CREATE TABLE IF NOT EXISTS images (
    url TEXT PRIMARY KEY,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    format TEXT NOT NULL,
    iiif_id TEXT REFERENCES iiif_images(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_images_iiif ON images(iiif_id);

-- Collections form a tree through parent_id
CREATE TABLE IF NOT EXISTS collections (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    parent_id TEXT REFERENCES collections(id)
);

CREATE INDEX IF NOT EXISTS idx_collections_parent ON collections(parent_id);

CREATE TABLE IF NOT EXISTS collection_manifests (
    collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
    manifest_id TEXT NOT NULL REFERENCES manifests(id) ON DELETE CASCADE,
    PRIMARY KEY (collection_id, manifest_id)
);

CREATE INDEX IF NOT EXISTS idx_collection_manifests_manifest ON collection_manifests(manifest_id);
"#;
