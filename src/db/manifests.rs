//! Manifest and identifier database operations

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;

/// Manifest record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ManifestRow {
    pub id: String,
    pub origin: String,
    pub label: String,
    /// Manifest JSON as stored
    pub manifest: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ManifestRow {
    pub fn document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.manifest)?)
    }
}

/// Manifest repository
pub struct ManifestRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ManifestRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ManifestRow>> {
        let row = sqlx::query_as::<_, ManifestRow>(
            r#"
            SELECT id, origin, label, manifest, created_at, updated_at
            FROM manifests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    pub async fn by_origin(&self, origin: &str) -> Result<Option<ManifestRow>> {
        let row = sqlx::query_as::<_, ManifestRow>(
            r#"
            SELECT id, origin, label, manifest, created_at, updated_at
            FROM manifests
            WHERE origin = ?
            "#,
        )
        .bind(origin)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Most recently updated manifests first
    pub async fn recent(&self, offset: i64, limit: i64) -> Result<Vec<ManifestRow>> {
        let rows = sqlx::query_as::<_, ManifestRow>(
            r#"
            SELECT id, origin, label, manifest, created_at, updated_at
            FROM manifests
            ORDER BY updated_at DESC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Manifest id registered for an identifier
    pub async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT manifest_id
            FROM identifiers
            WHERE id = ?
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }
}

/// Insert a manifest or update the one with the same origin
pub(crate) async fn upsert_manifest(
    conn: &mut SqliteConnection,
    id: &str,
    origin: &str,
    label: &str,
    manifest: &str,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO manifests (id, origin, label, manifest, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(origin) DO UPDATE SET
            label = excluded.label,
            manifest = excluded.manifest,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(origin)
    .bind(label)
    .bind(manifest)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Register identifiers for a manifest, keeping existing registrations
pub(crate) async fn insert_identifiers(
    conn: &mut SqliteConnection,
    manifest_id: &str,
    identifiers: &BTreeMap<String, String>,
) -> Result<()> {
    for (kind, value) in identifiers {
        sqlx::query(
            r#"
            INSERT INTO identifiers (id, type, manifest_id)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(value)
        .bind(kind)
        .bind(manifest_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
