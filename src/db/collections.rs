//! Collection database operations

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use super::ManifestRow;
use crate::error::{AppError, Result};

/// Collection record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionRow {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
}

/// Number of manifests in a child collection
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChildCount {
    pub id: String,
    pub label: String,
    pub manifest_count: i64,
}

/// Collection repository
///
/// `None` as collection id stands for the index collection of all
/// manifests.
pub struct CollectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CollectionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CollectionRow>> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT id, label, parent_id
            FROM collections
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a collection or update its label and parent
    pub async fn upsert(&self, collection: &CollectionRow) -> Result<()> {
        if let Some(parent) = &collection.parent_id {
            if self.get(parent).await?.is_none() {
                return Err(AppError::NotFound(format!("Collection {}", parent)));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO collections (id, label, parent_id)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                parent_id = excluded.parent_id
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.label)
        .bind(&collection.parent_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Collections a manifest belongs to
    pub async fn for_manifest(&self, manifest_id: &str) -> Result<Vec<CollectionRow>> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT c.id, c.label, c.parent_id
            FROM collections c
            JOIN collection_manifests cm ON cm.collection_id = c.id
            WHERE cm.manifest_id = ?
            ORDER BY c.label ASC
            "#,
        )
        .bind(manifest_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_manifests(&self, collection_id: Option<&str>) -> Result<i64> {
        let count = match collection_id {
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM manifests")
                    .fetch_one(self.pool)
                    .await?
            }
            Some(id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM collection_manifests WHERE collection_id = ?",
                )
                .bind(id)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(count)
    }

    /// One page of manifests in insertion order
    pub async fn list_manifests(
        &self,
        collection_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ManifestRow>> {
        let rows = match collection_id {
            None => {
                sqlx::query_as::<_, ManifestRow>(
                    r#"
                    SELECT id, origin, label, manifest, created_at, updated_at
                    FROM manifests
                    ORDER BY created_at ASC, id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query_as::<_, ManifestRow>(
                    r#"
                    SELECT m.id, m.origin, m.label, m.manifest, m.created_at, m.updated_at
                    FROM manifests m
                    JOIN collection_manifests cm ON cm.manifest_id = m.id
                    WHERE cm.collection_id = ?
                    ORDER BY m.created_at ASC, m.id ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    /// Manifest counts of the direct children of a collection, in one query
    ///
    /// Children of the index collection are the collections without parent.
    pub async fn child_counts(&self, parent_id: Option<&str>) -> Result<Vec<ChildCount>> {
        let rows = sqlx::query_as::<_, ChildCount>(
            r#"
            SELECT c.id, c.label, COUNT(cm.manifest_id) AS manifest_count
            FROM collections c
            LEFT JOIN collection_manifests cm ON cm.collection_id = c.id
            WHERE c.parent_id IS ?
            GROUP BY c.id, c.label
            ORDER BY c.label ASC
            "#,
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

/// Add a manifest to an existing collection
pub(crate) async fn add_to_collection(
    conn: &mut SqliteConnection,
    collection_id: &str,
    manifest_id: &str,
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM collections WHERE id = ?")
        .bind(collection_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound(format!(
            "Could not find collection with id {}",
            collection_id
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO collection_manifests (collection_id, manifest_id)
        VALUES (?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(collection_id)
    .bind(manifest_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
