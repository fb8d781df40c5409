//! Storage interface used by the import pipeline and the HTTP layer

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::collections::{add_to_collection, ChildCount, CollectionRepository, CollectionRow};
use super::images::{delete_orphaned_iiif_images, unlink_manifest_images, upsert_iiif_image, CachedImage, ImageRepository};
use super::manifests::{insert_identifiers, upsert_manifest, ManifestRepository, ManifestRow};
use crate::error::Result;
use crate::iiif::{IiifImage, ImageInfo, ImageVariant};
use crate::mets::ImageFile;

/// Everything written by one successful import
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub manifest_id: String,
    pub origin: String,
    pub label: String,
    pub manifest: serde_json::Value,
    /// Identifier type -> value
    pub identifiers: BTreeMap<String, String>,
    pub images: Vec<IiifImage>,
    pub collection_id: Option<String>,
}

/// Persistence for manifests, images and collections
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_manifest_by_origin(&self, origin: &str) -> Result<Option<ManifestRow>>;

    async fn get_manifest(&self, id: &str) -> Result<Option<ManifestRow>>;

    async fn recent_manifests(&self, offset: i64, limit: i64) -> Result<Vec<ManifestRow>>;

    async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>>;

    /// Dimension cache read
    async fn find_image_by_url(&self, url: &str) -> Result<Option<CachedImage>>;

    /// Dimension cache write for every file with known dimensions
    async fn upsert_images(&self, files: &[ImageFile]) -> Result<usize>;

    /// Write an import atomically, then delete orphaned IIIF images
    async fn commit_import(&self, record: &ImportRecord) -> Result<()>;

    async fn get_image_info(&self, iiif_id: &str) -> Result<Option<ImageInfo>>;

    async fn image_variants(&self, iiif_id: &str) -> Result<Vec<ImageVariant>>;

    async fn get_collection(&self, id: &str) -> Result<Option<CollectionRow>>;

    async fn upsert_collection(&self, collection: &CollectionRow) -> Result<()>;

    async fn manifest_collections(&self, manifest_id: &str) -> Result<Vec<CollectionRow>>;

    /// `None` counts all manifests
    async fn count_manifests(&self, collection_id: Option<&str>) -> Result<i64>;

    async fn list_manifests(
        &self,
        collection_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ManifestRow>>;

    async fn child_collection_counts(&self, parent_id: Option<&str>) -> Result<Vec<ChildCount>>;
}

/// [`Store`] backed by SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_manifest_by_origin(&self, origin: &str) -> Result<Option<ManifestRow>> {
        ManifestRepository::new(&self.pool).by_origin(origin).await
    }

    async fn get_manifest(&self, id: &str) -> Result<Option<ManifestRow>> {
        ManifestRepository::new(&self.pool).get(id).await
    }

    async fn recent_manifests(&self, offset: i64, limit: i64) -> Result<Vec<ManifestRow>> {
        ManifestRepository::new(&self.pool).recent(offset, limit).await
    }

    async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>> {
        ManifestRepository::new(&self.pool)
            .resolve_identifier(identifier)
            .await
    }

    async fn find_image_by_url(&self, url: &str) -> Result<Option<CachedImage>> {
        ImageRepository::new(&self.pool).by_url(url).await
    }

    async fn upsert_images(&self, files: &[ImageFile]) -> Result<usize> {
        ImageRepository::new(&self.pool).upsert_files(files).await
    }

    async fn commit_import(&self, record: &ImportRecord) -> Result<()> {
        let manifest = serde_json::to_string(&record.manifest)?;
        let mut tx = self.pool.begin().await?;

        upsert_manifest(
            &mut tx,
            &record.manifest_id,
            &record.origin,
            &record.label,
            &manifest,
        )
        .await?;
        insert_identifiers(&mut tx, &record.manifest_id, &record.identifiers).await?;

        unlink_manifest_images(&mut tx, &record.manifest_id).await?;
        for image in &record.images {
            upsert_iiif_image(&mut tx, &record.manifest_id, image).await?;
        }

        if let Some(collection_id) = &record.collection_id {
            add_to_collection(&mut tx, collection_id, &record.manifest_id).await?;
        }

        let orphans = delete_orphaned_iiif_images(&mut tx).await?;
        tx.commit().await?;

        tracing::info!(
            manifest_id = %record.manifest_id,
            images = record.images.len(),
            orphans_removed = orphans,
            "Committed import"
        );

        Ok(())
    }

    async fn get_image_info(&self, iiif_id: &str) -> Result<Option<ImageInfo>> {
        ImageRepository::new(&self.pool).info(iiif_id).await
    }

    async fn image_variants(&self, iiif_id: &str) -> Result<Vec<ImageVariant>> {
        ImageRepository::new(&self.pool).variants(iiif_id).await
    }

    async fn get_collection(&self, id: &str) -> Result<Option<CollectionRow>> {
        CollectionRepository::new(&self.pool).get(id).await
    }

    async fn upsert_collection(&self, collection: &CollectionRow) -> Result<()> {
        CollectionRepository::new(&self.pool).upsert(collection).await
    }

    async fn manifest_collections(&self, manifest_id: &str) -> Result<Vec<CollectionRow>> {
        CollectionRepository::new(&self.pool)
            .for_manifest(manifest_id)
            .await
    }

    async fn count_manifests(&self, collection_id: Option<&str>) -> Result<i64> {
        CollectionRepository::new(&self.pool)
            .count_manifests(collection_id)
            .await
    }

    async fn list_manifests(
        &self,
        collection_id: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ManifestRow>> {
        CollectionRepository::new(&self.pool)
            .list_manifests(collection_id, offset, limit)
            .await
    }

    async fn child_collection_counts(&self, parent_id: Option<&str>) -> Result<Vec<ChildCount>> {
        CollectionRepository::new(&self.pool)
            .child_counts(parent_id)
            .await
    }
}
