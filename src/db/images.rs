//! Image cache and IIIF image database operations

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::iiif::{IiifImage, ImageInfo, ImageVariant};
use crate::mets::ImageFile;

/// Image file with known dimensions
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CachedImage {
    pub url: String,
    pub width: i64,
    pub height: i64,
    pub format: String,
    pub iiif_id: Option<String>,
}

impl CachedImage {
    /// Copy cached dimensions and type onto a parsed file
    pub fn apply_to(&self, file: &mut ImageFile) {
        if let (Ok(width), Ok(height)) = (u32::try_from(self.width), u32::try_from(self.height)) {
            file.set_dimensions(width, height);
            file.mimetype = self.format.clone();
        }
    }

    fn variant(self) -> Option<ImageVariant> {
        Some(ImageVariant {
            url: self.url,
            width: u32::try_from(self.width).ok()?,
            height: u32::try_from(self.height).ok()?,
            format: self.format,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct IiifImageRow {
    id: String,
    info: String,
}

/// Image repository
pub struct ImageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ImageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Dimension cache lookup
    pub async fn by_url(&self, url: &str) -> Result<Option<CachedImage>> {
        let image = sqlx::query_as::<_, CachedImage>(
            r#"
            SELECT url, width, height, format, iiif_id
            FROM images
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        Ok(image)
    }

    /// Store dimensions of every file that has them
    pub async fn upsert_files(&self, files: &[ImageFile]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut stored = 0;
        for file in files {
            if let Some((width, height)) = file.dimensions() {
                upsert_image(&mut tx, &file.url, width, height, &file.mimetype, None).await?;
                stored += 1;
            }
        }
        tx.commit().await?;

        Ok(stored)
    }

    pub async fn info(&self, iiif_id: &str) -> Result<Option<ImageInfo>> {
        let row = sqlx::query_as::<_, IiifImageRow>(
            r#"
            SELECT id, info
            FROM iiif_images
            WHERE id = ?
            "#,
        )
        .bind(iiif_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                tracing::trace!("Loaded info.json for {}", row.id);
                Ok(Some(serde_json::from_str(&row.info)?))
            }
            None => Ok(None),
        }
    }

    /// Image files backing a IIIF image
    pub async fn variants(&self, iiif_id: &str) -> Result<Vec<ImageVariant>> {
        let rows = sqlx::query_as::<_, CachedImage>(
            r#"
            SELECT url, width, height, format, iiif_id
            FROM images
            WHERE iiif_id = ?
            ORDER BY width DESC, url ASC
            "#,
        )
        .bind(iiif_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(CachedImage::variant).collect())
    }
}

pub(crate) async fn upsert_image(
    conn: &mut SqliteConnection,
    url: &str,
    width: u32,
    height: u32,
    format: &str,
    iiif_id: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO images (url, width, height, format, iiif_id)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            width = excluded.width,
            height = excluded.height,
            format = excluded.format,
            iiif_id = COALESCE(excluded.iiif_id, images.iiif_id)
        "#,
    )
    .bind(url)
    .bind(i64::from(width))
    .bind(i64::from(height))
    .bind(format)
    .bind(iiif_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Store a IIIF image with its variants and link it to a manifest
pub(crate) async fn upsert_iiif_image(
    conn: &mut SqliteConnection,
    manifest_id: &str,
    image: &IiifImage,
) -> Result<()> {
    let info = serde_json::to_string(&image.info)?;
    sqlx::query(
        r#"
        INSERT INTO iiif_images (id, info)
        VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET info = excluded.info
        "#,
    )
    .bind(&image.id)
    .bind(&info)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO manifest_images (manifest_id, iiif_image_id)
        VALUES (?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(manifest_id)
    .bind(&image.id)
    .execute(&mut *conn)
    .await?;

    for variant in &image.variants {
        upsert_image(
            conn,
            &variant.url,
            variant.width,
            variant.height,
            &variant.format,
            Some(&image.id),
        )
        .await?;
    }

    Ok(())
}

pub(crate) async fn unlink_manifest_images(conn: &mut SqliteConnection, manifest_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM manifest_images WHERE manifest_id = ?")
        .bind(manifest_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Delete IIIF images no manifest links to, returning how many were removed
pub(crate) async fn delete_orphaned_iiif_images(conn: &mut SqliteConnection) -> Result<u64> {
    sqlx::query(
        r#"
        UPDATE images SET iiif_id = NULL
        WHERE iiif_id IS NOT NULL
          AND iiif_id NOT IN (SELECT iiif_image_id FROM manifest_images)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query(
        r#"
        DELETE FROM iiif_images
        WHERE id NOT IN (SELECT iiif_image_id FROM manifest_images)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
