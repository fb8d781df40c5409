//! METS import pipeline
//!
//! Fetches a METS document, resolves the dimensions of its images, builds
//! the IIIF manifest and commits everything in one transaction.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::progress::{EtaEstimator, Job, JobProgress, JobRegistry, ProgressSink};
use crate::db::{ImportRecord, Store};
use crate::error::Result;
use crate::iiif::{build_image_infos, build_manifest, make_label};
use crate::imgfetch::{DimensionResolver, DownloadError, HttpFetch, DEFAULT_CONCURRENCY};
use crate::mets::{self, is_jpeg, Document, ImageFile};

/// Preview of a document, returned when its import is queued
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicInfo {
    pub label: String,
    pub thumbnail: Option<String>,
    pub logo: Option<String>,
    pub owner: String,
}

impl BasicInfo {
    pub fn from_document(doc: &Document) -> Self {
        let thumbnail = doc
            .physical_items
            .iter()
            .flat_map(|item| doc.files_of(item))
            .find(|file| is_jpeg(&file.mimetype))
            .map(|file| file.url.clone());

        Self {
            label: make_label(&doc.metadata),
            thumbnail,
            logo: doc.metadata.logo.clone(),
            owner: doc.metadata.attribution.clone(),
        }
    }
}

/// Path-safe manifest id derived from a document identifier
pub fn manifest_id_for(primary_id: &str) -> String {
    primary_id.replace('/', "_")
}

pub struct ImportPipeline {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
    concurrency: usize,
    dump_dir: Option<PathBuf>,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn HttpFetch>, base_url: &str) -> Self {
        Self {
            store,
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            dump_dir: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Write every fetched METS document into `dir`
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// Fetch and parse a METS document, returning the raw body with it
    pub async fn fetch_document(&self, mets_url: &str) -> Result<(Vec<u8>, Document)> {
        let response = self.fetcher.get(mets_url).await?.error_for_status(mets_url)?;
        let doc = mets::parse(&mets::decode(&response.body)?, Some(mets_url))?;
        Ok((response.body, doc))
    }

    pub async fn preview(&self, mets_url: &str) -> Result<BasicInfo> {
        let (_, doc) = self.fetch_document(mets_url).await?;
        Ok(BasicInfo::from_document(&doc))
    }

    /// Import the document at `mets_url`, returning the manifest `@id`
    pub async fn import(
        &self,
        mets_url: &str,
        collection_id: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<String> {
        let (raw, mut doc) = self.fetch_document(mets_url).await?;
        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!("{}.xml", manifest_id_for(&doc.primary_id)));
            tokio::fs::write(&path, &raw).await?;
            tracing::debug!("Wrote METS to {}", path.display());
        }

        let mut cached = 0;
        for file in doc.files.values_mut() {
            if let Some(image) = self.store.find_image_by_url(&file.url).await? {
                image.apply_to(file);
                cached += 1;
            }
        }
        tracing::info!(
            mets_url,
            files = doc.files.len(),
            cached,
            "Resolving image dimensions"
        );

        let failure = self.resolve_dimensions(&mut doc, sink).await;
        let resolved: Vec<ImageFile> = doc
            .files
            .values()
            .filter(|file| file.has_dimensions())
            .cloned()
            .collect();
        self.store.upsert_images(&resolved).await?;
        if let Some(error) = failure {
            return Err(error.into());
        }
        if doc.files.is_empty() {
            return Err(DownloadError::NoImages(mets_url.to_string()).into());
        }

        let manifest_id = self.choose_manifest_id(mets_url, &doc).await?;
        let manifest = build_manifest(&manifest_id, &doc, &self.base_url)?;
        let record = ImportRecord {
            manifest_id: manifest_id.clone(),
            origin: mets_url.to_string(),
            label: manifest.label.clone(),
            manifest: serde_json::to_value(&manifest)?,
            identifiers: doc.identifiers.clone(),
            images: build_image_infos(&doc, &self.base_url),
            collection_id: collection_id.map(str::to_string),
        };
        self.store.commit_import(&record).await?;

        tracing::info!(
            manifest_id = %manifest_id,
            canvases = manifest.sequences.first().map_or(0, |s| s.canvases.len()),
            "Imported manifest"
        );
        Ok(manifest.id)
    }

    /// Run the resolver, reporting progress; the aggregated failure is
    /// returned rather than raised so dimensions can be saved first
    async fn resolve_dimensions(&self, doc: &mut Document, sink: &dyn ProgressSink) -> Option<DownloadError> {
        let resolver = DimensionResolver::new(Arc::clone(&self.fetcher)).with_concurrency(self.concurrency);
        let mut eta = EtaEstimator::default();
        let mut run = resolver.resolve(&mut doc.files);
        let mut failure = None;

        while let Some(event) = run.next().await {
            match event {
                Ok(progress) => {
                    tracing::trace!(
                        file_id = %progress.file_id,
                        current = progress.current,
                        total = progress.total,
                        "Resolved image"
                    );
                    let eta_seconds = eta.tick(progress.total - progress.current);
                    sink.report(JobProgress {
                        current: progress.current,
                        total: progress.total,
                        eta_seconds,
                    })
                    .await;
                }
                Err(error) => failure = Some(error),
            }
        }
        failure
    }

    /// Reuse the id of an earlier import of the same URL; otherwise take
    /// the document identifier unless another origin already owns it
    async fn choose_manifest_id(&self, mets_url: &str, doc: &Document) -> Result<String> {
        if let Some(existing) = self.store.find_manifest_by_origin(mets_url).await? {
            return Ok(existing.id);
        }
        let candidate = manifest_id_for(&doc.primary_id);
        if self.store.get_manifest(&candidate).await?.is_some() {
            let fresh = Uuid::new_v4().simple().to_string();
            tracing::warn!(
                "Manifest id {} is taken by another origin, using {}",
                candidate,
                fresh
            );
            return Ok(fresh);
        }
        Ok(candidate)
    }
}

/// Register an import job and run it in the background
pub async fn spawn_import(
    pipeline: Arc<ImportPipeline>,
    jobs: JobRegistry,
    mets_url: String,
    collection_id: Option<String>,
    info: Option<BasicInfo>,
) -> Job {
    let job = jobs.create(&mets_url, info).await;
    let id = job.id;

    tokio::spawn(async move {
        jobs.mark_started(id).await;
        let sink = jobs.sink(id);
        match pipeline.import(&mets_url, collection_id.as_deref(), &sink).await {
            Ok(manifest_url) => jobs.mark_finished(id, manifest_url).await,
            Err(e) => jobs.mark_failed(id, &e).await,
        }
    });

    job
}
