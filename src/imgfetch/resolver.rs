//! Image dimension resolution
//!
//! Downloads every image without known dimensions with bounded
//! concurrency and reads width/height from the encoded data.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use super::error::{DownloadError, FailedDownload};
use super::fetcher::HttpFetch;
use crate::mets::{is_jpeg, normalize_mimetype, ImageFile};

/// Default number of concurrent downloads
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Progress after one image was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub file_id: String,
    /// Images handled so far, including failed ones
    pub current: usize,
    pub total: usize,
}

#[derive(Debug)]
enum Outcome {
    Resolved {
        width: u32,
        height: u32,
        mimetype: Option<String>,
    },
    Skipped(String),
    Failed(String),
}

#[derive(Debug)]
struct Probe {
    file_id: String,
    url: String,
    mimetype: String,
    outcome: Outcome,
}

/// Resolves missing image dimensions over HTTP
#[derive(Clone)]
pub struct DimensionResolver {
    fetcher: Arc<dyn HttpFetch>,
    concurrency: usize,
    jpeg_only: bool,
}

impl DimensionResolver {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
            jpeg_only: true,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Drop images that are not JPEG instead of measuring them
    pub fn with_jpeg_only(mut self, jpeg_only: bool) -> Self {
        self.jpeg_only = jpeg_only;
        self
    }

    /// Start resolving every file in `files` that lacks dimensions
    ///
    /// Files skipped for their type are removed from `files` as the run
    /// progresses.
    pub fn resolve<'a>(&self, files: &'a mut BTreeMap<String, ImageFile>) -> ResolveRun<'a> {
        let jobs: Vec<(String, String, String)> = files
            .values()
            .filter(|f| !f.has_dimensions())
            .map(|f| (f.id.clone(), f.url.clone(), f.mimetype.clone()))
            .collect();
        let total = jobs.len();

        let fetcher = Arc::clone(&self.fetcher);
        let jpeg_only = self.jpeg_only;
        let probes = stream::iter(jobs)
            .map(move |(file_id, url, mimetype)| {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    let outcome = probe(fetcher.as_ref(), &url, &mimetype, jpeg_only).await;
                    Probe {
                        file_id,
                        url,
                        mimetype,
                        outcome,
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .boxed();

        ResolveRun {
            files,
            probes,
            total,
            completed: 0,
            failures: Vec::new(),
            finished: false,
        }
    }
}

/// An in-progress resolution, driven by [`ResolveRun::next`]
pub struct ResolveRun<'a> {
    files: &'a mut BTreeMap<String, ImageFile>,
    probes: BoxStream<'static, Probe>,
    total: usize,
    completed: usize,
    failures: Vec<FailedDownload>,
    finished: bool,
}

impl<'a> ResolveRun<'a> {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Next progress event
    ///
    /// Failed images produce no event. Once all images are handled, a
    /// single [`DownloadError::Incomplete`] is returned if any failed,
    /// then `None`.
    pub async fn next(&mut self) -> Option<Result<Progress, DownloadError>> {
        while let Some(probe) = self.probes.next().await {
            self.completed += 1;
            match probe.outcome {
                Outcome::Resolved {
                    width,
                    height,
                    mimetype,
                } => {
                    if let Some(file) = self.files.get_mut(&probe.file_id) {
                        file.set_dimensions(width, height);
                        if let Some(mimetype) = mimetype {
                            file.mimetype = mimetype;
                        }
                    }
                }
                Outcome::Skipped(reason) => {
                    tracing::debug!("Skipping {}: {}", probe.url, reason);
                    self.files.remove(&probe.file_id);
                }
                Outcome::Failed(reason) => {
                    tracing::warn!("Could not resolve dimensions of {}: {}", probe.url, reason);
                    self.failures.push(FailedDownload {
                        url: probe.url,
                        mimetype: probe.mimetype,
                        reason,
                    });
                    continue;
                }
            }
            return Some(Ok(Progress {
                file_id: probe.file_id,
                current: self.completed,
                total: self.total,
            }));
        }

        if self.finished || self.failures.is_empty() {
            return None;
        }
        self.finished = true;
        Some(Err(DownloadError::Incomplete {
            failures: std::mem::take(&mut self.failures),
            attempted: self.total,
        }))
    }

    /// Drive the run to completion without observing progress
    pub async fn finish(mut self) -> Result<(), DownloadError> {
        while let Some(event) = self.next().await {
            event?;
        }
        Ok(())
    }
}

async fn probe(fetcher: &dyn HttpFetch, url: &str, mimetype: &str, jpeg_only: bool) -> Outcome {
    if jpeg_only && !is_jpeg(mimetype) {
        return Outcome::Skipped(format!("declared type {} is not JPEG", mimetype));
    }

    let response = match fetcher.get(url).await {
        Ok(response) => response,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    if !response.is_success() {
        return Outcome::Failed(format!("HTTP status {}", response.status));
    }

    let server_mimetype = response.content_type.as_deref().map(normalize_mimetype);
    if let Some(server_mimetype) = &server_mimetype {
        if jpeg_only && !is_jpeg(server_mimetype) {
            return Outcome::Skipped(format!("served as {}", server_mimetype));
        }
    }

    match read_dimensions(&response.body) {
        Ok((width, height)) => Outcome::Resolved {
            width,
            height,
            mimetype: server_mimetype.filter(|m| m.starts_with("image/")),
        },
        Err(e) => Outcome::Failed(format!("Could not read image, likely corrupt data: {}", e)),
    }
}

/// Read width and height from encoded image data without decoding pixels
pub fn read_dimensions(data: &[u8]) -> image::ImageResult<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
}
