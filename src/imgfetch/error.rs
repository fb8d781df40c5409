//! Image download errors

use serde::Serialize;
use thiserror::Error;

/// A single image whose dimensions could not be determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub url: String,
    pub mimetype: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Could not determine dimensions of {} out of {attempted} images", failures.len())]
    Incomplete {
        failures: Vec<FailedDownload>,
        attempted: usize,
    },
    #[error("No usable images left for {0}")]
    NoImages(String),
}

impl DownloadError {
    /// Images that failed, empty for errors not tied to single downloads
    pub fn failures(&self) -> &[FailedDownload] {
        match self {
            DownloadError::Incomplete { failures, .. } => failures,
            DownloadError::NoImages(_) => &[],
        }
    }
}
