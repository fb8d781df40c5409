//! Import job progress
//!
//! The pipeline reports through [`ProgressSink`]; [`JobRegistry`] keeps the
//! state of every job started by this process in memory.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::import::BasicInfo;
use crate::error::AppError;
use crate::imgfetch::FailedDownload;

/// Number of recent completion durations the ETA is averaged over
pub const ETA_WINDOW: usize = 50;

/// Progress of the dimension resolution phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
    pub eta_seconds: f64,
}

/// Receives progress reports, once per resolved file
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, progress: JobProgress);
}

/// Sink that drops every report
pub struct NoopSink;

#[async_trait]
impl ProgressSink for NoopSink {
    async fn report(&self, _progress: JobProgress) {}
}

/// Remaining time estimate from a sliding window of completion durations
#[derive(Debug)]
pub struct EtaEstimator {
    durations: VecDeque<Duration>,
    capacity: usize,
    last: Instant,
}

impl EtaEstimator {
    pub fn new(capacity: usize) -> Self {
        Self {
            durations: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            last: Instant::now(),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.durations.len() == self.capacity {
            self.durations.pop_front();
        }
        self.durations.push_back(duration);
    }

    /// Mean duration times `remaining`, in seconds
    pub fn eta_seconds(&self, remaining: usize) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        let sum: Duration = self.durations.iter().sum();
        let mean = sum.as_secs_f64() / self.durations.len() as f64;
        mean * remaining as f64
    }

    /// Record the time since the previous tick and estimate the rest
    pub fn tick(&mut self, remaining: usize) -> f64 {
        let now = Instant::now();
        self.record(now.duration_since(self.last));
        self.last = now;
        self.eta_seconds(remaining)
    }
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new(ETA_WINDOW)
    }
}

// ============================================================================
// Job Registry
// ============================================================================

/// Lifecycle state of an import job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Started,
    Progress(JobProgress),
    Finished {
        /// `@id` of the imported manifest
        result: String,
    },
    Failed {
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        failures: Vec<FailedDownload>,
    },
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Finished { .. } | JobStatus::Failed { .. })
    }
}

/// An import job as reported to clients
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub mets_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<BasicInfo>,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How long finished and failed jobs stay queryable by default
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(60 * 60);

/// In-memory job table
///
/// Finished and failed jobs are dropped once they are older than the
/// registry's TTL; pruning happens whenever a job is created.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<JobRegistryInner>,
}

struct JobRegistryInner {
    jobs: RwLock<HashMap<Uuid, Job>>,
    ttl: chrono::Duration,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_JOB_TTL)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(JobRegistryInner {
                jobs: RwLock::new(HashMap::new()),
                ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            }),
        }
    }

    /// Drop done jobs last updated before the TTL; returns how many
    pub async fn prune(&self) -> usize {
        let cutoff = Utc::now()
            .checked_sub_signed(self.inner.ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut jobs = self.inner.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.status.is_done() || job.updated_at >= cutoff);
        let pruned = before - jobs.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Expired finished jobs");
        }
        pruned
    }

    /// Register a queued job
    pub async fn create(&self, mets_url: &str, info: Option<BasicInfo>) -> Job {
        self.prune().await;
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            mets_url: mets_url.to_string(),
            info,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
        };

        self.inner.jobs.write().await.insert(job.id, job.clone());
        tracing::info!(job_id = %job.id, mets_url, "Queued import");
        job
    }

    /// Jobs that have not finished yet, oldest first
    pub async fn pending(&self) -> Vec<Job> {
        let jobs = self.inner.jobs.read().await;
        let mut pending: Vec<Job> = jobs
            .values()
            .filter(|job| !job.status.is_done())
            .cloned()
            .collect();
        pending.sort_by_key(|job| job.created_at);
        pending
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.jobs.read().await.get(&id).cloned()
    }

    /// Look up a job by its string id
    pub async fn get_by_str(&self, id: &str) -> Option<Job> {
        let id = Uuid::parse_str(id).ok()?;
        self.get(id).await
    }

    /// Replace the status of a job; unknown ids are ignored
    pub async fn set_status(&self, id: Uuid, status: JobStatus) {
        let mut jobs = self.inner.jobs.write().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = status;
            job.updated_at = Utc::now();
        }
    }

    pub async fn mark_started(&self, id: Uuid) {
        self.set_status(id, JobStatus::Started).await;
    }

    pub async fn mark_finished(&self, id: Uuid, manifest_url: String) {
        tracing::info!(job_id = %id, manifest = %manifest_url, "Import finished");
        self.set_status(id, JobStatus::Finished { result: manifest_url })
            .await;
    }

    pub async fn mark_failed(&self, id: Uuid, error: &AppError) {
        tracing::warn!(job_id = %id, "Import failed: {}", error);
        let failures = match error {
            AppError::Download(e) => e.failures().to_vec(),
            _ => Vec::new(),
        };
        self.set_status(
            id,
            JobStatus::Failed {
                message: error.to_string(),
                failures,
            },
        )
        .await;
    }

    /// Progress sink bound to one job
    pub fn sink(&self, id: Uuid) -> JobSink {
        JobSink {
            registry: self.clone(),
            id,
        }
    }
}

/// [`ProgressSink`] writing into a [`JobRegistry`]
pub struct JobSink {
    registry: JobRegistry,
    id: Uuid,
}

#[async_trait]
impl ProgressSink for JobSink {
    async fn report(&self, progress: JobProgress) {
        self.registry
            .set_status(self.id, JobStatus::Progress(progress))
            .await;
    }
}
