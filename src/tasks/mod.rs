//! Import jobs

mod import;
mod progress;

pub use import::{manifest_id_for, spawn_import, BasicInfo, ImportPipeline};
pub use progress::{
    EtaEstimator, Job, JobProgress, JobRegistry, JobSink, JobStatus, NoopSink, ProgressSink,
    DEFAULT_JOB_TTL, ETA_WINDOW,
};
