//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::imgfetch::HttpFetch;
use crate::tasks::{ImportPipeline, JobRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<dyn Store>,
    jobs: JobRegistry,
    pipeline: Arc<ImportPipeline>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, fetcher: Arc<dyn HttpFetch>) -> Self {
        let pipeline = ImportPipeline::new(Arc::clone(&store), fetcher, &config.base_url())
            .with_concurrency(config.import.concurrency)
            .with_dump_dir(config.import.dump_mets.clone());
        let jobs = JobRegistry::with_ttl(config.job_ttl());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                jobs,
                pipeline: Arc::new(pipeline),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Root URL used in generated IIIF ids
    pub fn base_url(&self) -> String {
        self.inner.config.base_url()
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.inner.jobs
    }

    pub fn pipeline(&self) -> Arc<ImportPipeline> {
        Arc::clone(&self.inner.pipeline)
    }
}
