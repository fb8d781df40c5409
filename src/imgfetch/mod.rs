//! Image fetching and dimension resolution

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod fetcher;
mod resolver;

pub use error::{DownloadError, FailedDownload};
pub use fetcher::{
    with_retries, FetchError, FetchResponse, HttpFetch, HttpFetcher, RetryPolicy, MAX_REDIRECTS,
};
pub use resolver::{read_dimensions, DimensionResolver, Progress, ResolveRun, DEFAULT_CONCURRENCY};
