//! Web crawler that feeds a shared inverted index.

pub mod crawler;
pub mod fetch;
pub mod html;
pub mod visited;

pub use crate::crawler::WebCrawler;
pub use fetch::{Fetcher, HttpFetcher};
pub use visited::VisitedSet;

use anyhow::{Context, Result};
use index_core::{ThreadSafeIndex, WorkerPool};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Most distinct pages to visit, seed included.
    pub max_pages: usize,
    pub max_redirects: usize,
    /// Characters of cleaned text kept as the page preview.
    pub snippet_len: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 1,
            max_redirects: 3,
            snippet_len: 400,
            timeout: Duration::from_secs(12),
            user_agent: "index-crawler/0.1".to_string(),
        }
    }
}

impl CrawlConfig {
    pub fn http_fetcher(&self) -> Result<HttpFetcher> {
        HttpFetcher::new(&self.user_agent, self.max_redirects, self.timeout)
    }
}

/// Crawls the web from `seed` over HTTP into `index`, blocking until done.
pub fn crawl_url(
    seed: &str,
    config: &CrawlConfig,
    index: &Arc<ThreadSafeIndex>,
    pool: &Arc<WorkerPool>,
) -> Result<()> {
    let seed = Url::parse(seed).with_context(|| format!("invalid url {seed}"))?;
    let fetcher = config.http_fetcher()?;
    WebCrawler::new(Arc::clone(index), Arc::clone(pool), fetcher, config).crawl(seed)
}
