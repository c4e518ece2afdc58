use crate::fetch::Fetcher;
use crate::html::{normalize, Page};
use crate::visited::VisitedSet;
use crate::CrawlConfig;
use anyhow::Result;
use index_core::{tokenizer, InvertedIndex, PoolError, Spawner, ThreadSafeIndex, WorkerPool};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

struct CrawlState<F> {
    fetcher: F,
    index: Arc<ThreadSafeIndex>,
    visited: VisitedSet,
    spawner: Spawner,
    snippet_len: usize,
}

/// Breadth-wise crawler that indexes every page it admits into a shared
/// index. Each page is one pool task; tasks submit further tasks for the
/// links they admit, and the crawl ends when the pool drains.
pub struct WebCrawler<F> {
    pool: Arc<WorkerPool>,
    state: Arc<CrawlState<F>>,
}

impl<F: Fetcher> WebCrawler<F> {
    pub fn new(index: Arc<ThreadSafeIndex>, pool: Arc<WorkerPool>, fetcher: F, config: &CrawlConfig) -> Self {
        let state = CrawlState {
            fetcher,
            index,
            visited: VisitedSet::new(config.max_pages),
            spawner: pool.spawner(),
            snippet_len: config.snippet_len,
        };
        Self { pool, state: Arc::new(state) }
    }

    /// Crawls from `seed` and blocks until every admitted page is indexed.
    pub fn crawl(&self, seed: Url) -> Result<()> {
        let seed = normalize(seed);
        // claimed before any task runs so no link can race the seed
        self.state.visited.try_admit(&seed);
        submit(&self.state, seed.clone())?;
        self.pool.finish();
        tracing::info!(
            %seed,
            visited = self.state.visited.len(),
            limit = self.state.visited.limit(),
            terms = self.state.index.num_terms(),
            "crawl finished"
        );
        Ok(())
    }

    /// URLs admitted so far, sorted.
    pub fn visited(&self) -> Vec<Url> {
        self.state.visited.urls()
    }

    pub fn index(&self) -> &Arc<ThreadSafeIndex> {
        &self.state.index
    }
}

fn submit<F: Fetcher>(state: &Arc<CrawlState<F>>, url: Url) -> Result<(), PoolError> {
    let task_state = Arc::clone(state);
    state.spawner.execute(move || task_state.crawl_page(url))
}

impl<F: Fetcher> CrawlState<F> {
    fn crawl_page(self: &Arc<Self>, url: Url) {
        let Some(html) = self.fetcher.fetch(&url) else {
            tracing::debug!(%url, "no content");
            return;
        };
        let page = Page::parse(&url, &html);

        for link in &page.links {
            if self.visited.try_admit(link) {
                if let Err(err) = submit(self, link.clone()) {
                    tracing::warn!(%err, %link, "admitted link not crawled");
                }
            }
        }

        let location = url.to_string();
        let snippet: String = page.text.chars().take(self.snippet_len).collect();
        let snippet = snippet.trim();
        let crawled_at = OffsetDateTime::now_utc();

        let mut local = InvertedIndex::new();
        for (i, term) in tokenizer::stems(&page.text).iter().enumerate() {
            local.add_with_metadata(term, &location, i + 1, snippet, crawled_at);
        }
        tracing::debug!(%url, words = local.count(&location), links = page.links.len(), "page indexed");
        self.index.merge(local);
    }
}
