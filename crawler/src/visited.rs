use parking_lot::Mutex;
use std::collections::HashSet;
use url::Url;

/// URLs claimed by the crawl, capped at a page budget.
///
/// Admission checks membership and the budget and inserts under one lock, so
/// racing tasks can never push the set past its limit.
#[derive(Debug)]
pub struct VisitedSet {
    urls: Mutex<HashSet<Url>>,
    limit: usize,
}

impl VisitedSet {
    /// A budget of zero still admits the seed.
    pub fn new(limit: usize) -> Self {
        Self { urls: Mutex::new(HashSet::new()), limit: limit.max(1) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Claims `url` if it is new and the budget has room.
    pub fn try_admit(&self, url: &Url) -> bool {
        let mut urls = self.urls.lock();
        if urls.len() >= self.limit || urls.contains(url) {
            return false;
        }
        urls.insert(url.clone())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().is_empty()
    }

    /// Sorted copy of every admitted URL.
    pub fn urls(&self) -> Vec<Url> {
        let mut urls: Vec<Url> = self.urls.lock().iter().cloned().collect();
        urls.sort();
        urls
    }
}
