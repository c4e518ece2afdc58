use crate::index::InvertedIndex;
use crate::lock::SharedExclusiveLock;
use crate::search::SearchResult;
use std::cell::UnsafeCell;
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// An [`InvertedIndex`] shared between threads.
///
/// Every read accessor holds the read lock for its whole body and every
/// mutation holds the write lock, so a merge is never observed half applied.
/// Views are returned as owned copies.
#[derive(Default)]
pub struct ThreadSafeIndex {
    lock: SharedExclusiveLock,
    index: UnsafeCell<InvertedIndex>,
}

// SAFETY: `index` is only reached through `with_read` and `with_write`.
// `with_write` holds the exclusive lock for the lifetime of the `&mut`, and
// its closures are private to this module and never call back into `self`,
// so the writer's reentrancy never creates an aliasing borrow.
unsafe impl Sync for ThreadSafeIndex {}

impl ThreadSafeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already built index.
    pub fn from_index(index: InvertedIndex) -> Self {
        Self { lock: SharedExclusiveLock::new(), index: UnsafeCell::new(index) }
    }

    /// Runs `f` against the index under a single read-lock scope.
    pub fn with_read<R>(&self, f: impl FnOnce(&InvertedIndex) -> R) -> R {
        let _guard = self.lock.read();
        // SAFETY: readers exclude every writer other than the current
        // thread, and no `&mut` escapes `with_write`.
        f(unsafe { &*self.index.get() })
    }

    fn with_write<R>(&self, f: impl FnOnce(&mut InvertedIndex) -> R) -> R {
        let _guard = self.lock.write();
        // SAFETY: the write lock excludes all other threads.
        f(unsafe { &mut *self.index.get() })
    }

    pub fn add(&self, term: &str, location: &str, position: usize) -> bool {
        self.with_write(|index| index.add(term, location, position))
    }

    pub fn add_with_metadata(
        &self,
        term: &str,
        location: &str,
        position: usize,
        snippet: &str,
        crawled_at: OffsetDateTime,
    ) -> bool {
        self.with_write(|index| index.add_with_metadata(term, location, position, snippet, crawled_at))
    }

    /// Moves a task's local index into the shared one under the write lock.
    pub fn merge(&self, local: InvertedIndex) {
        self.with_write(move |index| index.merge(local));
    }

    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        self.with_read(|index| index.search(queries, exact))
    }

    pub fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.with_read(|index| index.exact_search(queries))
    }

    pub fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        self.with_read(|index| index.partial_search(queries))
    }

    pub fn is_empty(&self) -> bool {
        self.with_read(InvertedIndex::is_empty)
    }

    pub fn num_terms(&self) -> usize {
        self.with_read(InvertedIndex::num_terms)
    }

    pub fn num_locations(&self, term: &str) -> usize {
        self.with_read(|index| index.num_locations(term))
    }

    pub fn num_positions(&self, term: &str, location: &str) -> usize {
        self.with_read(|index| index.num_positions(term, location))
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.with_read(|index| index.contains_term(term))
    }

    pub fn contains_location(&self, term: &str, location: &str) -> bool {
        self.with_read(|index| index.contains_location(term, location))
    }

    pub fn contains_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.with_read(|index| index.contains_position(term, location, position))
    }

    pub fn terms(&self) -> Vec<String> {
        self.with_read(|index| index.terms().map(str::to_owned).collect())
    }

    pub fn locations(&self, term: &str) -> Vec<String> {
        self.with_read(|index| index.locations(term).map(str::to_owned).collect())
    }

    pub fn positions(&self, term: &str, location: &str) -> BTreeSet<usize> {
        self.with_read(|index| index.positions(term, location).cloned().unwrap_or_default())
    }

    pub fn count(&self, location: &str) -> usize {
        self.with_read(|index| index.count(location))
    }

    pub fn num_counted(&self) -> usize {
        self.with_read(InvertedIndex::num_counted)
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.with_read(|index| index.counts().clone())
    }

    pub fn snippet(&self, location: &str) -> Option<String> {
        self.with_read(|index| index.snippet(location).map(str::to_owned))
    }

    pub fn crawled_at(&self, location: &str) -> Option<OffsetDateTime> {
        self.with_read(|index| index.crawled_at(location))
    }

    /// Copies the current contents out.
    pub fn snapshot(&self) -> InvertedIndex {
        self.with_read(InvertedIndex::clone)
    }

    /// Active readers and writers of the underlying lock.
    pub fn lock_state(&self) -> (usize, usize) {
        (self.lock.readers(), self.lock.writers())
    }
}

impl std::fmt::Debug for ThreadSafeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_read(|index| {
            f.debug_struct("ThreadSafeIndex")
                .field("terms", &index.num_terms())
                .field("documents", &index.num_counted())
                .finish()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_merges_lose_nothing() {
        let shared = Arc::new(ThreadSafeIndex::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let location = format!("doc{t}.txt");
                    let mut local = InvertedIndex::new();
                    for p in 1..=100 {
                        local.add(&format!("w{}", p % 10), &location, p);
                    }
                    shared.merge(local);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.num_counted(), 8);
        assert_eq!(shared.num_terms(), 10);
        for t in 0..8 {
            assert_eq!(shared.count(&format!("doc{t}.txt")), 100);
        }
        assert_eq!(shared.lock_state(), (0, 0));
    }

    #[test]
    fn readers_see_whole_merges() {
        let shared = Arc::new(ThreadSafeIndex::new());
        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for d in 0..50 {
                    let mut local = InvertedIndex::new();
                    local.add("alpha", &format!("d{d}"), 1);
                    local.add("beta", &format!("d{d}"), 2);
                    shared.merge(local);
                }
            })
        };
        let query: BTreeSet<String> = ["alpha".to_string(), "beta".to_string()].into();
        for _ in 0..200 {
            for result in shared.exact_search(&query) {
                assert_eq!(result.count, 2);
            }
        }
        writer.join().unwrap();
        assert_eq!(shared.exact_search(&query).len(), 50);
    }
}
