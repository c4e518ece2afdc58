//! Runs query files against an index, one line per query.

use crate::index::InvertedIndex;
use crate::pool::WorkerPool;
use crate::safe_index::ThreadSafeIndex;
use crate::search::SearchResult;
use crate::tokenizer;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Query text → ranked results, ordered by query.
pub type ResultMap = BTreeMap<String, Vec<SearchResult>>;

/// Something that can answer a single query line.
pub trait QueryProcessor {
    fn process_line(&mut self, line: &str, exact: bool);
}

/// Feeds every line of `path` to `processor`.
pub fn process_query_file<P>(path: &Path, exact: bool, processor: &mut P) -> Result<()>
where
    P: QueryProcessor + ?Sized,
{
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        processor.process_line(&line, exact);
    }
    Ok(())
}

/// Stems a query line and joins the unique stems into the key results are
/// stored under. `None` for a line with no words.
pub fn clean_query(line: &str) -> Option<(String, BTreeSet<String>)> {
    let stems = tokenizer::unique_stems(line);
    if stems.is_empty() {
        return None;
    }
    let key = stems.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
    Some((key, stems))
}

/// Answers queries inline against an unshared index.
pub struct QueryResults<'a> {
    index: &'a InvertedIndex,
    results: ResultMap,
}

impl<'a> QueryResults<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self { index, results: ResultMap::new() }
    }

    pub fn results(&self) -> &ResultMap {
        &self.results
    }

    pub fn into_results(self) -> ResultMap {
        self.results
    }
}

impl QueryProcessor for QueryResults<'_> {
    fn process_line(&mut self, line: &str, exact: bool) {
        let Some((key, stems)) = clean_query(line) else {
            return;
        };
        if !self.results.contains_key(&key) {
            let found = self.index.search(&stems, exact);
            self.results.insert(key, found);
        }
    }
}

/// Answers each query line as a separate pool task.
pub struct ConcurrentQueryResults<'p> {
    index: Arc<ThreadSafeIndex>,
    pool: &'p WorkerPool,
    results: Arc<Mutex<ResultMap>>,
}

impl<'p> ConcurrentQueryResults<'p> {
    pub fn new(index: Arc<ThreadSafeIndex>, pool: &'p WorkerPool) -> Self {
        Self { index, pool, results: Arc::new(Mutex::new(ResultMap::new())) }
    }

    /// Processes the whole file and waits for every query to finish. Queries
    /// submitted before a read error still complete before this returns.
    pub fn process_file(&mut self, path: &Path, exact: bool) -> Result<()> {
        let read = process_query_file(path, exact, self);
        self.pool.finish();
        read
    }

    pub fn queries(&self) -> Vec<String> {
        self.results.lock().keys().cloned().collect()
    }

    pub fn results_for(&self, query: &str) -> Vec<SearchResult> {
        self.results.lock().get(query).cloned().unwrap_or_default()
    }

    pub fn results(&self) -> ResultMap {
        self.results.lock().clone()
    }
}

impl QueryProcessor for ConcurrentQueryResults<'_> {
    fn process_line(&mut self, line: &str, exact: bool) {
        let line = line.to_owned();
        let index = Arc::clone(&self.index);
        let results = Arc::clone(&self.results);
        let submitted = self.pool.execute(move || {
            let Some((key, stems)) = clean_query(&line) else {
                return;
            };
            if results.lock().contains_key(&key) {
                return;
            }
            let found = index.search(&stems, exact);
            results.lock().insert(key, found);
        });
        if let Err(err) = submitted {
            tracing::warn!(%err, "query dropped");
        }
    }
}
