//! Exact and prefix search with term-frequency ranking.

use crate::index::InvertedIndex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use time::OffsetDateTime;

/// One ranked document for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub location: String,
    /// Occurrences of all matched terms in the document.
    pub count: usize,
    /// `count` divided by the document's word count.
    pub score: f64,
    pub snippet: Option<String>,
    pub crawled_at: Option<OffsetDateTime>,
}

impl SearchResult {
    fn new(index: &InvertedIndex, location: &str) -> Self {
        Self {
            location: location.to_owned(),
            count: 0,
            score: 0.0,
            snippet: index.snippet(location).map(str::to_owned),
            crawled_at: index.crawled_at(location),
        }
    }

    fn update(&mut self, matches: usize, total: usize) {
        self.count += matches;
        self.score = self.count as f64 / total as f64;
    }

    /// Score descending, then count descending, then location ignoring case.
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| {
                self.location
                    .to_lowercase()
                    .cmp(&other.location.to_lowercase())
            })
            .then_with(|| self.location.cmp(&other.location))
    }
}

/// Accumulates one result per document across every matched term.
struct Collector<'a> {
    index: &'a InvertedIndex,
    results: Vec<SearchResult>,
    lookup: HashMap<&'a str, usize>,
}

impl<'a> Collector<'a> {
    fn new(index: &'a InvertedIndex) -> Self {
        Self { index, results: Vec::new(), lookup: HashMap::new() }
    }

    fn visit(&mut self, term: &str) {
        let index = self.index;
        let Some(locations) = index.postings.get(term) else {
            return;
        };
        for (location, positions) in locations {
            let slot = match self.lookup.get(location.as_str()) {
                Some(&slot) => slot,
                None => {
                    self.results.push(SearchResult::new(index, location));
                    self.lookup.insert(location.as_str(), self.results.len() - 1);
                    self.results.len() - 1
                }
            };
            self.results[slot].update(positions.len(), index.count(location));
        }
    }

    fn finish(mut self) -> Vec<SearchResult> {
        self.results.sort_by(SearchResult::rank);
        self.results
    }
}

impl InvertedIndex {
    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        if exact {
            self.exact_search(queries)
        } else {
            self.partial_search(queries)
        }
    }

    /// Matches only index terms equal to a query term.
    pub fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut collector = Collector::new(self);
        for query in queries {
            collector.visit(query);
        }
        collector.finish()
    }

    /// Matches every index term starting with a query term. The term map is
    /// sorted, so the scan starts at the first term not below the prefix and
    /// stops at the first one that no longer starts with it.
    pub fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut collector = Collector::new(self);
        for prefix in queries {
            for term in self
                .postings
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .map(|(term, _)| term)
                .take_while(|term| term.starts_with(prefix.as_str()))
            {
                collector.visit(term);
            }
        }
        collector.finish()
    }
}
