use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

/// Positions of one term, keyed by document.
pub type Locations = BTreeMap<String, BTreeSet<usize>>;

/// Term → document → 1-based word positions, plus per-document word counts
/// and optional crawl metadata.
///
/// All maps are ordered so that iteration and serialization are
/// deterministic. Nothing here locks; see [`crate::ThreadSafeIndex`].
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    pub(crate) postings: BTreeMap<String, Locations>,
    pub(crate) counts: BTreeMap<String, usize>,
    pub(crate) snippets: BTreeMap<String, String>,
    pub(crate) crawled_at: BTreeMap<String, OffsetDateTime>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `term` at `position` in `location`. Returns false when the
    /// position was already present, in which case nothing changes.
    pub fn add(&mut self, term: &str, location: &str, position: usize) -> bool {
        let inserted = self
            .postings
            .entry(term.to_owned())
            .or_default()
            .entry(location.to_owned())
            .or_default()
            .insert(position);
        if inserted {
            *self.counts.entry(location.to_owned()).or_insert(0) += 1;
        }
        inserted
    }

    /// Same as [`add`](Self::add), also overwriting the snippet and crawl
    /// time kept for `location`.
    pub fn add_with_metadata(
        &mut self,
        term: &str,
        location: &str,
        position: usize,
        snippet: &str,
        crawled_at: OffsetDateTime,
    ) -> bool {
        let inserted = self.add(term, location, position);
        self.snippets.insert(location.to_owned(), snippet.to_owned());
        self.crawled_at.insert(location.to_owned(), crawled_at);
        inserted
    }

    /// Moves everything in `other` into this index.
    ///
    /// Position sets are unioned. A document already counted here keeps the
    /// larger of the two counts: each document is expected to be indexed by
    /// exactly one task, so both sides should agree. Metadata from `other`
    /// wins.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (term, locations) in other.postings {
            match self.postings.entry(term) {
                Entry::Vacant(slot) => {
                    slot.insert(locations);
                }
                Entry::Occupied(mut slot) => {
                    let mine = slot.get_mut();
                    for (location, positions) in locations {
                        match mine.entry(location) {
                            Entry::Vacant(s) => {
                                s.insert(positions);
                            }
                            Entry::Occupied(mut s) => s.get_mut().extend(positions),
                        }
                    }
                }
            }
        }

        for (location, count) in other.counts {
            let current = self.counts.entry(location).or_insert(0);
            if *current < count {
                *current = count;
            }
        }

        self.snippets.extend(other.snippets);
        self.crawled_at.extend(other.crawled_at);
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of distinct terms.
    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    /// Number of documents containing `term`.
    pub fn num_locations(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, BTreeMap::len)
    }

    /// Number of positions of `term` in `location`.
    pub fn num_positions(&self, term: &str, location: &str) -> usize {
        self.positions(term, location).map_or(0, BTreeSet::len)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn contains_location(&self, term: &str, location: &str) -> bool {
        self.postings
            .get(term)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn contains_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.positions(term, location)
            .is_some_and(|positions| positions.contains(&position))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.postings.keys().map(String::as_str)
    }

    pub fn locations<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.postings
            .get(term)
            .into_iter()
            .flat_map(|locations| locations.keys().map(String::as_str))
    }

    pub fn positions(&self, term: &str, location: &str) -> Option<&BTreeSet<usize>> {
        self.postings.get(term)?.get(location)
    }

    /// Total words indexed for `location`, zero if unknown.
    pub fn count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Number of documents with a word count.
    pub fn num_counted(&self) -> usize {
        self.counts.len()
    }

    /// Ordered term → document → positions view.
    pub fn postings(&self) -> &BTreeMap<String, Locations> {
        &self.postings
    }

    /// Ordered document → word count view.
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn snippet(&self, location: &str) -> Option<&str> {
        self.snippets.get(location).map(String::as_str)
    }

    pub fn crawled_at(&self, location: &str) -> Option<OffsetDateTime> {
        self.crawled_at.get(location).copied()
    }
}
