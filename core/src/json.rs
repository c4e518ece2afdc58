//! Pretty, tab-indented JSON output of the index, counts and query results.

use crate::index::InvertedIndex;
use crate::query::ResultMap;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct ResultEntry<'a> {
    count: usize,
    score: f64,
    #[serde(rename = "where")]
    location: &'a str,
}

fn write_pretty<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> Result<()> {
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut ser)?;
    Ok(())
}

fn write_file<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_pretty(value, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Scores are written with eight decimal places.
fn round_score(score: f64) -> f64 {
    (score * 1e8).round() / 1e8
}

pub fn write_index<W: Write>(index: &InvertedIndex, writer: W) -> Result<()> {
    write_pretty(index.postings(), writer)
}

pub fn write_counts<W: Write>(index: &InvertedIndex, writer: W) -> Result<()> {
    write_pretty(index.counts(), writer)
}

pub fn write_results<W: Write>(results: &ResultMap, writer: W) -> Result<()> {
    let entries: BTreeMap<&str, Vec<ResultEntry<'_>>> = results
        .iter()
        .map(|(query, found)| {
            let found = found
                .iter()
                .map(|r| ResultEntry {
                    count: r.count,
                    score: round_score(r.score),
                    location: &r.location,
                })
                .collect();
            (query.as_str(), found)
        })
        .collect();
    write_pretty(&entries, writer)
}

pub fn write_index_file(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_file(index.postings(), path)
}

pub fn write_counts_file(index: &InvertedIndex, path: &Path) -> Result<()> {
    write_file(index.counts(), path)
}

pub fn write_results_file(results: &ResultMap, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    write_results(results, &mut buf)?;
    std::fs::write(path, buf).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
