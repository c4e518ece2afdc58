use anyhow::Result;
use clap::Parser;
use crawler::{crawl_url, CrawlConfig};
use index_core::builder::{build_index, build_index_concurrently};
use index_core::json::{write_counts_file, write_index_file, write_results_file};
use index_core::query::{process_query_file, ConcurrentQueryResults, QueryResults, ResultMap};
use index_core::{InvertedIndex, ThreadSafeIndex, WorkerPool, DEFAULT_THREADS};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "indexer")]
#[command(about = "Build, crawl and query an inverted index", long_about = None)]
struct Cli {
    /// Text file or directory of .txt/.text files to index
    #[arg(long)]
    text: Option<PathBuf>,
    /// Seed URL to crawl into the index
    #[arg(long)]
    html: Option<String>,
    /// Most pages to crawl, seed included
    #[arg(long, default_value_t = 1)]
    max: usize,
    /// Worker threads; builds and queries concurrently when present
    #[arg(long, num_args = 0..=1, default_missing_value = "5")]
    threads: Option<usize>,
    /// Write the index as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,
    /// Write per-document word counts as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,
    /// File with one query per line
    #[arg(long)]
    query: Option<PathBuf>,
    /// Match query words exactly instead of as prefixes
    #[arg(long, default_value_t = false)]
    exact: bool,
    /// Write query results as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    if cli.threads.is_some() || cli.html.is_some() {
        run_concurrent(&cli);
    } else {
        run_single(&cli);
    }
    Ok(())
}

/// Failed steps are reported and the remaining steps still run.
fn report(step: &str, result: Result<()>) {
    if let Err(err) = result {
        tracing::error!("{step} failed: {err:#}");
    }
}

fn run_single(cli: &Cli) {
    let mut index = InvertedIndex::new();
    if let Some(text) = &cli.text {
        report("building index", build_index(text, &mut index));
    }
    write_index_outputs(cli, &index);

    let mut queries = QueryResults::new(&index);
    if let Some(query) = &cli.query {
        report("querying", process_query_file(query, cli.exact, &mut queries));
    }
    write_results(cli, queries.results());
}

fn run_concurrent(cli: &Cli) {
    let threads = match cli.threads {
        Some(0) | None => DEFAULT_THREADS,
        Some(n) => n,
    };
    let pool = Arc::new(WorkerPool::new(threads));
    let index = Arc::new(ThreadSafeIndex::new());

    if let Some(seed) = &cli.html {
        let config = CrawlConfig { max_pages: cli.max, ..CrawlConfig::default() };
        report("crawling", crawl_url(seed, &config, &index, &pool));
    }
    if let Some(text) = &cli.text {
        report("building index", build_index_concurrently(text, &index, &pool));
    }
    index.with_read(|index| write_index_outputs(cli, index));

    let mut queries = ConcurrentQueryResults::new(Arc::clone(&index), &pool);
    if let Some(query) = &cli.query {
        report("querying", queries.process_file(query, cli.exact));
    }
    write_results(cli, &queries.results());

    pool.join();
}

fn write_index_outputs(cli: &Cli, index: &InvertedIndex) {
    if let Some(path) = &cli.index {
        report("writing index", write_index_file(index, path));
    }
    if let Some(path) = &cli.counts {
        report("writing counts", write_counts_file(index, path));
    }
}

fn write_results(cli: &Cli, results: &ResultMap) {
    if let Some(path) = &cli.results {
        report("writing results", write_results_file(results, path));
        tracing::info!(path = %path.display(), queries = results.len(), "results written");
    }
}
