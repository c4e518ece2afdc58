use crawler::{CrawlConfig, Fetcher, WebCrawler};
use index_core::tokenizer::unique_stems;
use index_core::{ThreadSafeIndex, WorkerPool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// Serves pages from memory and counts fetches.
#[derive(Default)]
struct StaticWeb {
    pages: HashMap<String, String>,
    fetches: Arc<AtomicUsize>,
}

impl StaticWeb {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// `width` pages, each linking to the next `fanout` pages (wrapping).
    fn wide(width: usize, fanout: usize) -> Self {
        let mut web = StaticWeb::default();
        for i in 0..width {
            let links: String = (1..=fanout)
                .map(|k| format!("<a href=\"/p{}\">next</a>", (i + k) % width))
                .collect();
            web = web.page(
                &format!("http://wide.test/p{i}"),
                &format!("<html><body><p>page number {i} about rivers</p>{links}</body></html>"),
            );
        }
        web
    }
}

impl Fetcher for StaticWeb {
    fn fetch(&self, url: &Url) -> Option<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        std::thread::yield_now();
        self.pages.get(url.as_str()).cloned()
    }
}

fn run(
    web: StaticWeb,
    seed: &str,
    max_pages: usize,
    threads: usize,
) -> (WebCrawler<StaticWeb>, Arc<ThreadSafeIndex>) {
    let index = Arc::new(ThreadSafeIndex::new());
    let pool = Arc::new(WorkerPool::new(threads));
    let config = CrawlConfig { max_pages, ..CrawlConfig::default() };
    let crawler = WebCrawler::new(Arc::clone(&index), pool, web, &config);
    crawler.crawl(Url::parse(seed).unwrap()).unwrap();
    (crawler, index)
}

#[test]
fn budget_is_exact_under_contention() {
    for threads in [1, 4, 32] {
        for max in [1, 7, 50] {
            let web = StaticWeb::wide(300, 25);
            let fetches = Arc::clone(&web.fetches);
            let (crawler, index) = run(web, "http://wide.test/p0", max, threads);
            assert_eq!(crawler.visited().len(), max, "threads={threads} max={max}");
            assert_eq!(fetches.load(Ordering::SeqCst), max);
            assert_eq!(index.num_counted(), max);
        }
    }
}

#[test]
fn crawl_stops_when_links_run_out() {
    let web = StaticWeb::default()
        .page("http://site.test/", r#"<a href="/a">a</a><a href="/a#again">a again</a>"#)
        .page("http://site.test/a", r#"<p>leaf</p><a href="/">home</a>"#);
    let (crawler, index) = run(web, "http://site.test/#intro", 50, 4);
    let visited: Vec<String> = crawler.visited().iter().map(Url::to_string).collect();
    assert_eq!(visited, vec!["http://site.test/", "http://site.test/a"]);
    assert!(index.contains_term("leaf"));
}

#[test]
fn missing_pages_do_not_end_the_crawl() {
    let web = StaticWeb::default()
        .page("http://site.test/", r#"<a href="/gone">x</a><a href="/here">y</a>"#)
        .page("http://site.test/here", "<p>still crawled</p>");
    let (crawler, index) = run(web, "http://site.test/", 10, 3);
    assert_eq!(crawler.visited().len(), 3);
    assert_eq!(index.count("http://site.test/here"), 2);
    assert_eq!(index.count("http://site.test/gone"), 0);
}

#[test]
fn pages_carry_snippet_and_timestamp() {
    let body = "word ".repeat(200);
    let web = StaticWeb::default().page(
        "http://site.test/",
        &format!("<html><head><title>hidden</title></head><body><p>  {body}</p></body></html>"),
    );
    let (_, index) = run(web, "http://site.test/", 1, 2);

    let location = "http://site.test/";
    let snippet = index.snippet(location).unwrap();
    assert!(snippet.chars().count() <= 400);
    assert!(snippet.starts_with("word word"));
    assert!(index.crawled_at(location).is_some());
    assert_eq!(index.count(location), 200);
    assert!(!index.contains_term("hidden"));

    let results = index.search(&unique_stems("word"), true);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].snippet.as_deref(), Some(snippet.as_str()));
    assert!((results[0].score - 1.0).abs() < 1e-9);
}
