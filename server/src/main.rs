use anyhow::Result;
use axum::Router;
use clap::Parser;
use crawler::{crawl_url, CrawlConfig};
use index_core::builder::build_index_concurrently;
use index_core::{ThreadSafeIndex, WorkerPool};
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Text file or directory to index before serving
    #[arg(long)]
    text: Option<PathBuf>,
    /// Seed URL to crawl before serving
    #[arg(long)]
    html: Option<String>,
    /// Most pages to crawl
    #[arg(long, default_value_t = 50)]
    max: usize,
    /// Worker threads used while building
    #[arg(long, default_value_t = 5)]
    threads: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    // built before the runtime starts: the crawler's HTTP client is blocking
    let index = Arc::new(ThreadSafeIndex::new());
    let pool = Arc::new(WorkerPool::new(args.threads));
    if let Some(seed) = &args.html {
        let config = CrawlConfig { max_pages: args.max, ..CrawlConfig::default() };
        crawl_url(seed, &config, &index, &pool)?;
    }
    if let Some(text) = &args.text {
        build_index_concurrently(text, &index, &pool)?;
    }
    pool.join();
    tracing::info!(terms = index.num_terms(), documents = index.num_counted(), "index ready");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(serve(args, index))
}

async fn serve(args: Args, index: Arc<ThreadSafeIndex>) -> Result<()> {
    let app: Router = build_app(index);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
