use axum::{extract::{Query, State}, http::StatusCode, routing::get, Json, Router};
use index_core::tokenizer::unique_stems;
use index_core::{SearchResult, ThreadSafeIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub exact: bool,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub location: String,
    pub count: usize,
    pub score: f64,
    pub snippet: Option<String>,
    pub crawled_at: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub terms: usize,
    pub documents: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ThreadSafeIndex>,
}

pub fn build_app(index: Arc<ThreadSafeIndex>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .with_state(AppState { index })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (terms, documents) = state.index.with_read(|index| (index.num_terms(), index.num_counted()));
    Json(StatsResponse { terms, documents })
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let stems = unique_stems(&params.q);
    // Edge case: nothing left after cleaning
    if stems.is_empty() {
        let elapsed = start.elapsed();
        return Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: 0, results: vec![] }));
    }

    // the index lock blocks, keep it off the async workers
    let index = Arc::clone(&state.index);
    let exact = params.exact;
    let found = tokio::task::spawn_blocking(move || index.search(&stems, exact))
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;

    let total_hits = found.len();
    let k = params.k.clamp(1, 100);
    let raw_terms: Vec<&str> = params.q.split_whitespace().collect();
    let results = found
        .into_iter()
        .take(k)
        .map(|result| to_hit(result, &raw_terms))
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

fn to_hit(result: SearchResult, raw_terms: &[&str]) -> SearchHit {
    SearchHit {
        snippet: result.snippet.as_deref().map(|s| highlight_terms(s, raw_terms)),
        crawled_at: result.crawled_at.and_then(|ts| ts.format(&Rfc3339).ok()),
        location: result.location,
        count: result.count,
        score: result.score,
    }
}

/// Wraps every query term in `<em>` in one pass, so inserted tags are never
/// matched themselves.
fn highlight_terms(snippet: &str, terms: &[&str]) -> String {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return snippet.to_string();
    }
    let Ok(pat) = regex::RegexBuilder::new(&alternatives.join("|")).case_insensitive(true).build() else {
        return snippet.to_string();
    };
    pat.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_case_insensitively() {
        assert_eq!(highlight_terms("Rust and rust", &["RUST"]), "<em>Rust</em> and <em>rust</em>");
    }

    #[test]
    fn inserted_tags_are_not_highlighted_again() {
        assert_eq!(highlight_terms("Rust", &["em", "rust"]), "<em>Rust</em>");
        assert_eq!(highlight_terms("a gem of rust", &["rust", "em"]), "a g<em>em</em> of <em>rust</em>");
        assert_eq!(highlight_terms("plain", &["  "]), "plain");
    }
}
