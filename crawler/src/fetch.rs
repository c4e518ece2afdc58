use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header;
use std::time::Duration;
use url::Url;

/// Pages larger than this are treated as missing.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Source of page HTML. `None` means "no content" and ends that branch of
/// the crawl.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> Option<String>;
}

/// Blocking HTTP fetcher following a bounded number of redirects and
/// accepting only successful `text/html` responses.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, max_redirects: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Option<String> {
        let resp = match self.client.get(url.clone()).send() {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(%url, %err, "fetch failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::debug!(%url, status = %resp.status(), "non-success status");
            return None;
        }
        let is_html = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if !is_html {
            return None;
        }
        let bytes = resp.bytes().ok()?;
        if bytes.len() > MAX_BODY_BYTES {
            return None;
        }
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}
