use lazy_static::lazy_static;
use scraper::{Html, Node, Selector};
use url::Url;

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Elements whose text never reaches the index.
const HIDDEN: &[&str] = &["head", "script", "style", "noscript", "svg", "template"];

/// What a crawl task needs from one page.
#[derive(Debug, Default)]
pub struct Page {
    /// Absolute http(s) links without fragments, in document order.
    pub links: Vec<Url>,
    /// Visible text with whitespace collapsed.
    pub text: String,
}

impl Page {
    pub fn parse(base: &Url, html: &str) -> Self {
        let doc = Html::parse_document(html);
        Self { links: links(base, &doc), text: text(&doc) }
    }
}

/// Drops the fragment so `page#a` and `page#b` are one URL.
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

fn links(base: &Url, doc: &Html) -> Vec<Url> {
    doc.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| Url::parse(href.trim()).or_else(|_| base.join(href.trim())).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(normalize)
        .collect()
}

fn text(doc: &Html) -> String {
    let mut out = String::new();
    for node in doc.tree.root().descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|parent| match parent.value() {
            Node::Element(el) => HIDDEN.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            out.push(' ');
            out.push_str(chunk);
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
