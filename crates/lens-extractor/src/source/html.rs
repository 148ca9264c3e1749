//! HTML page source

use super::json::json_candidates;
use super::{collapse_whitespace, regex_candidates};
use async_trait::async_trait;
use dom_query::{Document, Selection};
use lens_domain::{Probe, SourceAccessor, SourceError};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static INITIAL_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\});").expect("hardcoded regex pattern is valid")
});

/// A fetched or cached HTML page
///
/// The document is re-parsed for every DOM probe so the source can be shared
/// across tasks. JSON embedded in the page (JSON-LD, widget state scripts,
/// `window.__INITIAL_STATE__`) is parsed once on construction and answers
/// `json:` and `key:` probes.
#[derive(Debug, Clone)]
pub struct HtmlSource {
    url: String,
    html: String,
    embedded: Vec<Value>,
}

impl HtmlSource {
    /// Wrap a page
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let embedded = embedded_json(&html);
        Self {
            url: url.into(),
            html,
            embedded,
        }
    }

    /// Page URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw markup
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Number of embedded JSON documents found
    pub fn embedded_count(&self) -> usize {
        self.embedded.len()
    }

    fn select_map<F>(&self, selector: &str, mut f: F) -> Vec<String>
    where
        F: FnMut(&Selection) -> Option<String>,
    {
        let doc = Document::from(self.html.as_str());
        let Some(matched) = doc.try_select(selector) else {
            return Vec::new();
        };
        matched
            .nodes()
            .iter()
            .filter_map(|node| f(&Selection::from(*node)))
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn meta_content(&self, name: &str) -> Vec<String> {
        self.select_map("meta", |meta| {
            let matches = ["property", "name", "itemprop"]
                .iter()
                .any(|attr| meta.attr(attr).is_some_and(|v| v.eq_ignore_ascii_case(name)));
            if matches {
                meta.attr("content").map(|c| c.trim().to_string())
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl SourceAccessor for HtmlSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn probe(&self, probe: &Probe) -> Result<Vec<String>, SourceError> {
        let found = match probe {
            Probe::Css(selector) => self.select_map(selector, |el| Some(collapse_whitespace(&el.text()))),
            Probe::Attr { selector, attr } => {
                self.select_map(selector, |el| el.attr(attr).map(|v| v.trim().to_string()))
            }
            Probe::Meta(name) => self.meta_content(name),
            Probe::Title => self
                .select_map("title", |el| Some(collapse_whitespace(&el.text())))
                .into_iter()
                .take(1)
                .collect(),
            Probe::Regex(pattern) => regex_candidates(pattern, &self.html)?,
            Probe::JsonPointer(_) | Probe::JsonKey(_) => self
                .embedded
                .iter()
                .flat_map(|doc| json_candidates(doc, probe))
                .collect(),
        };
        Ok(found)
    }
}

/// Parse every JSON document embedded in the page
fn embedded_json(html: &str) -> Vec<Value> {
    let doc = Document::from(html);
    let mut found = Vec::new();

    for selector in [r#"script[type="application/ld+json"]"#, "script[data-widget]"] {
        for node in doc.select(selector).nodes() {
            let text = Selection::from(*node).text();
            let text = text.trim();
            if !text.starts_with('{') && !text.starts_with('[') {
                continue;
            }
            if let Ok(value) = serde_json::from_str::<Value>(text) {
                found.push(value);
            }
        }
    }

    for caps in INITIAL_STATE.captures_iter(html) {
        if let Some(Ok(value)) = caps.get(1).map(|m| serde_json::from_str::<Value>(m.as_str())) {
            found.push(value);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Кофемашина Philips EP1220 / Бытовая техника | Wildberries</title>
  <meta property="og:title" content="Кофемашина Philips EP1220">
  <meta name="description" content="Автоматическая кофемашина">
  <meta itemprop="price" content="24990">
  <script type="application/ld+json">
    {"@type": "Product", "name": "Philips EP1220", "offers": {"price": "24990", "priceCurrency": "RUB"}}
  </script>
  <script>window.__INITIAL_STATE__ = {"product": {"finalPrice": 23990}};</script>
</head>
<body>
  <h1 class="product-page__title">  Кофемашина
     Philips EP1220 </h1>
  <div class="comments__item">Первый отзыв</div>
  <div class="comments__item">   </div>
  <div class="comments__item">Второй отзыв</div>
  <a class="buy" href="/cart?id=1">Купить</a>
</body>
</html>"#;

    fn page() -> HtmlSource {
        HtmlSource::new("https://www.wildberries.ru/catalog/1/detail.aspx", PAGE)
    }

    async fn run(source: &HtmlSource, probe: &str) -> Vec<String> {
        source.probe(&probe.parse().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_css_text_is_collapsed_and_blank_skipped() {
        let source = page();
        assert_eq!(run(&source, "css:h1").await, vec!["Кофемашина Philips EP1220"]);
        assert_eq!(
            run(&source, "css:.comments__item").await,
            vec!["Первый отзыв", "Второй отзыв"]
        );
        assert!(run(&source, "css:.nothing-here").await.is_empty());
    }

    #[tokio::test]
    async fn test_attr_meta_and_title() {
        let source = page();
        assert_eq!(run(&source, "attr:a.buy@href").await, vec!["/cart?id=1"]);
        assert_eq!(run(&source, "meta:og:title").await, vec!["Кофемашина Philips EP1220"]);
        assert_eq!(run(&source, "meta:description").await, vec!["Автоматическая кофемашина"]);
        assert_eq!(run(&source, "meta:price").await, vec!["24990"]);
        assert_eq!(
            run(&source, "title").await,
            vec!["Кофемашина Philips EP1220 / Бытовая техника | Wildberries"]
        );
    }

    #[tokio::test]
    async fn test_embedded_json() {
        let source = page();
        assert_eq!(source.embedded_count(), 2);
        assert_eq!(run(&source, "json:/offers/price").await, vec!["24990"]);
        assert_eq!(run(&source, "key:finalPrice").await, vec!["23990"]);
    }

    #[tokio::test]
    async fn test_regex_over_markup() {
        let source = page();
        assert_eq!(run(&source, r"regex:content=.(\d{5}).").await, vec!["24990"]);
    }

    #[tokio::test]
    async fn test_invalid_selector_is_empty() {
        let source = page();
        assert!(run(&source, "css:div[[").await.is_empty());
    }
}
