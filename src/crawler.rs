//! Same-domain breadth-first website crawler.
//!
//! Starting from a seed URL, the crawler pops URLs from a frontier set,
//! fetches each page, extracts its visible text and outbound links, and
//! queues unvisited same-authority links until the frontier drains or the
//! page budget is reached. Frontier pop order is arbitrary; callers must
//! not rely on traversal order, only on the visited-set and budget bounds.
//!
//! A failed fetch marks the URL visited (so it is never retried) and the
//! crawl continues. The crawler itself never errors; an empty result map
//! is the orchestrator's signal that the seed was unusable.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::config::CrawlConfig;

pub struct Crawler {
    client: reqwest::Client,
    max_pages: usize,
}

impl Crawler {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build crawl HTTP client")?;

        Ok(Self {
            client,
            max_pages: config.max_pages,
        })
    }

    /// Crawl up to `max_pages` same-authority pages reachable from `seed`.
    ///
    /// Returns a map of page URL → extracted visible text. Pages whose
    /// fetch failed, or whose body produced no text, are absent from the
    /// map but still count against the budget.
    pub async fn crawl(&self, seed: &Url) -> HashMap<String, String> {
        let mut frontier: HashSet<Url> = HashSet::new();
        let mut visited: HashSet<Url> = HashSet::new();
        let mut pages: HashMap<String, String> = HashMap::new();

        frontier.insert(strip_fragment(seed.clone()));

        while visited.len() < self.max_pages {
            let url = match frontier.iter().next().cloned() {
                Some(url) => url,
                None => break,
            };
            frontier.remove(&url);
            if visited.contains(&url) {
                continue;
            }
            visited.insert(url.clone());

            info!(url = %url, "fetching page");
            let html = match self.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, error = %e, "fetch failed, skipping");
                    continue;
                }
            };

            let (text, links) = extract_page(&url, &html);
            if !text.is_empty() {
                pages.insert(url.to_string(), text);
            }

            for link in links {
                if same_authority(seed, &link) && !visited.contains(&link) {
                    frontier.insert(link);
                }
            }
        }

        pages
    }

    async fn fetch(&self, url: &Url) -> Result<String, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        response.text().await
    }
}

/// Whether two URLs share a network authority (host and effective port).
/// Scheme is deliberately ignored so http/https variants of one site
/// crawl as a single domain.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Parse one fetched page, returning its visible text and its absolute,
/// fragment-stripped outbound links. Kept synchronous so the parsed DOM
/// never lives across an await point.
fn extract_page(page_url: &Url, html: &str) -> (String, Vec<Url>) {
    let document = Html::parse_document(html);
    (extract_text(&document), extract_links(page_url, &document))
}

/// Extract readable text, preferring content containers over the whole
/// body so navigation chrome contributes less noise.
fn extract_text(document: &Html) -> String {
    const CONTENT_SELECTORS: [&str; 6] =
        ["article", "main", "[role=main]", ".content", "#content", "body"];

    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(&element);
                if text.chars().count() > 100 {
                    return text;
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(element) = document.select(&selector).next() {
            return element_text(&element);
        }
    }

    String::new()
}

fn element_text(element: &scraper::ElementRef) -> String {
    let mut text = String::new();
    for node in element.text() {
        let trimmed = node.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }
    text
}

fn extract_links(base: &Url, document: &Html) -> Vec<Url> {
    let mut links = Vec::new();
    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Ok(resolved) = base.join(href) {
                    if matches!(resolved.scheme(), "http" | "https") {
                        links.push(strip_fragment(resolved));
                    }
                }
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn authority_matching_ignores_scheme_and_path() {
        let seed = Url::parse("https://example.com/start").unwrap();
        let same = Url::parse("http://example.com/other/page").unwrap();
        let other_host = Url::parse("https://other.com/page").unwrap();
        let other_port = Url::parse("https://example.com:8443/page").unwrap();

        assert!(same_authority(&seed, &same));
        assert!(!same_authority(&seed, &other_host));
        assert!(!same_authority(&seed, &other_port));
    }

    #[test]
    fn link_extraction_resolves_relative_urls_and_drops_fragments() {
        let base = Url::parse("https://example.com/docs/intro").unwrap();
        let document = Html::parse_document(
            r#"<html><body>
                <a href="/pricing">Pricing</a>
                <a href="guide#install">Guide</a>
                <a href="https://elsewhere.org/page">External</a>
                <a href="mailto:team@example.com">Mail</a>
            </body></html>"#,
        );
        let links = extract_links(&base, &document);
        let as_strings: Vec<String> = links.iter().map(|u| u.to_string()).collect();

        assert!(as_strings.contains(&"https://example.com/pricing".to_string()));
        assert!(as_strings.contains(&"https://example.com/docs/guide".to_string()));
        assert!(as_strings.contains(&"https://elsewhere.org/page".to_string()));
        assert!(!as_strings.iter().any(|s| s.contains('#')));
        assert!(!as_strings.iter().any(|s| s.starts_with("mailto:")));
    }

    #[test]
    fn text_extraction_prefers_main_content() {
        let document = Html::parse_document(
            r#"<html><body>
                <nav>Home About Products</nav>
                <main>This is the body of the page with a long enough run of
                meaningful prose that the extractor should prefer it over
                the navigation chrome around it.</main>
                <footer>Footer junk</footer>
            </body></html>"#,
        );
        let text = extract_text(&document);
        assert!(text.contains("meaningful prose"));
        assert!(!text.contains("Footer junk"));
    }

    #[tokio::test]
    async fn crawl_never_exceeds_page_budget() {
        let server = MockServer::start_async().await;

        let page = |links: &str| {
            format!(
                "<html><body><main>Filler prose long enough to count as real page \
                 content for the extractor to keep around here.</main>{links}</body></html>"
            )
        };

        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).header("content-type", "text/html").body(page(
                    r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a><a href="/d">d</a>"#,
                ));
            })
            .await;
        for path in ["/a", "/b", "/c", "/d"] {
            let body = page("");
            server
                .mock_async(move |when, then| {
                    when.method(GET).path(path);
                    then.status(200).header("content-type", "text/html").body(body);
                })
                .await;
        }

        let crawler = Crawler::new(&CrawlConfig {
            max_pages: 2,
            timeout_secs: 5,
            user_agent: "sitebot-test".to_string(),
        })
        .unwrap();

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler.crawl(&seed).await;

        assert!(pages.len() <= 2, "crawled {} pages", pages.len());
    }

    #[tokio::test]
    async fn mutually_linked_pages_are_fetched_once_each() {
        let server = MockServer::start_async().await;

        let root = server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).header("content-type", "text/html").body(
                    r#"<html><body><main>The landing page holds a healthy run of
                    prose so the extractor keeps it as indexable content.</main>
                    <a href="/loop">loop</a></body></html>"#,
                );
            })
            .await;
        let looped = server
            .mock_async(|when, then| {
                when.method(GET).path("/loop");
                then.status(200).header("content-type", "text/html").body(
                    r#"<html><body><main>The second page links straight back to the
                    landing page, forming a cycle the crawler must not follow twice.</main>
                    <a href="/">back</a></body></html>"#,
                );
            })
            .await;

        let crawler = Crawler::new(&CrawlConfig {
            max_pages: 10,
            timeout_secs: 5,
            user_agent: "sitebot-test".to_string(),
        })
        .unwrap();

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler.crawl(&seed).await;

        assert_eq!(pages.len(), 2);
        assert_eq!(root.hits_async().await, 1);
        assert_eq!(looped.hits_async().await, 1);
    }

    #[tokio::test]
    async fn failed_page_is_skipped_without_aborting_the_crawl() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).header("content-type", "text/html").body(
                    r#"<html><body><main>The landing page carries enough prose to be
                    kept by the extractor as meaningful content.</main>
                    <a href="/broken">broken</a><a href="/fine">fine</a></body></html>"#,
                );
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/fine");
                then.status(200).header("content-type", "text/html").body(
                    r#"<html><body><main>A second healthy page whose prose is long
                    enough for the extractor to keep it in the result map.</main></body></html>"#,
                );
            })
            .await;

        let crawler = Crawler::new(&CrawlConfig {
            max_pages: 10,
            timeout_secs: 5,
            user_agent: "sitebot-test".to_string(),
        })
        .unwrap();

        let seed = Url::parse(&server.url("/")).unwrap();
        let pages = crawler.crawl(&seed).await;

        assert_eq!(pages.len(), 2);
        assert!(pages.keys().any(|u| u.ends_with("/fine")));
        assert!(!pages.keys().any(|u| u.ends_with("/broken")));
    }

    #[tokio::test]
    async fn unreachable_seed_yields_empty_map() {
        let crawler = Crawler::new(&CrawlConfig {
            max_pages: 5,
            timeout_secs: 1,
            user_agent: "sitebot-test".to_string(),
        })
        .unwrap();

        let seed = Url::parse("http://127.0.0.1:1/").unwrap();
        let pages = crawler.crawl(&seed).await;
        assert!(pages.is_empty());
    }
}
