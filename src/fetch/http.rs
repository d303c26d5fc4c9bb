// src/fetch/http.rs
// =============================================================================
// The web expander: a page is a node, its same-site links are its neighbors.
//
// How it works:
// 1. Fetch the page with a GET request
// 2. Anything other than a 2xx status is an expansion failure
// 3. Parse the HTML, pull out the <title> and every <a href>
// 4. Resolve relative links against the page URL, drop anchors, mailto:,
//    tel: and javascript: links, and (by default) anything off-domain
//
// The traversal decides what to visit and when; this file only knows how to
// turn one URL into (page summary, links).
//
// Rust concepts:
// - scraper::Html is not Send, so all parsing happens in a plain function
//   after the last .await
// - From<reqwest::Error> for ExpansionError lets us use ? on network calls
// =============================================================================

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ExpansionError;
use crate::traverse::{Expander, Expansion};

/// What we keep from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Size of the HTML body in bytes
    pub bytes: usize,
}

/// Knobs for the web expander, filled in from the command line.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Politeness delay before each request
    pub delay: Duration,
    /// Only follow links on the start URL's domain
    pub same_domain: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            delay: Duration::from_millis(100),
            same_domain: true,
        }
    }
}

pub struct HttpExpander {
    client: Client,
    // None when crawling across domains is allowed
    domain: Option<String>,
    delay: Duration,
    links: Selector,
    title: Selector,
}

impl HttpExpander {
    /// Builds an expander for a crawl starting at `start_url`.
    pub fn new(start_url: &str, config: HttpConfig) -> Result<Self> {
        let start = Url::parse(start_url)
            .map_err(|e| anyhow!("Invalid URL '{}': {}", start_url, e))?;

        let domain = if config.same_domain {
            let domain = start
                .domain()
                .ok_or_else(|| anyhow!("URL has no domain: {}", start_url))?;
            Some(domain.to_string())
        } else {
            None
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            domain,
            delay: config.delay,
            links: parse_selector("a[href]")?,
            title: parse_selector("title")?,
        })
    }

    // Turns an HTML body into the page summary and the links worth following
    fn parse_page(&self, html: &str, base: &Url) -> Expansion<String, Page> {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty());

        let neighbors = document
            .select(&self.links)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(base, href))
            .filter(|link| self.should_follow(link))
            .map(String::from)
            .collect();

        Expansion {
            content: Page {
                title,
                bytes: html.len(),
            },
            neighbors,
        }
    }

    // HTTP(S) only, and on our domain unless --any-domain was given
    fn should_follow(&self, link: &Url) -> bool {
        if link.scheme() != "http" && link.scheme() != "https" {
            return false;
        }
        match &self.domain {
            Some(domain) => link.domain() == Some(domain.as_str()),
            None => true,
        }
    }
}

#[async_trait]
impl Expander for HttpExpander {
    type Node = String;
    type Content = Page;

    async fn expand(&self, url: &String) -> Result<Expansion<String, Page>, ExpansionError> {
        Url::parse(url).map_err(|_| ExpansionError::InvalidUrl(url.clone()))?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        debug!(%url, "fetching");
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpansionError::Status(status.as_u16()));
        }

        // Relative links resolve against where the redirects ended up
        let base = response.url().clone();
        let html = response.text().await?;
        Ok(self.parse_page(&html, &base))
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {}", css, e))
}

// Resolves an href (possibly relative) against the page it was found on
//
// Fragments are stripped so page#a and page#b count as the same node.
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}
