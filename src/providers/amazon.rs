// src/providers/amazon.rs

//! Amazon public search-page adapter.
//!
//! Scrapes the public search results page for product links, extracts ASINs
//! from the URL patterns, then fetches each detail page with bounded
//! concurrency to extract title/author/cover/description and the ISBNs
//! listed in the product detail bullets.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, MediaKind};
use crate::providers::{AMAZON, BookProvider};
use crate::utils::{http, isbn, non_empty};

const DEFAULT_BASE_URL: &str = "https://www.amazon.com";

static ASIN_PATTERN: OnceLock<Regex> = OnceLock::new();

/// ASINs appear in `/dp/<ASIN>` and `/gp/product/<ASIN>` link forms.
fn asin_pattern() -> &'static Regex {
    ASIN_PATTERN.get_or_init(|| {
        Regex::new(r"(?:/dp/|/gp/product/)([A-Z0-9]{10})(?:[/?]|$)")
            .expect("ASIN pattern must compile")
    })
}

/// Adapter scraping the public Amazon search and product pages.
pub struct AmazonProvider {
    client: Client,
    base_url: String,
    detail_concurrency: usize,
    request_delay: Duration,
    max_results: usize,
}

impl AmazonProvider {
    /// Create an adapter for the public amazon.com endpoint.
    pub fn new(config: &Config) -> Result<Self> {
        let client = http::create_client(&config.http)?;
        Ok(Self::with_base_url(client, DEFAULT_BASE_URL, config))
    }

    /// Create an adapter against a custom base URL.
    pub fn with_base_url(client: Client, base_url: impl Into<String>, config: &Config) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            detail_concurrency: config.search.detail_concurrency.max(1),
            request_delay: Duration::from_millis(config.http.request_delay_ms),
            max_results: config.search.max_results_per_provider,
        }
    }

    async fn search_impl(&self, query: &str) -> Result<Vec<Candidate>> {
        let search_url = format!("{}/s", self.base_url);
        let html = self
            .client
            .get(&search_url)
            .query(&[("k", query), ("i", "stripbooks")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let mut asins = extract_asins(&html)?;
        asins.truncate(self.max_results);
        log::debug!("Amazon search '{query}' yielded {} product link(s)", asins.len());

        // Stage 2: fetch details for each product with bounded concurrency.
        let mut detail_stream = stream::iter(asins)
            .map(|asin| async move {
                let result = self.fetch_detail(&asin).await;
                (asin, result)
            })
            .buffer_unordered(self.detail_concurrency);

        let mut candidates = Vec::new();
        while let Some((asin, result)) = detail_stream.next().await {
            match result {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => log::debug!("Amazon detail page for {asin} had no usable title"),
                Err(error) => log::warn!("Failed to fetch Amazon detail for {asin}: {error}"),
            }

            if self.request_delay.as_millis() > 0 {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(candidates)
    }

    /// Fetch one product page and extract a candidate from it.
    async fn fetch_detail(&self, asin: &str) -> Result<Option<Candidate>> {
        let url = format!("{}/dp/{}", self.base_url, asin);
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_detail(&html, asin, &url)
    }
}

#[async_trait]
impl BookProvider for AmazonProvider {
    fn name(&self) -> &'static str {
        AMAZON
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    async fn search(&self, query: &str, _kind: MediaKind) -> Result<Vec<Candidate>> {
        self.search_impl(query).await.map_err(|error| match error {
            tagged @ AppError::Provider { .. } => tagged,
            other => AppError::provider(AMAZON, other),
        })
    }
}

/// Extract candidate ASINs from a search results page, in page order.
fn extract_asins(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut asins = Vec::new();

    // Result containers carry the ASIN directly.
    let result_sel = parse_selector("div[data-asin]")?;
    for element in document.select(&result_sel) {
        if let Some(asin) = element.value().attr("data-asin") {
            if is_asin_like(asin) && seen.insert(asin.to_string()) {
                asins.push(asin.to_string());
            }
        }
    }

    // Fall back to product link URLs for older page layouts.
    let link_sel = parse_selector("a[href]")?;
    for link in document.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(captures) = asin_pattern().captures(href) {
            let asin = captures[1].to_string();
            if seen.insert(asin.clone()) {
                asins.push(asin);
            }
        }
    }

    Ok(asins)
}

fn is_asin_like(value: &str) -> bool {
    value.len() == 10
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Extract a candidate from a product detail page.
///
/// Returns `Ok(None)` when the page carries no product title, which happens
/// for robot-check interstitials and delisted products.
fn parse_detail(html: &str, asin: &str, url: &str) -> Result<Option<Candidate>> {
    let document = Html::parse_document(html);

    let title_sel = parse_selector("#productTitle")?;
    let Some(title) = document
        .select(&title_sel)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()))
    else {
        return Ok(None);
    };

    let author_sel = parse_selector("#bylineInfo .author a, #bylineInfo a.contributorNameID")?;
    let mut authors = Vec::new();
    for element in document.select(&author_sel) {
        if let Some(author) = non_empty(&element.text().collect::<String>()) {
            if !authors.contains(&author) {
                authors.push(author);
            }
        }
    }

    let cover_sel = parse_selector("#landingImage, #imgBlkFront, #ebooksImgBlkFront")?;
    let cover_url = document
        .select(&cover_sel)
        .next()
        .and_then(|el| el.value().attr("src"))
        .and_then(non_empty);

    let description_sel = parse_selector("#bookDescription_feature_div")?;
    let description = document
        .select(&description_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .and_then(|text| non_empty(&text));

    let mut candidate = Candidate {
        title,
        authors,
        asin: Some(asin.to_string()),
        cover_url,
        description,
        provider: AMAZON.to_string(),
        source_url: Some(url.to_string()),
        ..Candidate::default()
    };

    apply_detail_bullets(&document, &mut candidate)?;

    Ok(Some(candidate))
}

/// Pull ISBNs, language, and page count from the product detail bullets.
fn apply_detail_bullets(document: &Html, candidate: &mut Candidate) -> Result<()> {
    let bullet_sel = parse_selector("#detailBullets_feature_div li .a-list-item")?;

    for element in document.select(&bullet_sel) {
        let text: String = element
            .text()
            .collect::<String>()
            .chars()
            // The bullets embed RTL/LTR marks between label and value.
            .filter(|c| !matches!(c, '\u{200e}' | '\u{200f}'))
            .collect();
        let Some((label, value)) = text.split_once(':') else {
            continue;
        };
        let label = label.trim();
        let Some(value) = non_empty(value) else {
            continue;
        };

        if label.contains("ISBN-13") {
            let normalized = isbn::normalize(&value);
            if isbn::is_valid_isbn13(&normalized) {
                candidate.isbn13 = Some(normalized);
            }
        } else if label.contains("ISBN-10") {
            let normalized = isbn::normalize(&value);
            if isbn::is_valid_isbn10(&normalized) {
                candidate.isbn10 = Some(normalized);
            }
        } else if label.contains("Language") {
            candidate.language = Some(value);
        } else if label.contains("Print length") || label.contains("pages") {
            let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
            candidate.page_count = digits.parse().ok();
        }
    }

    Ok(())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
