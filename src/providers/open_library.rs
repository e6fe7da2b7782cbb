// src/providers/open_library.rs

//! Open Library search adapter.
//!
//! Queries the public `search.json` endpoint and maps response documents
//! directly onto candidates. The cheapest and most reliable source, but the
//! sparsest metadata.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, MediaKind};
use crate::providers::{BookProvider, OPEN_LIBRARY};
use crate::utils::{http, isbn};

const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Fields requested from the search endpoint, keeping payloads small.
const SEARCH_FIELDS: &str =
    "key,title,author_name,isbn,cover_i,first_publish_year,number_of_pages_median,language";

/// Search response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

/// One work document from the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    isbn: Vec<String>,
    cover_i: Option<i64>,
    first_publish_year: Option<i32>,
    number_of_pages_median: Option<u32>,
    #[serde(default)]
    language: Vec<String>,
}

/// Adapter for the Open Library keyword search API.
pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl OpenLibraryProvider {
    /// Create an adapter for the public openlibrary.org endpoint.
    pub fn new(config: &Config) -> Result<Self> {
        let client = http::create_client(&config.http)?;
        Ok(Self::with_base_url(client, DEFAULT_BASE_URL, config))
    }

    /// Create an adapter against a custom base URL.
    pub fn with_base_url(client: Client, base_url: impl Into<String>, config: &Config) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_results: config.search.max_results_per_provider,
        }
    }

    async fn search_impl(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = format!("{}/search.json", self.base_url);
        let limit = self.max_results.to_string();
        let response: SearchResponse = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("fields", SEARCH_FIELDS),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .docs
            .into_iter()
            .filter_map(|doc| doc_to_candidate(doc, &self.base_url))
            .collect())
    }
}

#[async_trait]
impl BookProvider for OpenLibraryProvider {
    fn name(&self) -> &'static str {
        OPEN_LIBRARY
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    async fn search(&self, query: &str, _kind: MediaKind) -> Result<Vec<Candidate>> {
        self.search_impl(query).await.map_err(|error| match error {
            tagged @ AppError::Provider { .. } => tagged,
            other => AppError::provider(OPEN_LIBRARY, other),
        })
    }
}

/// Map one search document onto a candidate, skipping untitled entries.
fn doc_to_candidate(doc: SearchDoc, base_url: &str) -> Option<Candidate> {
    let title = doc.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

    let isbn13 = doc
        .isbn
        .iter()
        .find(|raw| isbn::is_valid_isbn13(raw))
        .map(|raw| isbn::normalize(raw));
    let isbn10 = doc
        .isbn
        .iter()
        .find(|raw| isbn::is_valid_isbn10(raw))
        .map(|raw| isbn::normalize(raw));

    Some(Candidate {
        title: title.to_string(),
        authors: doc.author_name.clone(),
        isbn10,
        isbn13,
        cover_url: doc
            .cover_i
            .map(|id| format!("https://covers.openlibrary.org/b/id/{id}-L.jpg")),
        published: doc
            .first_publish_year
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        page_count: doc.number_of_pages_median,
        language: doc.language.first().cloned(),
        provider: OPEN_LIBRARY.to_string(),
        source_url: doc.key.as_deref().map(|key| format!("{base_url}{key}")),
        ..Candidate::default()
    })
}
