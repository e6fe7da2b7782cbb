// src/providers/readarr.rs

//! Readarr lookup adapter.
//!
//! Queries the `book/lookup` endpoint of the Readarr instance configured
//! for the request kind. Readarr-internal identifiers (`foreignBookId`,
//! `foreignEditionId`, `authorId`) are passed through unmodified as
//! extension fields so the downstream add flow can consume them without
//! this layer understanding their meaning.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::matching::CatalogSearcher;
use crate::models::{Candidate, Config, MediaKind, ReadarrInstance};
use crate::providers::{BookProvider, READARR};
use crate::utils::{http, non_empty};

/// Extension key for the Readarr book identifier.
pub const EXT_FOREIGN_BOOK_ID: &str = "foreign_book_id";

/// Extension key for the Readarr edition identifier.
pub const EXT_FOREIGN_EDITION_ID: &str = "foreign_edition_id";

/// Extension key for the Readarr author identifier.
pub const EXT_AUTHOR_ID: &str = "author_id";

/// One book from the lookup endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupBook {
    title: Option<String>,
    author: Option<LookupAuthor>,
    foreign_book_id: Option<Value>,
    foreign_edition_id: Option<Value>,
    isbn13: Option<String>,
    asin: Option<String>,
    overview: Option<String>,
    page_count: Option<u32>,
    release_date: Option<String>,
    remote_cover: Option<String>,
    #[serde(default)]
    images: Vec<LookupImage>,
    #[serde(default)]
    editions: Vec<LookupEdition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupAuthor {
    author_name: Option<String>,
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupEdition {
    foreign_edition_id: Option<Value>,
    isbn13: Option<String>,
    asin: Option<String>,
    page_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupImage {
    url: Option<String>,
}

/// Adapter for the Readarr lookup API.
///
/// Holds the instance endpoints for both media kinds; the kind given at
/// search time selects which one is queried.
pub struct ReadarrProvider {
    client: Client,
    ebook: Option<ReadarrInstance>,
    audiobook: Option<ReadarrInstance>,
    max_results: usize,
}

impl ReadarrProvider {
    /// Create an adapter over the configured instances.
    pub fn new(config: &Config) -> Result<Self> {
        let client = http::create_client(&config.http)?;
        Ok(Self {
            client,
            ebook: config.readarr.ebook.clone(),
            audiobook: config.readarr.audiobook.clone(),
            max_results: config.search.max_results_per_provider,
        })
    }

    fn instance(&self, kind: MediaKind) -> Result<&ReadarrInstance> {
        let instance = match kind {
            MediaKind::Ebook => self.ebook.as_ref(),
            MediaKind::Audiobook => self.audiobook.as_ref(),
        };
        instance.ok_or_else(|| {
            AppError::provider(READARR, format!("no {kind} instance configured"))
        })
    }

    /// Run one lookup term against the instance for the given kind.
    pub async fn lookup(&self, kind: MediaKind, term: &str) -> Result<Vec<Candidate>> {
        let instance = self.instance(kind)?;
        let url = format!(
            "{}/api/v1/book/lookup",
            instance.base_url.trim_end_matches('/')
        );

        let books: Vec<LookupBook> = self
            .client
            .get(&url)
            .query(&[("term", term)])
            .header("X-Api-Key", &instance.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(books
            .into_iter()
            .take(self.max_results)
            .filter_map(book_to_candidate)
            .collect())
    }
}

#[async_trait]
impl BookProvider for ReadarrProvider {
    fn name(&self) -> &'static str {
        READARR
    }

    fn supports(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Ebook => self.ebook.is_some(),
            MediaKind::Audiobook => self.audiobook.is_some(),
        }
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<Candidate>> {
        self.lookup(kind, query).await.map_err(|error| match error {
            tagged @ AppError::Provider { .. } => tagged,
            other => AppError::provider(READARR, other),
        })
    }
}

/// Catalog view of one Readarr instance, as used by the matcher.
pub struct ReadarrCatalog {
    provider: Arc<ReadarrProvider>,
    kind: MediaKind,
}

impl ReadarrCatalog {
    /// Bind the catalog to the instance serving the given kind.
    pub fn new(provider: Arc<ReadarrProvider>, kind: MediaKind) -> Self {
        Self { provider, kind }
    }
}

#[async_trait]
impl CatalogSearcher for ReadarrCatalog {
    async fn search_catalog(&self, term: &str) -> Result<Vec<Candidate>> {
        self.provider.lookup(self.kind, term).await
    }
}

/// Map one lookup book onto a candidate, skipping untitled entries.
fn book_to_candidate(book: LookupBook) -> Option<Candidate> {
    let title = book.title.as_deref().and_then(non_empty)?;
    let first_edition = book.editions.first();

    let mut candidate = Candidate {
        title,
        authors: book
            .author
            .as_ref()
            .and_then(|a| a.author_name.as_deref())
            .and_then(non_empty)
            .into_iter()
            .collect(),
        isbn13: book
            .isbn13
            .as_deref()
            .or(first_edition.and_then(|e| e.isbn13.as_deref()))
            .and_then(non_empty),
        asin: book
            .asin
            .as_deref()
            .or(first_edition.and_then(|e| e.asin.as_deref()))
            .and_then(non_empty),
        cover_url: book
            .remote_cover
            .as_deref()
            .and_then(non_empty)
            .or_else(|| book.images.iter().find_map(|i| i.url.as_deref().and_then(non_empty))),
        description: book.overview.as_deref().and_then(non_empty),
        published: book.release_date.as_deref().and_then(parse_release_date),
        page_count: book.page_count.or(first_edition.and_then(|e| e.page_count)),
        provider: READARR.to_string(),
        ..Candidate::default()
    };

    if let Some(id) = book.foreign_book_id.as_ref().and_then(value_to_string) {
        candidate.extensions.insert(EXT_FOREIGN_BOOK_ID.to_string(), id);
    }
    let edition_id = book
        .foreign_edition_id
        .as_ref()
        .or(first_edition.and_then(|e| e.foreign_edition_id.as_ref()))
        .and_then(value_to_string);
    if let Some(id) = edition_id {
        candidate
            .extensions
            .insert(EXT_FOREIGN_EDITION_ID.to_string(), id);
    }
    if let Some(id) = book.author.as_ref().and_then(|a| a.id) {
        candidate
            .extensions
            .insert(EXT_AUTHOR_ID.to_string(), id.to_string());
    }

    Some(candidate)
}

/// Readarr reports release dates as ISO timestamps or plain dates.
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Foreign IDs arrive as strings or numbers depending on Readarr version.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
