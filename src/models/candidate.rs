//! Candidate data structure.
//!
//! The normalized search-result record every source adapter produces.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Requested acquisition kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Ebook,
    Audiobook,
}

impl MediaKind {
    /// Stable lowercase name used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Ebook => "ebook",
            MediaKind::Audiobook => "audiobook",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ebook" | "book" => Ok(MediaKind::Ebook),
            "audiobook" | "audio" => Ok(MediaKind::Audiobook),
            other => Err(format!("unknown media kind '{other}'")),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized book metadata record from one search result.
///
/// Produced by source adapters and consumed by the aggregator; identity
/// between candidates is only established at dedupe time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Book title
    pub title: String,

    /// Author names in source order
    #[serde(default)]
    pub authors: Vec<String>,

    /// ISBN-10, normalized (no hyphens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn10: Option<String>,

    /// ISBN-13, normalized (no hyphens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,

    /// Amazon standard identification number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,

    /// Cover image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    /// Description or synopsis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Publication date (first of month/year when the source only gives a year)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,

    /// Page count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    /// Language code or name as reported by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Provider tag of the source adapter that produced this record
    pub provider: String,

    /// URL of the source record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Opaque passthrough fields consumed downstream (e.g. Readarr foreign IDs)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl Candidate {
    /// Create an empty candidate tagged with its provider.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    /// Whether this candidate carries any strong identifier.
    pub fn has_identifier(&self) -> bool {
        filled(&self.isbn13) || filled(&self.isbn10) || filled(&self.asin)
    }

    /// Fill every empty field on `self` from `other`.
    ///
    /// Field-level union: non-empty fields on `self` are never overwritten.
    /// Extension entries are unioned with `self` taking precedence on key
    /// collisions.
    pub fn merge_from(&mut self, other: &Candidate) {
        if self.title.trim().is_empty() && !other.title.trim().is_empty() {
            self.title = other.title.clone();
        }
        if self.authors.is_empty() && !other.authors.is_empty() {
            self.authors = other.authors.clone();
        }

        merge_field(&mut self.isbn10, &other.isbn10);
        merge_field(&mut self.isbn13, &other.isbn13);
        merge_field(&mut self.asin, &other.asin);
        merge_field(&mut self.cover_url, &other.cover_url);
        merge_field(&mut self.description, &other.description);
        merge_field(&mut self.language, &other.language);
        merge_field(&mut self.source_url, &other.source_url);

        if self.published.is_none() {
            self.published = other.published;
        }
        if self.page_count.is_none() {
            self.page_count = other.page_count;
        }

        for (key, value) in &other.extensions {
            self.extensions
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// Whether an optional string field carries content.
pub(crate) fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn merge_field(target: &mut Option<String>, source: &Option<String>) {
    if !filled(target) && filled(source) {
        *target = source.clone();
    }
}
