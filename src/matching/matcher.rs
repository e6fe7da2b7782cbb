// src/matching/matcher.rs

//! Identifier-priority matching against the acquisition catalog.
//!
//! Different upstream sources populate different identifier subsets, so the
//! match chain always probes the least ambiguous identifier available:
//! ISBN-13, then ISBN-10, then ASIN, then a fuzzy title/author comparison.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::matching::similarity;
use crate::models::{BookIdentifiers, Candidate, IdentifierRank, MatchingConfig, StoredRequest};
use crate::utils::isbn;

/// Search access to the target catalog (production: Readarr lookup).
#[async_trait]
pub trait CatalogSearcher: Send + Sync {
    /// Run one lookup term against the catalog.
    async fn search_catalog(&self, term: &str) -> Result<Vec<Candidate>>;
}

#[async_trait]
impl<S: CatalogSearcher> CatalogSearcher for Arc<S> {
    async fn search_catalog(&self, term: &str) -> Result<Vec<Candidate>> {
        self.as_ref().search_catalog(term).await
    }
}

/// Matches stored identifiers against catalog entries.
pub struct Matcher<S: CatalogSearcher> {
    catalog: S,
    config: MatchingConfig,
}

impl<S: CatalogSearcher> Matcher<S> {
    /// Create a matcher over the given catalog.
    pub fn new(catalog: S, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    /// Find the best existing catalog entry for the given identifiers.
    ///
    /// Returns `Ok(None)` when nothing matches above threshold; a missing
    /// match is not an error.
    pub async fn find_match(&self, identifiers: &BookIdentifiers) -> Result<Option<Candidate>> {
        Ok(self.run_chain(identifiers).await?.map(|(_, hit)| hit))
    }

    /// Backfill the selection payload of a previously-incomplete request.
    ///
    /// Runs the same priority chain over the stored identifiers (topped up
    /// from the existing payload) and keeps the stored payload whenever it
    /// already holds an identifier of equal or higher priority than what
    /// the chain discovers.
    pub async fn hydrate(&self, stored: &StoredRequest) -> Result<Option<Candidate>> {
        let identifiers = merged_identifiers(stored);
        let existing_rank = stored
            .selection
            .as_ref()
            .and_then(|c| BookIdentifiers::from_candidate(c).best_rank());

        match (existing_rank, self.run_chain(&identifiers).await?) {
            (Some(existing), Some((discovered, _))) if existing <= discovered => {
                log::debug!(
                    "hydrate keeps stored payload ({existing:?} beats discovered {discovered:?})"
                );
                Ok(stored.selection.clone())
            }
            (_, Some((_, hit))) => Ok(Some(hit)),
            (_, None) => Ok(stored.selection.clone()),
        }
    }

    /// Probe the catalog in identifier-priority order; first hit wins.
    async fn run_chain(
        &self,
        ids: &BookIdentifiers,
    ) -> Result<Option<(IdentifierRank, Candidate)>> {
        if let Some(isbn13) = filled(&ids.isbn13) {
            let target = isbn::normalize(&isbn13);
            let hit = self
                .lookup(&format!("isbn:{target}"), |c| matches_isbn13(c, &target))
                .await?;
            if let Some(hit) = hit {
                return Ok(Some((IdentifierRank::Isbn13, hit)));
            }
            log::debug!("no catalog match for ISBN-13 {target}");
        }

        if let Some(isbn10) = filled(&ids.isbn10) {
            let target = isbn::normalize(&isbn10);
            let converted = isbn::isbn10_to_isbn13(&target);
            let hit = self
                .lookup(&format!("isbn:{target}"), |c| {
                    matches_isbn10(c, &target, converted.as_deref())
                })
                .await?;
            if let Some(hit) = hit {
                return Ok(Some((IdentifierRank::Isbn10, hit)));
            }
            log::debug!("no catalog match for ISBN-10 {target}");
        }

        if let Some(asin) = filled(&ids.asin) {
            let target = isbn::normalize(&asin);
            let hit = self
                .lookup(&format!("asin:{target}"), |c| {
                    c.asin.as_deref().is_some_and(|a| isbn::eq_normalized(a, &target))
                })
                .await?;
            if let Some(hit) = hit {
                return Ok(Some((IdentifierRank::Asin, hit)));
            }
            log::debug!("no catalog match for ASIN {target}");
        }

        if let Some(title) = filled(&ids.title) {
            if let Some(hit) = self.fuzzy_lookup(&title, ids.author.as_deref()).await? {
                return Ok(Some((IdentifierRank::TitleAuthor, hit)));
            }
        }

        Ok(None)
    }

    async fn lookup<F>(&self, term: &str, is_exact: F) -> Result<Option<Candidate>>
    where
        F: Fn(&Candidate) -> bool,
    {
        let results = self.catalog.search_catalog(term).await?;
        Ok(results.into_iter().find(is_exact))
    }

    async fn fuzzy_lookup(&self, title: &str, author: Option<&str>) -> Result<Option<Candidate>> {
        let term = match author {
            Some(author) if !author.trim().is_empty() => format!("{title} {author}"),
            _ => title.to_string(),
        };
        let results = self.catalog.search_catalog(&term).await?;

        let mut best: Option<(f64, Candidate)> = None;
        for candidate in results {
            let title_score = similarity::similarity(title, &candidate.title);
            if title_score < self.config.title_threshold {
                continue;
            }

            let score = match author {
                Some(author) if !author.trim().is_empty() => {
                    let author_score = similarity::author_similarity(author, &candidate.authors);
                    if author_score < self.config.author_threshold {
                        continue;
                    }
                    title_score + author_score
                }
                _ => title_score,
            };

            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, candidate));
            }
        }

        Ok(best.map(|(_, candidate)| candidate))
    }
}

/// Stored identifiers topped up with whatever the existing payload carries.
fn merged_identifiers(stored: &StoredRequest) -> BookIdentifiers {
    let mut ids = stored.identifiers.clone();
    if let Some(selection) = &stored.selection {
        let from_payload = BookIdentifiers::from_candidate(selection);
        ids.isbn13 = ids.isbn13.or(from_payload.isbn13);
        ids.isbn10 = ids.isbn10.or(from_payload.isbn10);
        ids.asin = ids.asin.or(from_payload.asin);
        ids.title = ids.title.or(from_payload.title);
        ids.author = ids.author.or(from_payload.author);
    }
    ids
}

fn filled(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn matches_isbn13(candidate: &Candidate, target: &str) -> bool {
    if let Some(isbn13) = candidate.isbn13.as_deref() {
        if isbn::eq_normalized(isbn13, target) {
            return true;
        }
    }
    // The catalog entry may only list the ISBN-10 form of the same edition.
    candidate
        .isbn10
        .as_deref()
        .and_then(isbn::isbn10_to_isbn13)
        .is_some_and(|converted| converted == target)
}

fn matches_isbn10(candidate: &Candidate, target: &str, converted: Option<&str>) -> bool {
    if let Some(isbn10) = candidate.isbn10.as_deref() {
        if isbn::eq_normalized(isbn10, target) {
            return true;
        }
    }
    match (converted, candidate.isbn13.as_deref()) {
        (Some(expected), Some(isbn13)) => isbn::eq_normalized(isbn13, expected),
        _ => false,
    }
}
