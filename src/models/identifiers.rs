// src/models/identifiers.rs

//! Identifier sets used by the catalog matcher.

use serde::{Deserialize, Serialize};

use crate::models::Candidate;
use crate::models::candidate::filled;

/// Priority rank of the strongest identifier a record carries.
///
/// Lower ranks are less ambiguous; acquisition always prefers the least
/// ambiguous identifier available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdentifierRank {
    Isbn13,
    Isbn10,
    Asin,
    TitleAuthor,
}

/// A partial identifier set for one book.
///
/// Different upstream sources populate different subsets; any field may be
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookIdentifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn10: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl BookIdentifiers {
    /// Extract the identifiers a candidate carries.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self {
            isbn13: candidate.isbn13.clone().filter(|v| !v.trim().is_empty()),
            isbn10: candidate.isbn10.clone().filter(|v| !v.trim().is_empty()),
            asin: candidate.asin.clone().filter(|v| !v.trim().is_empty()),
            title: if candidate.title.trim().is_empty() {
                None
            } else {
                Some(candidate.title.clone())
            },
            author: candidate.authors.first().cloned(),
        }
    }

    /// Whether no usable field is present at all.
    pub fn is_empty(&self) -> bool {
        self.best_rank().is_none()
    }

    /// Rank of the strongest identifier present, if any.
    pub fn best_rank(&self) -> Option<IdentifierRank> {
        if filled(&self.isbn13) {
            Some(IdentifierRank::Isbn13)
        } else if filled(&self.isbn10) {
            Some(IdentifierRank::Isbn10)
        } else if filled(&self.asin) {
            Some(IdentifierRank::Asin)
        } else if filled(&self.title) {
            Some(IdentifierRank::TitleAuthor)
        } else {
            None
        }
    }
}

/// Minimal view of a persisted request, as read by the hydration path.
///
/// The request lifecycle itself is owned by the request service; this core
/// only reads the stored identifiers and the optional selection payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRequest {
    /// Identifiers captured when the request was submitted
    pub identifiers: BookIdentifiers,

    /// Attached selection payload, absent on under-specified requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Candidate>,
}
