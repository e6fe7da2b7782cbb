//! Source adapters for the aggregation core.
//!
//! Each adapter turns one external API or HTML shape into the common
//! [`Candidate`] record:
//! - Amazon public search pages (`AmazonProvider`)
//! - Open Library search API (`OpenLibraryProvider`)
//! - Readarr lookup API (`ReadarrProvider`)

mod amazon;
mod open_library;
mod readarr;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Candidate, MediaKind};

pub use amazon::AmazonProvider;
pub use open_library::OpenLibraryProvider;
pub use readarr::{ReadarrCatalog, ReadarrProvider};

/// Provider tag for the Amazon scraper adapter.
pub const AMAZON: &str = "amazon";

/// Provider tag for the Open Library adapter.
pub const OPEN_LIBRARY: &str = "open_library";

/// Provider tag for the Readarr lookup adapter.
pub const READARR: &str = "readarr";

/// Contract for a single book-metadata source.
///
/// Each adapter is independently fallible; a failing adapter surfaces an
/// error to the aggregator, which records it against the source and moves
/// on with the other providers.
#[async_trait]
pub trait BookProvider: Send + Sync {
    /// Stable provider tag, used in logs and per-provider result counts.
    fn name(&self) -> &'static str;

    /// Whether this adapter can serve results for the given media kind.
    fn supports(&self, kind: MediaKind) -> bool;

    /// Run a free-text search and produce normalized candidates.
    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<Candidate>>;
}
