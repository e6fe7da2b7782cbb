//! Catalog matching for the aggregation core.
//!
//! - `Matcher`: identifier-priority match and hydration over a catalog
//! - `similarity`: normalized fuzzy text comparison

mod matcher;
pub mod similarity;

pub use matcher::{CatalogSearcher, Matcher};
