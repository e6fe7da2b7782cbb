// src/models/mod.rs

//! Domain models for the aggregation core.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod candidate;
mod config;
mod identifiers;

// Re-export all public types
pub use candidate::{Candidate, MediaKind};
pub use config::{
    Config, HttpConfig, MatchingConfig, ProviderToggles, ReadarrConfig, ReadarrInstance,
    SearchConfig,
};
pub use identifiers::{BookIdentifiers, IdentifierRank, StoredRequest};
