// src/lib.rs

//! bookscout library
//!
//! Provider aggregation and catalog matching for a self-hosted book
//! request system.

pub mod aggregate;
pub mod error;
pub mod matching;
pub mod models;
pub mod providers;
pub mod utils;
