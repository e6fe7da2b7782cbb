//! bookscout CLI
//!
//! Operator entry point for driving searches and catalog match checks
//! against the configured providers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use bookscout::{
    aggregate::{Aggregator, SearchOutcome},
    error::Result,
    matching::Matcher,
    models::{BookIdentifiers, Candidate, Config, MediaKind},
    providers::{ReadarrCatalog, ReadarrProvider},
};

/// bookscout - Book Metadata Aggregation
#[derive(Parser, Debug)]
#[command(
    name = "bookscout",
    version,
    about = "Searches book metadata providers and matches against a Readarr catalog"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "bookscout.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search all enabled providers and print the merged results
    Search {
        /// Free-text query
        query: String,

        /// Media kind: ebook or audiobook
        #[arg(long, default_value = "ebook")]
        kind: String,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Match identifiers against the configured Readarr catalog
    Match {
        #[arg(long)]
        isbn13: Option<String>,

        #[arg(long)]
        isbn10: Option<String>,

        #[arg(long)]
        asin: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Media kind: ebook or audiobook
        #[arg(long, default_value = "ebook")]
        kind: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_kind(kind: &str) -> Result<MediaKind> {
    kind.parse()
        .map_err(bookscout::error::AppError::invalid_query)
}

fn print_candidate(index: usize, candidate: &Candidate) {
    let authors = if candidate.authors.is_empty() {
        "unknown author".to_string()
    } else {
        candidate.authors.join(", ")
    };
    println!("{:2}. {} - {}", index + 1, candidate.title, authors);
    println!("    provider: {}", candidate.provider);

    let mut identifiers = Vec::new();
    if let Some(isbn13) = &candidate.isbn13 {
        identifiers.push(format!("ISBN-13 {isbn13}"));
    }
    if let Some(isbn10) = &candidate.isbn10 {
        identifiers.push(format!("ISBN-10 {isbn10}"));
    }
    if let Some(asin) = &candidate.asin {
        identifiers.push(format!("ASIN {asin}"));
    }
    if !identifiers.is_empty() {
        println!("    {}", identifiers.join(", "));
    }
    for (key, value) in &candidate.extensions {
        println!("    {key}: {value}");
    }
}

fn print_outcome(outcome: &SearchOutcome) {
    for (index, candidate) in outcome.candidates.iter().enumerate() {
        print_candidate(index, candidate);
    }

    let contributions: Vec<String> = outcome
        .provider_results
        .iter()
        .map(|(name, count)| format!("{name}: {count}"))
        .collect();
    println!();
    println!(
        "{} result(s) [{}]",
        outcome.candidates.len(),
        contributions.join(", ")
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Search { query, kind, json } => {
            let kind = parse_kind(&kind)?;
            let aggregator = Aggregator::new(&config)?;
            let outcome = aggregator.search(&query, kind).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }

        Command::Match {
            isbn13,
            isbn10,
            asin,
            title,
            author,
            kind,
        } => {
            let kind = parse_kind(&kind)?;
            let identifiers = BookIdentifiers {
                isbn13,
                isbn10,
                asin,
                title,
                author,
            };
            if identifiers.is_empty() {
                return Err(bookscout::error::AppError::invalid_query(
                    "provide at least one of --isbn13, --isbn10, --asin, --title",
                ));
            }

            let provider = Arc::new(ReadarrProvider::new(&config)?);
            let catalog = ReadarrCatalog::new(provider, kind);
            let matcher = Matcher::new(catalog, config.matching.clone());

            match matcher.find_match(&identifiers).await? {
                Some(hit) => {
                    log::info!("Catalog match found");
                    print_candidate(0, &hit);
                }
                None => log::info!("No catalog match above threshold"),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK (providers, readarr instances, thresholds)");
        }
    }

    Ok(())
}
