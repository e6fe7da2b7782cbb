// src/aggregate/dedupe.rs

//! Candidate deduplication and merge.
//!
//! Two candidates within one aggregation pass are duplicates iff they share
//! a non-empty ISBN-13, ISBN-10, or ASIN, or, when neither side carries any
//! identifier, their normalized title and author similarities both clear
//! the configured thresholds. A later duplicate merges into the earlier
//! winner by field-level union.

use crate::matching::similarity;
use crate::models::{Candidate, MatchingConfig};
use crate::utils::isbn;

/// Deduplicate candidates, preserving discovery order.
///
/// The input order encodes provider priority (Amazon first), so the first
/// occurrence of an identity always wins and later duplicates only backfill
/// its empty fields.
pub fn dedupe_candidates(candidates: Vec<Candidate>, config: &MatchingConfig) -> Vec<Candidate> {
    let mut winners: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match winners
            .iter_mut()
            .find(|winner| is_duplicate(winner, &candidate, config))
        {
            Some(winner) => winner.merge_from(&candidate),
            None => winners.push(candidate),
        }
    }

    winners
}

/// The identity rule from the data model.
fn is_duplicate(a: &Candidate, b: &Candidate, config: &MatchingConfig) -> bool {
    if shares_field(&a.isbn13, &b.isbn13)
        || shares_field(&a.isbn10, &b.isbn10)
        || shares_field(&a.asin, &b.asin)
    {
        return true;
    }

    // The fuzzy rule only applies when neither side has any identifier.
    if a.has_identifier() || b.has_identifier() {
        return false;
    }
    if a.title.trim().is_empty() || b.title.trim().is_empty() {
        return false;
    }

    similarity::similarity(&a.title, &b.title) >= config.title_threshold
        && similarity::author_set_similarity(&a.authors, &b.authors) >= config.author_threshold
}

fn shares_field(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref(), b.as_deref()) {
        (Some(left), Some(right)) => isbn::eq_normalized(left, right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{AMAZON, OPEN_LIBRARY};

    fn with_isbn13(provider: &str, isbn13: &str) -> Candidate {
        Candidate {
            title: "The Great Gatsby".to_string(),
            authors: vec!["F. Scott Fitzgerald".to_string()],
            isbn13: Some(isbn13.to_string()),
            provider: provider.to_string(),
            ..Candidate::default()
        }
    }

    fn identifier_less(provider: &str, title: &str, author: &str) -> Candidate {
        Candidate {
            title: title.to_string(),
            authors: vec![author.to_string()],
            provider: provider.to_string(),
            ..Candidate::default()
        }
    }

    #[test]
    fn test_shared_isbn13_collapses_regardless_of_order() {
        let config = MatchingConfig::default();

        for (first, second) in [(AMAZON, OPEN_LIBRARY), (OPEN_LIBRARY, AMAZON)] {
            let merged = dedupe_candidates(
                vec![
                    with_isbn13(first, "9780743273565"),
                    with_isbn13(second, "978-0-7432-7356-5"),
                ],
                &config,
            );
            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].provider, first);
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let config = MatchingConfig::default();

        let mut amazon = with_isbn13(AMAZON, "9780743273565");
        amazon.asin = Some("B004EHZDE8".to_string());
        let open_library = with_isbn13(OPEN_LIBRARY, "9780743273565");
        let dune = identifier_less(OPEN_LIBRARY, "Dune", "Frank Herbert");

        let deduped = dedupe_candidates(vec![amazon, open_library, dune], &config);

        let mut doubled = deduped.clone();
        doubled.extend(deduped.clone());
        assert_eq!(dedupe_candidates(doubled, &config), deduped);
    }

    #[test]
    fn test_distinct_isbns_stay_separate() {
        let config = MatchingConfig::default();
        let merged = dedupe_candidates(
            vec![
                with_isbn13(AMAZON, "9780743273565"),
                with_isbn13(OPEN_LIBRARY, "9780306406157"),
            ],
            &config,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_fuzzy_rule_requires_identifier_less_sides() {
        let config = MatchingConfig::default();

        // Same title/author, but one side carries an identifier: no collapse.
        let merged = dedupe_candidates(
            vec![
                with_isbn13(AMAZON, "9780743273565"),
                identifier_less(OPEN_LIBRARY, "The Great Gatsby", "F. Scott Fitzgerald"),
            ],
            &config,
        );
        assert_eq!(merged.len(), 2);

        // Neither side has identifiers: fuzzy collapse applies.
        let merged = dedupe_candidates(
            vec![
                identifier_less(AMAZON, "The Great Gatsby", "F. Scott Fitzgerald"),
                identifier_less(OPEN_LIBRARY, "The Great Gatsby!", "F. Scott Fitzgerald"),
            ],
            &config,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].provider, AMAZON);
    }

    #[test]
    fn test_series_titles_do_not_collapse() {
        let config = MatchingConfig::default();
        let merged = dedupe_candidates(
            vec![
                identifier_less(AMAZON, "Dune", "Frank Herbert"),
                identifier_less(OPEN_LIBRARY, "Dune Messiah", "Frank Herbert"),
            ],
            &config,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_duplicate_backfills_winner_fields() {
        let config = MatchingConfig::default();

        let mut amazon = with_isbn13(AMAZON, "9780743273565");
        amazon.asin = Some("B004EHZDE8".to_string());

        let mut open_library = with_isbn13(OPEN_LIBRARY, "9780743273565");
        open_library.page_count = Some(180);
        open_library.language = Some("eng".to_string());

        let merged = dedupe_candidates(vec![amazon, open_library], &config);
        assert_eq!(merged.len(), 1);

        let winner = &merged[0];
        assert_eq!(winner.provider, AMAZON);
        assert_eq!(winner.asin.as_deref(), Some("B004EHZDE8"));
        assert_eq!(winner.page_count, Some(180));
        assert_eq!(winner.language.as_deref(), Some("eng"));
    }
}
