// src/matching/similarity.rs

//! Normalized text similarity for fuzzy title/author comparison.

/// Normalize text for comparison: casefold, strip punctuation, collapse
/// whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() { c } else { ' ' }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two strings after normalization, in `[0.0, 1.0]`.
///
/// Returns `0.0` when either side normalizes to nothing; a blank field can
/// never establish identity.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_normalized = normalize(a);
    let b_normalized = normalize(b);
    if a_normalized.is_empty() || b_normalized.is_empty() {
        return 0.0;
    }
    strsim::jaro_winkler(&a_normalized, &b_normalized)
}

/// Best similarity between one author name and a candidate's author list.
pub fn author_similarity(author: &str, authors: &[String]) -> f64 {
    authors
        .iter()
        .map(|candidate| similarity(author, candidate))
        .fold(0.0, f64::max)
}

/// Author-set similarity used by the dedupe identity rule.
///
/// Two records with no author information at all are vacuously similar;
/// author data on only one side means the sets cannot be compared.
pub fn author_set_similarity(a: &[String], b: &[String]) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => a
            .iter()
            .map(|name| author_similarity(name, b))
            .fold(0.0, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("The Great Gatsby!"), "the great gatsby");
        assert_eq!(normalize("  Fitzgerald,   F. Scott "), "fitzgerald f scott");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn test_identical_after_normalization() {
        assert!((similarity("DUNE", "Dune") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("Frank Herbert", "frank herbert!") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_series_titles_stay_below_strict_threshold() {
        let score = similarity("Dune", "Dune Messiah");
        assert!(score < 0.90, "got {score}");
        assert!(score > 0.5);
    }

    #[test]
    fn test_blank_side_scores_zero() {
        assert_eq!(similarity("", "Dune"), 0.0);
        assert_eq!(similarity("Dune", "  "), 0.0);
    }

    #[test]
    fn test_author_similarity_takes_best() {
        let authors = vec!["Neil Gaiman".to_string(), "Terry Pratchett".to_string()];
        assert!(author_similarity("terry pratchett", &authors) > 0.99);
    }

    #[test]
    fn test_author_set_similarity_edge_cases() {
        assert_eq!(author_set_similarity(&[], &[]), 1.0);
        assert_eq!(author_set_similarity(&[], &["Frank Herbert".to_string()]), 0.0);
    }
}
