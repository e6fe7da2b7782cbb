// src/utils/isbn.rs

//! ISBN normalization and validation utilities.

/// Normalize an ISBN or ASIN-like identifier for comparison.
///
/// Strips hyphens and whitespace and uppercases the result, so
/// `978-0-7432-7356-5` and `9780743273565` compare equal.
///
/// # Examples
/// ```
/// use bookscout::utils::isbn::normalize;
///
/// assert_eq!(normalize("978-0-7432-7356-5"), "9780743273565");
/// assert_eq!(normalize("0 8044 2957 x"), "080442957X");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Check whether a normalized string is a valid ISBN-13.
pub fn is_valid_isbn13(isbn: &str) -> bool {
    let normalized = normalize(isbn);
    if normalized.len() != 13 || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = normalized
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let digit = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();

    sum % 10 == 0
}

/// Check whether a normalized string is a valid ISBN-10.
///
/// The final position may be `X`, representing a check value of 10.
pub fn is_valid_isbn10(isbn: &str) -> bool {
    let normalized = normalize(isbn);
    if normalized.len() != 10 {
        return false;
    }

    let mut sum: u32 = 0;
    for (i, c) in normalized.chars().enumerate() {
        let value = match c {
            '0'..='9' => c.to_digit(10).unwrap_or(0),
            'X' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }

    sum % 11 == 0
}

/// Convert an ISBN-10 into its ISBN-13 form (978 prefix, recomputed check digit).
///
/// Returns `None` if the input is not a valid ISBN-10.
pub fn isbn10_to_isbn13(isbn10: &str) -> Option<String> {
    let normalized = normalize(isbn10);
    if !is_valid_isbn10(&normalized) {
        return None;
    }

    let body: String = format!("978{}", &normalized[..9]);
    let sum: u32 = body
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let digit = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();
    let check = (10 - (sum % 10)) % 10;

    Some(format!("{body}{check}"))
}

/// Compare two identifiers for equality after normalization.
pub fn eq_normalized(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("978-0-7432-7356-5"), "9780743273565");
        assert_eq!(normalize(" 0306406152 "), "0306406152");
        assert_eq!(normalize("080442957x"), "080442957X");
    }

    #[test]
    fn test_valid_isbn13() {
        assert!(is_valid_isbn13("9780743273565"));
        assert!(is_valid_isbn13("978-0-306-40615-7"));
        assert!(!is_valid_isbn13("9780743273566"));
        assert!(!is_valid_isbn13("97807432735"));
        assert!(!is_valid_isbn13("97807432735ab"));
    }

    #[test]
    fn test_valid_isbn10() {
        assert!(is_valid_isbn10("0306406152"));
        assert!(is_valid_isbn10("0-8044-2957-X"));
        assert!(!is_valid_isbn10("0306406153"));
        assert!(!is_valid_isbn10("030640615"));
    }

    #[test]
    fn test_isbn10_to_isbn13() {
        assert_eq!(
            isbn10_to_isbn13("0306406152"),
            Some("9780306406157".to_string())
        );
        assert_eq!(
            isbn10_to_isbn13("0743273567"),
            Some("9780743273565".to_string())
        );
        assert_eq!(isbn10_to_isbn13("0306406153"), None);
    }

    #[test]
    fn test_eq_normalized() {
        assert!(eq_normalized("978-0743273565", "9780743273565"));
        assert!(eq_normalized("b004ehzde8", "B004EHZDE8"));
        assert!(!eq_normalized("", ""));
        assert!(!eq_normalized("9780743273565", "9780306406157"));
    }
}
