//! Centralized validation and helper functions.

/// Maximum number of genes accepted from one annotation
pub const MAX_GENES: usize = 100_000;

/// Maximum number of reactions accepted from one metabolic network
pub const MAX_REACTIONS: usize = 200_000;

/// Maximum number of curation entries accepted from all sources combined
pub const MAX_CURATION_ENTRIES: usize = 500_000;

/// Maximum number of homology matches read from one table
pub const MAX_HOMOLOGY_MATCHES: usize = 5_000_000;

/// Maximum identifier length
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Check that an identifier is usable as a model key.
///
/// Identifiers must be non-empty, at most [`MAX_IDENTIFIER_LENGTH`] bytes and
/// free of whitespace and control characters.
///
/// # Examples
///
/// ```
/// use me_builder::utils::validation::is_valid_identifier;
///
/// assert!(is_valid_identifier("b0001"));
/// assert!(is_valid_identifier("glc__D_c"));
/// assert!(!is_valid_identifier("two words"));
/// assert!(!is_valid_identifier(""));
/// ```
#[must_use]
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_IDENTIFIER_LENGTH
        && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Compute a signature hash over a collection of strings.
///
/// The signature is computed by:
/// 1. Sorting the items
/// 2. Joining them with newlines
/// 3. Computing MD5 of the concatenated string
///
/// This provides an order-independent identifier for a set of records.
#[must_use]
pub fn compute_signature<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    let concatenated = sorted.join("\n");
    let digest = md5::compute(concatenated.as_bytes());
    format!("{digest:x}")
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize, max: usize, what: &str) -> Option<String> {
    if count >= max {
        Some(format!(
            "Too many {what}: adding another would exceed maximum of {max}"
        ))
    } else {
        None
    }
}

/// Format a coefficient compactly and deterministically
#[must_use]
pub fn format_coefficient(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.6e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("RNAP_b3067"));
        assert!(is_valid_identifier("formation_CPLX_dummy"));
        assert!(!is_valid_identifier("tab\there"));
        assert!(!is_valid_identifier(&"x".repeat(MAX_IDENTIFIER_LENGTH + 1)));
    }

    #[test]
    fn test_compute_signature() {
        let items = vec!["b".to_string(), "a".to_string()];
        let sig = compute_signature(&items);
        assert_eq!(sig.len(), 32);

        // Order of input does not matter
        let reversed = vec!["a".to_string(), "b".to_string()];
        assert_eq!(sig, compute_signature(&reversed));

        // Empty input gives empty string
        let empty: Vec<String> = Vec::new();
        assert_eq!(compute_signature(&empty), "");
    }

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(10, 100, "genes").is_none());
        assert!(check_record_limit(99, 100, "genes").is_none());
        assert!(check_record_limit(100, 100, "genes").is_some());
        assert!(check_record_limit(101, 100, "genes")
            .unwrap()
            .contains("genes"));
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(-2.0), "-2");
        assert_eq!(format_coefficient(0.5), "5.000000e-1");
    }
}
