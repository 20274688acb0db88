//! Free-text search helpers used by the filter predicates.
//!
//! Semantics:
//! - '+' splits a query into terms that must ALL match
//! - ASCII case-insensitive substring matching
//! - a term that looks like a phone number also matches on digits only,
//!   so "98765 43210" finds "+91-9876543210"

/// Parse a search query into individual lowercased terms.
///
/// # Examples
/// - "ravi" -> ["ravi"]
/// - "ravi+pune" -> ["ravi", "pune"]
/// - "  ravi + pune  " -> ["ravi", "pune"]
/// - "" -> []
pub fn parse_search_terms(query: &str) -> Vec<String> {
    query
        .split('+')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check if text contains a search term (ASCII case-insensitive)
pub fn text_contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let text = text.as_bytes();
    let term = term.as_bytes();
    if text.len() < term.len() {
        return false;
    }
    text.windows(term.len())
        .any(|window| window.eq_ignore_ascii_case(term))
}

/// Keep only ASCII digits ("+91 98765-43210" -> "919876543210")
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn looks_like_phone(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
        && term
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
}

/// A term matches a set of fields if any one field contains it.
pub fn fields_contain_term(fields: &[&str], term: &str) -> bool {
    if fields.iter().any(|f| text_contains_term(f, term)) {
        return true;
    }
    if looks_like_phone(term) {
        let needle = digits_only(term);
        return fields
            .iter()
            .any(|f| digits_only(f).contains(needle.as_str()));
    }
    false
}

/// Every term must be found in at least one of the fields.
/// No terms matches everything.
pub fn fields_contain_all_terms(fields: &[&str], terms: &[String]) -> bool {
    terms.iter().all(|term| fields_contain_term(fields, term))
}
