/// Normalize a string for matching. Company search is case-insensitive
/// substring containment, nothing fancier.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
}

/// The query is trimmed before matching: surrounding whitespace never
/// narrows a search, and a whitespace-only query is the blank query.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(normalize(trimmed))
    }
}

pub fn company_matches(company: &str, normalized_query: &str) -> bool {
    normalize(company).contains(normalized_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_normalize_to_none() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("   "), None);
        assert_eq!(normalize_query(" Acme "), Some("acme".to_string()));
    }

    #[test]
    fn matching_ignores_case() {
        assert!(company_matches("Acme Widgets", "acm"));
        assert!(company_matches("ACME", "acme"));
        assert!(!company_matches("Beta", "acme"));
    }

    #[test]
    fn surrounding_whitespace_never_narrows_a_query() {
        let needle = normalize_query(" Acme ").unwrap();
        assert!(company_matches("Acme", &needle));
        assert!(company_matches("Acme Widgets", &needle));
    }
}
