//! Shared repository utilities.

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("serum"), "%serum%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
