//! SQL utility functions

use crate::core::constants::MAX_IDENTIFIER_LEN;

/// Validate a table identifier and return it double-quoted for splicing into SQL
///
/// Only `[A-Za-z_][A-Za-z0-9_]*` names are accepted, so the quoted form never
/// needs escaping. Returns `None` for anything else.
///
/// # Example
///
/// ```
/// use tracetable_server::utils::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("otel_traces").as_deref(), Some("\"otel_traces\""));
/// assert_eq!(quote_identifier("traces; DROP TABLE x"), None);
/// ```
pub fn quote_identifier(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(format!("\"{}\"", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_plain() {
        assert_eq!(quote_identifier("traces").as_deref(), Some("\"traces\""));
    }

    #[test]
    fn test_quote_identifier_underscore_and_digits() {
        assert_eq!(
            quote_identifier("_agent_traces_2").as_deref(),
            Some("\"_agent_traces_2\"")
        );
    }

    #[test]
    fn test_quote_identifier_rejects_empty() {
        assert_eq!(quote_identifier(""), None);
    }

    #[test]
    fn test_quote_identifier_rejects_leading_digit() {
        assert_eq!(quote_identifier("1traces"), None);
    }

    #[test]
    fn test_quote_identifier_rejects_injection() {
        assert_eq!(quote_identifier("t\"; DROP TABLE t; --"), None);
        assert_eq!(quote_identifier("a b"), None);
        assert_eq!(quote_identifier("schema.table"), None);
    }

    #[test]
    fn test_quote_identifier_rejects_too_long() {
        let name = "t".repeat(MAX_IDENTIFIER_LEN + 1);
        assert_eq!(quote_identifier(&name), None);
        let name = "t".repeat(MAX_IDENTIFIER_LEN);
        assert!(quote_identifier(&name).is_some());
    }
}
