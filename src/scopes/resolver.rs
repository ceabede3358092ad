//! Scope translation and satisfaction checks
//!
//! Translation is total: values outside the catalogue pass through
//! unchanged instead of failing, so tokens carrying scopes from newer API
//! versions are tolerated as opaque, non-matching entries.

use super::Scope;

/// Translate a short scope name to its canonical URL.
///
/// Unrecognized input is returned unchanged; the caller may already hold a
/// raw Google scope URL that is not in the catalogue.
pub fn to_url(name: &str) -> &str {
    Scope::from_name(name).map(Scope::url).unwrap_or(name)
}

/// Translate a canonical URL back to its short name.
///
/// Same pass-through-on-miss policy as [`to_url`].
pub fn to_name(url: &str) -> &str {
    Scope::from_url(url).map(Scope::name).unwrap_or(url)
}

/// Translate a list of short names element-wise.
///
/// Order and duplicates are preserved.
pub fn to_urls(names: &[String]) -> Vec<String> {
    names.iter().map(|n| to_url(n).to_string()).collect()
}

/// Normalize a granted scope, accepting either form.
fn normalize(scope: &str) -> Option<Scope> {
    Scope::from_name(scope).or_else(|| Scope::from_url(scope))
}

/// Decide whether any granted scope satisfies one of the scopes a tool
/// accepts.
///
/// Granted scopes may be short names or canonical URLs; a single match is
/// sufficient. The registry lists every scope that grants a capability,
/// including broader scopes that subsume narrower ones, so no subsumption
/// hierarchy is computed here.
pub fn is_authorized(granted: &[String], accepted: &[Scope]) -> bool {
    granted
        .iter()
        .filter_map(|s| normalize(s))
        .any(|s| accepted.contains(&s))
}

/// Split free-text scope input on runs of commas and whitespace.
///
/// Empty tokens are dropped; order and duplicates are preserved. An empty
/// input yields an empty list, never an error.
pub fn parse(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of checking scope names against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeValidation {
    /// True when every name is in the catalogue
    pub valid: bool,

    /// Names absent from the catalogue, in input order
    pub invalid: Vec<String>,
}

/// Check scope names against the known vocabulary.
///
/// This is a membership test over short names, independent of what the
/// process is authorized for. Canonical URLs are not accepted here.
pub fn validate(names: &[String]) -> ScopeValidation {
    let invalid: Vec<String> = names
        .iter()
        .filter(|n| Scope::from_name(n).is_none())
        .cloned()
        .collect();

    ScopeValidation {
        valid: invalid.is_empty(),
        invalid,
    }
}

/// Known short names, in definition order.
pub fn known_names() -> Vec<&'static str> {
    Scope::ALL.iter().map(|s| s.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_url_known() {
        assert_eq!(
            to_url("gmail.modify"),
            "https://www.googleapis.com/auth/gmail.modify"
        );
        assert_eq!(
            to_url("gmail.settings.sharing"),
            "https://www.googleapis.com/auth/gmail.settings.sharing"
        );
    }

    #[test]
    fn test_pass_through_on_miss() {
        assert_eq!(to_url("not.a.scope"), "not.a.scope");
        assert_eq!(to_name("https://unknown"), "https://unknown");
    }

    #[test]
    fn test_roundtrip_over_catalogue() {
        for name in known_names() {
            assert_eq!(to_name(to_url(name)), name);
        }
        for scope in Scope::ALL {
            assert_eq!(to_url(to_name(scope.url())), scope.url());
        }
    }

    #[test]
    fn test_to_urls_preserves_order_and_duplicates() {
        let input = strings(&["gmail.send", "bogus", "gmail.send"]);
        let urls = to_urls(&input);
        assert_eq!(
            urls,
            vec![
                "https://www.googleapis.com/auth/gmail.send",
                "bogus",
                "https://www.googleapis.com/auth/gmail.send",
            ]
        );
    }

    #[test]
    fn test_is_authorized_or_semantics() {
        assert!(is_authorized(
            &strings(&["gmail.readonly"]),
            &[Scope::Readonly, Scope::Modify]
        ));
        assert!(!is_authorized(&strings(&["gmail.compose"]), &[Scope::Modify]));
    }

    #[test]
    fn test_is_authorized_mixed_forms() {
        assert!(is_authorized(
            &strings(&["https://www.googleapis.com/auth/gmail.modify"]),
            &[Scope::Modify]
        ));
    }

    #[test]
    fn test_is_authorized_empty_granted() {
        assert!(!is_authorized(&[], &[Scope::Modify]));
    }

    #[test]
    fn test_is_authorized_ignores_unknown_granted() {
        assert!(!is_authorized(
            &strings(&["future.scope", "https://example.com/other"]),
            &[Scope::Modify]
        ));
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(
            parse("a, b  c,\nd"),
            vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse(""), Vec::<String>::new());
        assert_eq!(parse(" ,, \n"), Vec::<String>::new());
    }

    #[test]
    fn test_parse_preserves_duplicates() {
        assert_eq!(
            parse("gmail.modify gmail.modify"),
            vec!["gmail.modify".to_string(), "gmail.modify".to_string()]
        );
    }

    #[test]
    fn test_validate_reports_invalid_names() {
        let result = validate(&strings(&["gmail.modify", "bogus.scope"]));
        assert!(!result.valid);
        assert_eq!(result.invalid, vec!["bogus.scope".to_string()]);
    }

    #[test]
    fn test_validate_all_known() {
        let names: Vec<String> = known_names().iter().map(|s| s.to_string()).collect();
        let result = validate(&names);
        assert!(result.valid);
        assert!(result.invalid.is_empty());
    }

    #[test]
    fn test_validate_rejects_urls() {
        let result = validate(&strings(&["https://www.googleapis.com/auth/gmail.modify"]));
        assert!(!result.valid);
    }

    #[test]
    fn test_known_names_definition_order() {
        assert_eq!(
            known_names(),
            vec![
                "gmail.readonly",
                "gmail.modify",
                "gmail.compose",
                "gmail.send",
                "gmail.labels",
                "gmail.settings.basic",
                "gmail.settings.sharing",
            ]
        );
    }
}
