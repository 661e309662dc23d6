//! Per-occurrence substitution decision.

use crate::error::LookupFailure;
use crate::logging::log_substitution;
use crate::resolver::Resolver;
use crate::scanner::Occurrence;

/// Result of rewriting one user link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite<'a> {
    /// Cleaned user key, borrowed from the view
    pub key: &'a str,
    /// Bytes of the view consumed, start marker through closing sequence
    pub consumed: usize,
    pub display_name: String,
    /// Whether plain text replaced the macro
    pub substituted: bool,
}

/// Strips surrounding whitespace and enclosing quotes from a raw user key.
///
/// The directory's key format never includes the attribute quoting.
pub fn clean_reference_key(raw: &str) -> &str {
    raw.trim().trim_matches(|c: char| c == '"' || c == '\'').trim()
}

/// Resolves one occurrence and appends its replacement to `out`.
///
/// Resolvable people keep their macro byte for byte, stale cached names
/// included. Anyone else is replaced by the directory's display name.
/// The pass-through span before the macro is the caller's job.
pub fn rewrite_occurrence<'a, R>(
    view: &'a str,
    occurrence: &Occurrence,
    resolver: &R,
    out: &mut String,
) -> Result<Rewrite<'a>, LookupFailure>
where
    R: Resolver + ?Sized,
{
    let key = clean_reference_key(occurrence.raw_key(view));
    let resolution = resolver.resolve(key)?;

    if resolution.resolvable {
        out.push_str(occurrence.span(view));
    } else {
        log_substitution(key, &resolution.display_name);
        out.push_str(&resolution.display_name);
    }

    Ok(Rewrite {
        key,
        consumed: occurrence.byte_len(),
        display_name: resolution.display_name,
        substituted: !resolution.resolvable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Directory, Resolution};
    use crate::scanner::{find_next_macro, Scan, Terminator, MACRO_START};

    fn occurrence(view: &str) -> Occurrence {
        match find_next_macro(view) {
            Scan::Found(head) => head.close(view).unwrap(),
            other => panic!("expected a user link, got {:?}", other),
        }
    }

    fn directory() -> Directory {
        let mut dir = Directory::default();
        dir.insert_name("still-active-user", "Alex Active");
        dir.insert_person("ex-user", "Jane Doe", false);
        dir
    }

    #[test]
    fn test_clean_reference_key() {
        assert_eq!(clean_reference_key("\"8a09c088\" "), "8a09c088");
        assert_eq!(clean_reference_key("  'abc'\t"), "abc");
        assert_eq!(clean_reference_key("\" spaced \""), "spaced");
        assert_eq!(clean_reference_key("plain"), "plain");
        assert_eq!(clean_reference_key("\"\""), "");
    }

    #[test]
    fn test_resolvable_kept_verbatim() {
        let view = format!(
            "{}\"still-active-user\" {}Stale Name{}after",
            MACRO_START,
            Terminator::PlainTextBody.opening(),
            Terminator::PlainTextBody.closing().unwrap()
        );
        let occ = occurrence(&view);
        let mut out = String::new();

        let rewrite = rewrite_occurrence(&view, &occ, &directory(), &mut out).unwrap();
        assert!(!rewrite.substituted);
        assert_eq!(rewrite.key, "still-active-user");
        assert_eq!(rewrite.display_name, "Alex Active");
        assert_eq!(out, occ.span(&view));
        assert_eq!(&view[rewrite.consumed..], "after");
    }

    #[test]
    fn test_unresolvable_replaced_by_name() {
        let view = format!("{}\"ex-user\" {}", MACRO_START, Terminator::Bare.opening());
        let occ = occurrence(&view);
        let mut out = String::from("prefix ");

        let rewrite = rewrite_occurrence(&view, &occ, &directory(), &mut out).unwrap();
        assert!(rewrite.substituted);
        assert_eq!(out, "prefix Jane Doe");
        assert_eq!(rewrite.consumed, view.len());
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let view = format!("{}\"who\" {}", MACRO_START, Terminator::Bare.opening());
        let occ = occurrence(&view);
        let mut out = String::new();

        let err = rewrite_occurrence(&view, &occ, &directory(), &mut out).unwrap_err();
        assert_eq!(err.key, "who");
        assert!(out.is_empty());
    }

    #[test]
    fn test_resolver_sees_cleaned_key() {
        let view = format!("{}  \"k-42\"  {}", MACRO_START, Terminator::Bare.opening());
        let occ = occurrence(&view);
        let resolver = |key: &str| -> Result<Resolution, LookupFailure> {
            assert_eq!(key, "k-42");
            Ok(Resolution::departed("Gone"))
        };
        let mut out = String::new();
        rewrite_occurrence(&view, &occ, &resolver, &mut out).unwrap();
        assert_eq!(out, "Gone");
    }
}
