//! Preprocessor conditionals (`ifdef::` / `ifndef::` / `endif::`).

use std::sync::LazyLock;

use regex::Regex;

use crate::attributes::AttributeStore;

static CONDITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^if(n)?def::([^\[]+)\[(.*)\]$").unwrap());

static ENDIF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^endif::[^\[]*\[\]$").unwrap());

/// A parsed `ifdef::` or `ifndef::` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional<'a> {
    negated: bool,
    names: &'a str,
    /// Inline content of the single-line form, `None` for the block form.
    pub text: Option<&'a str>,
}

impl<'a> Conditional<'a> {
    /// Parse a directive line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = CONDITIONAL_RE.captures(line)?;
        let names = caps.get(2).map_or("", |m| m.as_str());
        let text = caps.get(3).map(|m| m.as_str()).filter(|t| !t.is_empty());
        Some(Self {
            negated: caps.get(1).is_some(),
            names,
            text,
        })
    }

    /// Evaluate the directive against attribute membership.
    ///
    /// `a,b` holds when any name is defined, `a+b` when all are.
    pub fn is_active(&self, attributes: &AttributeStore) -> bool {
        let defined = if self.names.contains('+') {
            self.names
                .split('+')
                .all(|name| attributes.contains(name.trim()))
        } else {
            self.names
                .split(',')
                .any(|name| attributes.contains(name.trim()))
        };
        defined != self.negated
    }
}

/// Check for a conditional terminator (`endif::[]` or `endif::name[]`).
pub fn is_endif(line: &str) -> bool {
    line.starts_with("endif::") && ENDIF_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn store(names: &[&str]) -> AttributeStore {
        let seed: BTreeMap<String, String> = names
            .iter()
            .map(|name| ((*name).to_owned(), String::new()))
            .collect();
        AttributeStore::with_seed(&seed)
    }

    #[test]
    fn test_parse_block_form() {
        let directive = Conditional::parse("ifdef::flag[]").unwrap();
        assert!(directive.text.is_none());
        assert!(!directive.negated);
    }

    #[test]
    fn test_parse_single_line_form() {
        let directive = Conditional::parse("ifndef::bar[{foo}]").unwrap();
        assert_eq!(directive.text, Some("{foo}"));
        assert!(directive.negated);
    }

    #[test]
    fn test_single_line_form_keeps_inner_brackets() {
        let directive = Conditional::parse("ifdef::env-github[image:badge.svg[CI]]").unwrap();
        assert_eq!(directive.text, Some("image:badge.svg[CI]"));
    }

    #[test]
    fn test_not_a_directive() {
        assert!(Conditional::parse("ifdef::flag").is_none());
        assert!(Conditional::parse("if you define::flag[]").is_none());
    }

    #[test]
    fn test_ifdef_polarity() {
        let attributes = store(&["flag"]);
        assert!(Conditional::parse("ifdef::flag[]").unwrap().is_active(&attributes));
        assert!(!Conditional::parse("ifdef::other[]").unwrap().is_active(&attributes));
    }

    #[test]
    fn test_ifndef_polarity() {
        let attributes = store(&["flag"]);
        assert!(!Conditional::parse("ifndef::flag[]").unwrap().is_active(&attributes));
        assert!(Conditional::parse("ifndef::other[]").unwrap().is_active(&attributes));
    }

    #[test]
    fn test_any_and_all_names() {
        let attributes = store(&["a"]);
        assert!(Conditional::parse("ifdef::a,b[]").unwrap().is_active(&attributes));
        assert!(!Conditional::parse("ifdef::a+b[]").unwrap().is_active(&attributes));
        assert!(Conditional::parse("ifndef::a+b[]").unwrap().is_active(&attributes));
    }

    #[test]
    fn test_empty_value_counts_as_defined() {
        let attributes = store(&["badges"]);
        assert!(Conditional::parse("ifdef::badges[]").unwrap().is_active(&attributes));
    }

    #[test]
    fn test_endif_forms() {
        assert!(is_endif("endif::[]"));
        assert!(is_endif("endif::flag[]"));
        assert!(!is_endif("endif::[x]"));
        assert!(!is_endif("endif"));
    }
}
