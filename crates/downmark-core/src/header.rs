//! Document header lines below the title.

use std::sync::LazyLock;

use regex::Regex;

use crate::attributes::AttributeStore;

/// One to three name tokens with an optional email, repeated with `; `.
static AUTHOR_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\p{Alphabetic}0-9_]+(?: +[\p{Alphabetic}0-9_]+){0,2}(?: +<[^>]+>)?(?:; |$))+$")
        .unwrap()
});

static REVISION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d[\w.]*)(?:,\s*([^:]+?))?(?::\s*(.+))?$").unwrap()
});

/// An author parsed from the author line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
}

/// Parse an author line, `None` if the line does not match the grammar.
pub fn parse_author_line(line: &str) -> Option<Vec<Author<'_>>> {
    if !AUTHOR_LINE_RE.is_match(line) {
        return None;
    }
    let authors = line
        .split("; ")
        .map(|entry| match entry.split_once(" <") {
            Some((name, email)) => Author {
                name: name.trim(),
                email: email.strip_suffix('>'),
            },
            None => Author {
                name: entry.trim(),
                email: None,
            },
        })
        .collect();
    Some(authors)
}

/// Revision information (`v1.0, 2024-01-01: remark`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision<'a> {
    pub number: &'a str,
    pub date: Option<&'a str>,
    pub remark: Option<&'a str>,
}

/// Parse a revision line.
pub fn parse_revision_line(line: &str) -> Option<Revision<'_>> {
    let caps = REVISION_LINE_RE.captures(line)?;
    Some(Revision {
        number: caps.get(1)?.as_str(),
        date: caps.get(2).map(|m| m.as_str().trim()),
        remark: caps.get(3).map(|m| m.as_str().trim()),
    })
}

/// Store author attributes (`author`, `authors`, `email`, `firstname`,
/// `lastname`) for the first author.
pub fn apply_authors(authors: &[Author<'_>], attributes: &mut AttributeStore) {
    let Some(first) = authors.first() else {
        return;
    };
    let names: Vec<&str> = authors.iter().map(|author| author.name).collect();
    attributes.set_literal("author", first.name);
    attributes.set_literal("authors", &names.join(", "));

    let mut words = first.name.split_whitespace();
    if let Some(firstname) = words.next() {
        attributes.set_literal("firstname", firstname);
    }
    if let Some(lastname) = words.next_back() {
        attributes.set_literal("lastname", lastname);
    }
    if let Some(email) = first.email {
        attributes.set_literal("email", email);
    }
}

/// Store revision attributes (`revnumber`, `revdate`, `revremark`).
pub fn apply_revision(revision: &Revision<'_>, attributes: &mut AttributeStore) {
    attributes.set_literal("revnumber", revision.number);
    if let Some(date) = revision.date {
        attributes.set_literal("revdate", date);
    }
    if let Some(remark) = revision.remark {
        attributes.set_literal("revremark", remark);
    }
}
