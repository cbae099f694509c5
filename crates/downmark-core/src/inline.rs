//! Inline substitutions for running text.
//!
//! Substitutions run in a fixed order on each line of a paragraph, list
//! item or admonition:
//!
//! 1. emphasis (`*bold*`, `_italic_`), skipping backtick spans
//! 2. attribute references
//! 3. link and image macros
//! 4. cross-references
//! 5. monospace escapes
//!
//! Emphasis runs first so attribute values are inserted verbatim. The
//! contents of `` `+text+` `` passthroughs are set aside before the first
//! step and put back after the last.

use std::borrow::Cow;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::attributes::AttributeStore;
use crate::syntax::BlockAttributes;
use crate::xref::{self, IdTable};

/// Link and image macros, optionally escaped with a leading backslash.
static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\\)?(?:(link:|image::?)([^\s\[\\]+)|((?:https?|ftp|irc|file)://[^\s\[\\]+|mailto:[^\s\[\\]+))\[((?:\\.|[^\]\\])*)\]",
    )
    .unwrap()
});

/// Private-use characters tried in turn as the placeholder delimiter for
/// protected passthrough text. A mark is only used when it does not occur
/// in the line or in anything substituted into it.
const PLACEHOLDER_MARKS: RangeInclusive<char> = '\u{e000}'..='\u{f8ff}';

/// Apply all inline substitutions to a line of running text.
pub fn substitute(text: &str, attributes: &AttributeStore, ids: &IdTable) -> String {
    if text.contains("`+") {
        for mark in PLACEHOLDER_MARKS.filter(|&mark| !text.contains(mark)) {
            let (protected, saved) = protect_passthroughs(text, mark);
            if saved.is_empty() {
                break;
            }
            let rendered = substitute_spans(&protected, attributes, ids);
            if rendered.matches(mark).count() <= saved.len() * 2 {
                return restore_passthroughs(&rendered, mark, &saved);
            }
        }
    }
    substitute_spans(text, attributes, ids)
}

fn substitute_spans(text: &str, attributes: &AttributeStore, ids: &IdTable) -> String {
    let text = rewrite_emphasis(text);
    let text = attributes.resolve(&text);
    let text = rewrite_macros(&text);
    let text = xref::rewrite_xrefs(&text, ids);
    strip_monospace_escapes(&text).into_owned()
}

/// Replace the contents of `` `+text+` `` spans with `mark`-delimited
/// indexes into the returned list.
fn protect_passthroughs(text: &str, mark: char) -> (String, Vec<&str>) {
    let mut out = String::with_capacity(text.len());
    let mut saved = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("`+") {
        let after = &rest[open + 2..];
        match after.find("+`") {
            Some(close) if !after[..close].contains('`') => {
                out.push_str(&rest[..=open]);
                out.push(mark);
                out.push_str(&saved.len().to_string());
                out.push(mark);
                out.push('`');
                saved.push(&after[..close]);
                rest = &after[close + 2..];
            }
            _ => {
                out.push_str(&rest[..open + 2]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    (out, saved)
}

/// Put protected text back in a single scan. Every `mark` in `text` belongs
/// to a placeholder.
fn restore_passthroughs(text: &str, mark: char, saved: &[&str]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(mark) {
        out.push_str(&rest[..start]);
        let after = &rest[start + mark.len_utf8()..];
        let literal = after.find(mark).and_then(|end| {
            let idx: usize = after[..end].parse().ok()?;
            Some((*saved.get(idx)?, end))
        });
        match literal {
            Some((literal, end)) => {
                out.push_str(literal);
                rest = &after[end + mark.len_utf8()..];
            }
            None => {
                out.push(mark);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite link and image macros to Markdown links and images.
pub fn rewrite_macros(text: &str) -> Cow<'_, str> {
    if !text.contains('[') {
        return Cow::Borrowed(text);
    }
    MACRO_RE.replace_all(text, |caps: &Captures<'_>| {
        let matched = &caps[0];
        if caps.get(1).is_some() {
            return matched[1..].to_owned();
        }

        let prefix = caps.get(2).map_or("", |m| m.as_str());
        let target = caps
            .get(3)
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        let attrlist = caps.get(5).map_or("", |m| m.as_str());

        let first = attrlist.split_once(',').map_or(attrlist, |(first, _)| first);
        let first = first.trim();
        let label = if first.is_empty() || first.contains('=') {
            target
        } else {
            first
        };

        if !prefix.starts_with("image") {
            return format!("[{label}]({target})");
        }
        let image = format!("![{label}]({target})");
        let link = attrlist
            .contains('=')
            .then(|| BlockAttributes::parse(&format!("[{attrlist}]")))
            .and_then(|attrs| attrs.named("link").map(str::to_owned));
        match link {
            Some(link) => format!("[{image}]({link})"),
            None => image,
        }
    })
}

/// Rewrite constrained and unconstrained emphasis.
///
/// `*bold*` becomes `**bold**`, `_italic_` and `__italic__` become
/// `*italic*`, `**bold**` is kept. A role list such as `[.path]` directly in
/// front of a span is dropped. Backtick spans are copied unchanged.
pub fn rewrite_emphasis(text: &str) -> Cow<'_, str> {
    if !text.contains(['*', '_']) {
        return Cow::Borrowed(text);
    }
    let chars: Vec<char> = text.chars().collect();
    Cow::Owned(emphasis_chars(&chars))
}

fn emphasis_chars(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '`'
            && let Some(close) = find_char(chars, i + 1, '`')
        {
            out.extend(&chars[i..=close]);
            i = close + 1;
            continue;
        }

        if c == '*' || c == '_' {
            if let Some((inner, next)) = unconstrained_span(chars, i, c) {
                drop_role_list(&mut out);
                let inner = emphasis_chars(inner);
                let marker = if c == '*' { "**" } else { "*" };
                out.push_str(marker);
                out.push_str(&inner);
                out.push_str(marker);
                i = next;
                continue;
            }
            if let Some((inner, next)) = constrained_span(chars, i, c) {
                drop_role_list(&mut out);
                let inner = emphasis_chars(inner);
                let marker = if c == '*' { "**" } else { "*" };
                out.push_str(marker);
                out.push_str(&inner);
                out.push_str(marker);
                i = next;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }
    out
}

/// `**text**` / `__text__` starting at `start`.
fn unconstrained_span(chars: &[char], start: usize, delim: char) -> Option<(&[char], usize)> {
    if chars.get(start + 1) != Some(&delim) || is_escaped(chars, start) {
        return None;
    }
    let content_start = start + 2;
    let mut j = content_start;
    while j + 1 < chars.len() {
        if chars[j] == delim && chars[j + 1] == delim && j > content_start {
            let inner = &chars[content_start..j];
            if inner.iter().all(|c| c.is_whitespace()) {
                return None;
            }
            return Some((inner, j + 2));
        }
        j += 1;
    }
    None
}

/// `*text*` / `_text_` starting at `start`, bounded by non-word characters.
fn constrained_span(chars: &[char], start: usize, delim: char) -> Option<(&[char], usize)> {
    if let Some(&prev) = start.checked_sub(1).and_then(|p| chars.get(p))
        && (prev.is_alphanumeric() || prev == delim || prev == '\\')
    {
        return None;
    }
    let first = *chars.get(start + 1)?;
    if first.is_whitespace() || first == delim {
        return None;
    }

    let mut j = start + 2;
    while j < chars.len() {
        if chars[j] == delim && !chars[j - 1].is_whitespace() {
            let closes = chars
                .get(j + 1)
                .is_none_or(|&next| !next.is_alphanumeric() && next != delim);
            if closes {
                return Some((&chars[start + 1..j], j + 1));
            }
        }
        j += 1;
    }
    None
}

fn is_escaped(chars: &[char], idx: usize) -> bool {
    idx > 0 && chars[idx - 1] == '\\'
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    chars
        .get(from..)?
        .iter()
        .position(|&c| c == needle)
        .map(|pos| from + pos)
}

/// Remove a trailing `[.role]`, `[#id]` or `[%option]` list from `out`.
fn drop_role_list(out: &mut String) {
    if !out.ends_with(']') {
        return;
    }
    let Some(open) = out.rfind('[') else {
        return;
    };
    let list = &out[open + 1..out.len() - 1];
    let is_role_list = list.starts_with(['.', '#', '%'])
        && list.len() > 1
        && !list.contains(char::is_whitespace);
    if is_role_list {
        out.truncate(open);
    }
}

/// Strip a backslash directly after an opening backtick.
pub fn strip_monospace_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains("`\\") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        out.push_str(&rest[..=open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('`') else {
            rest = after;
            break;
        };
        let span = &after[..close];
        out.push_str(span.strip_prefix('\\').unwrap_or(span));
        out.push('`');
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}
