//! Block formatting helpers: list numbering, call-outs, fences and literal
//! paragraphs.

use std::borrow::Cow;

use crate::fence::BlockKind;
use crate::syntax::BlockAttributes;

/// Replace a trailing run of call-out markers (` <1> <2>`) with circled
/// digits.
pub fn replace_conums(line: &str) -> Cow<'_, str> {
    if !line.ends_with('>') {
        return Cow::Borrowed(line);
    }

    let mut base = line;
    let mut numbers = Vec::new();
    while let Some(number) = trailing_conum(base) {
        numbers.push(number);
        base = &base[..base.len() - 4];
    }
    if numbers.is_empty() {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len() + numbers.len() * 2);
    out.push_str(base);
    for number in numbers.into_iter().rev() {
        out.push(' ');
        out.push(conum_glyph(number));
    }
    Cow::Owned(out)
}

/// Digit of a ` <N>` marker at the end of `line`.
fn trailing_conum(line: &str) -> Option<u32> {
    let bytes = line.as_bytes();
    let len = bytes.len();
    if len < 4 || &bytes[len - 4..len - 2] != b" <" || bytes[len - 1] != b'>' {
        return None;
    }
    let digit = char::from(bytes[len - 2]).to_digit(10)?;
    (1..=9).contains(&digit).then_some(digit)
}

/// Dingbat negative circled digit for 1 to 9.
fn conum_glyph(number: u32) -> char {
    char::from_u32(0x2776 + number - 1).unwrap_or('\u{2776}')
}

/// Language for the Markdown fence of a listing or literal block.
///
/// For listing blocks the language is the second positional attribute
/// (`[source,js]` or `[,js]`), falling back to a non-source style. For
/// literal blocks the style names the language (`[plantuml]`).
pub fn fence_language(kind: BlockKind, attributes: Option<&BlockAttributes>) -> Option<String> {
    let attributes = attributes?;
    let style = attributes.style.as_deref();
    let language = match kind {
        BlockKind::Listing | BlockKind::Fenced => attributes
            .positional(1)
            .or_else(|| style.filter(|s| !matches!(*s, "source" | "listing" | "literal"))),
        BlockKind::Literal => match style {
            Some("source") => attributes.positional(1),
            Some("literal") | None => None,
            Some(style) => Some(style),
        },
        _ => None,
    };
    language.map(str::to_owned)
}

/// Numbering state of ordered lists.
#[derive(Debug, Default)]
pub struct ListState {
    counters: Vec<usize>,
}

impl ListState {
    /// Number for the next ordered item at `depth` (1-based).
    ///
    /// Deeper counters restart whenever a shallower item appears.
    pub fn next_ordered(&mut self, depth: usize) -> usize {
        let depth = depth.max(1);
        self.counters.truncate(depth);
        self.counters.resize(depth, 0);
        let counter = &mut self.counters[depth - 1];
        *counter += 1;
        *counter
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

/// Render an ordered list item.
pub fn ordered_item(number: usize, depth: usize, text: &str) -> String {
    format!("{}{number}. {text}", "   ".repeat(depth.saturating_sub(1)))
}

/// Render an unordered list item.
pub fn unordered_item(depth: usize, text: &str) -> String {
    format!("{}* {text}", "  ".repeat(depth.saturating_sub(1)))
}

/// A run of indented lines forming a literal paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralRun {
    /// Leading whitespace removed from every line of the run.
    outdent: usize,
    /// The run starts with a shell prompt and renders as a console fence.
    pub console: bool,
}

impl LiteralRun {
    /// Start a run at its first line.
    pub fn start(line: &str) -> Self {
        let content = line.trim_start();
        Self {
            outdent: line.len() - content.len(),
            console: content.starts_with("$ "),
        }
    }

    /// Remove the run's base indentation from `line`, keeping any
    /// indentation beyond it.
    pub fn outdent<'a>(&self, line: &'a str) -> &'a str {
        let strip: usize = line
            .chars()
            .take(self.outdent)
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        &line[strip..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_single_conum() {
        assert_eq!(replace_conums("'use strict' // <1>"), "'use strict' // ❶");
        assert_eq!(replace_conums("require('node:fs') // <2>"), "require('node:fs') // ❷");
    }

    #[test]
    fn test_replace_conum_run() {
        assert_eq!(replace_conums("let x = 1; // <1> <2>"), "let x = 1; // ❶ ❷");
    }

    #[test]
    fn test_conum_nine() {
        assert_eq!(replace_conums("x <9>"), "x ❾");
    }

    #[test]
    fn test_no_conum() {
        assert_eq!(replace_conums("<html>"), "<html>");
        assert_eq!(replace_conums("x <0>"), "x <0>");
        assert_eq!(replace_conums("x <10>"), "x <10>");
        assert_eq!(replace_conums("x<1>"), "x<1>");
        assert!(matches!(replace_conums("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_listing_language() {
        let attrs = BlockAttributes::parse("[,js]");
        assert_eq!(fence_language(BlockKind::Listing, Some(&attrs)).as_deref(), Some("js"));

        let attrs = BlockAttributes::parse("[source,ruby]");
        assert_eq!(fence_language(BlockKind::Listing, Some(&attrs)).as_deref(), Some("ruby"));

        let attrs = BlockAttributes::parse("[source]");
        assert_eq!(fence_language(BlockKind::Listing, Some(&attrs)), None);

        assert_eq!(fence_language(BlockKind::Listing, None), None);
    }

    #[test]
    fn test_literal_language() {
        let attrs = BlockAttributes::parse("[plantuml]");
        assert_eq!(fence_language(BlockKind::Literal, Some(&attrs)).as_deref(), Some("plantuml"));

        let attrs = BlockAttributes::parse("[literal]");
        assert_eq!(fence_language(BlockKind::Literal, Some(&attrs)), None);

        let attrs = BlockAttributes::parse("[source,sh]");
        assert_eq!(fence_language(BlockKind::Literal, Some(&attrs)).as_deref(), Some("sh"));
    }

    #[test]
    fn test_ordered_numbering() {
        let mut list = ListState::default();
        assert_eq!(list.next_ordered(1), 1);
        assert_eq!(list.next_ordered(1), 2);
        assert_eq!(list.next_ordered(2), 1);
        assert_eq!(list.next_ordered(2), 2);
        assert_eq!(list.next_ordered(1), 3);
        assert_eq!(list.next_ordered(2), 1);

        list.reset();
        assert_eq!(list.next_ordered(1), 1);
    }

    #[test]
    fn test_item_rendering() {
        assert_eq!(ordered_item(2, 1, "two"), "2. two");
        assert_eq!(ordered_item(1, 2, "nested"), "   1. nested");
        assert_eq!(unordered_item(1, "work"), "* work");
        assert_eq!(unordered_item(3, "deep"), "    * deep");
    }

    #[test]
    fn test_literal_run_outdent() {
        let run = LiteralRun::start("    literal");
        assert!(!run.console);
        assert_eq!(run.outdent("    literal"), "literal");
        assert_eq!(run.outdent("      so literal"), "  so literal");
        assert_eq!(run.outdent("  shallow"), "shallow");
    }

    #[test]
    fn test_literal_run_console() {
        let run = LiteralRun::start(" $ npx downmark README.adoc");
        assert!(run.console);
        assert_eq!(run.outdent(" $ npx downmark README.adoc"), "$ npx downmark README.adoc");
    }
}
