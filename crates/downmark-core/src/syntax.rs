//! Line classification.
//!
//! Every physical line is classified on its own, without looking at the
//! surrounding state. The converter decides what a classification means in
//! the current mode (a section title inside a listing block is content).

use std::sync::LazyLock;

use regex::Regex;

use crate::conditional::{self, Conditional};
use crate::fence::{self, BlockKind};

static ATTRIBUTE_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(!)?(\w[\w-]*)(!)?:(?:[ \t]+(.*))?$").unwrap()
});

static SECTION_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={1,6}|#{1,6}) +(\S.*)$").unwrap());

static UNORDERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*{1,5}|-) +(\S.*)$").unwrap());

static ORDERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.{1,5}) +(\S.*)$").unwrap());

static CALLOUT_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([1-9])> +(.*)$").unwrap());

static BLOCK_ATTRIBUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?:[^\[\]]*|\[[^\[\]]+\])\]$").unwrap());

static BLOCK_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\[([\w:][\w:.-]*)(?:, *(.+))?\]\]$").unwrap());

static ATTRIBUTE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w[\w-]*$").unwrap());

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    /// `:name: value` or `:name:`.
    AttributeEntry { name: &'a str, value: &'a str },
    /// `:name!:` or `:!name:`.
    AttributeUnset { name: &'a str },
    /// `// ...`
    Comment,
    Conditional(Conditional<'a>),
    EndIf,
    /// Opening or closing delimiter of a delimited block.
    Delimiter(BlockKind),
    /// `== Title` or Markdown-style `## Title`.
    SectionTitle { level: usize, title: &'a str },
    /// `toc::[]`
    Toc,
    /// `[...]` or `[[id]]` on a line of its own.
    BlockAttributes(&'a str),
    /// `+` on a line of its own.
    ListContinuation,
    /// `* item`, `** item`, `- item`.
    UnorderedItem { depth: usize, text: &'a str },
    /// `. item`, `.. item`.
    OrderedItem { depth: usize, text: &'a str },
    /// `<1> explanation`
    CalloutItem { number: &'a str, text: &'a str },
    /// `.Title`
    BlockTitle(&'a str),
    /// Line starting with whitespace.
    Indented,
    Text,
}

/// Classify a line that has already been trimmed at the end.
pub fn classify(line: &str) -> Line<'_> {
    let Some(first) = line.chars().next() else {
        return Line::Blank;
    };

    if first == ':'
        && let Some(caps) = ATTRIBUTE_ENTRY_RE.captures(line)
    {
        let name = caps.get(2).map_or("", |m| m.as_str());
        if caps.get(1).is_some() || caps.get(3).is_some() {
            return Line::AttributeUnset { name };
        }
        let value = caps.get(4).map_or("", |m| m.as_str());
        return Line::AttributeEntry { name, value };
    }

    if let Some(kind) = fence::detect(line) {
        return Line::Delimiter(kind);
    }

    if line.starts_with("//") {
        return Line::Comment;
    }

    if first == 'i'
        && let Some(directive) = Conditional::parse(line)
    {
        return Line::Conditional(directive);
    }

    if conditional::is_endif(line) {
        return Line::EndIf;
    }

    if (first == '=' || first == '#')
        && let Some(caps) = SECTION_TITLE_RE.captures(line)
    {
        let level = caps.get(1).map_or(1, |m| m.len());
        let title = caps.get(2).map_or("", |m| m.as_str());
        return Line::SectionTitle { level, title };
    }

    if line == "toc::[]" {
        return Line::Toc;
    }

    if first == '[' && BLOCK_ATTRIBUTES_RE.is_match(line) {
        return Line::BlockAttributes(line);
    }

    if line == "+" {
        return Line::ListContinuation;
    }

    if let Some(caps) = UNORDERED_ITEM_RE.captures(line) {
        let marker = caps.get(1).map_or("*", |m| m.as_str());
        let depth = if marker == "-" { 1 } else { marker.len() };
        let text = caps.get(2).map_or("", |m| m.as_str());
        return Line::UnorderedItem { depth, text };
    }

    if first == '.' {
        if let Some(caps) = ORDERED_ITEM_RE.captures(line) {
            let depth = caps.get(1).map_or(1, |m| m.len());
            let text = caps.get(2).map_or("", |m| m.as_str());
            return Line::OrderedItem { depth, text };
        }
        let title = &line[1..];
        if title.chars().next().is_some_and(|c| !c.is_whitespace() && c != '.') {
            return Line::BlockTitle(title);
        }
    }

    if first == '<'
        && let Some(caps) = CALLOUT_ITEM_RE.captures(line)
    {
        let number = caps.get(1).map_or("", |m| m.as_str());
        let text = caps.get(2).map_or("", |m| m.as_str());
        return Line::CalloutItem { number, text };
    }

    if first == ' ' || first == '\t' {
        return Line::Indented;
    }

    Line::Text
}

/// Parsed block attribute list.
///
/// Fields are indexed by position, including named fields, so in
/// `[source,ruby,subs=+attributes]` the language is field 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAttributes {
    fields: Vec<Field>,
    /// Block style (first positional field up to `#`, `.` or `%`).
    pub style: Option<String>,
    /// Explicit id from `#id` or `[[id]]`.
    pub id: Option<String>,
    /// Reference text from `[[id,reftext]]` or `reftext=`.
    pub reftext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Positional(String),
    Named(String, String),
}

impl BlockAttributes {
    /// Parse a block attribute line (including the brackets).
    pub fn parse(line: &str) -> Self {
        if let Some(caps) = BLOCK_ANCHOR_RE.captures(line) {
            return Self {
                id: caps.get(1).map(|m| m.as_str().to_owned()),
                reftext: caps.get(2).map(|m| m.as_str().trim().to_owned()),
                ..Self::default()
            };
        }

        let inner = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(line);

        let fields: Vec<Field> = split_fields(inner)
            .into_iter()
            .map(|field| match field.split_once('=') {
                Some((name, value)) if ATTRIBUTE_NAME_RE.is_match(name.trim()) => {
                    Field::Named(name.trim().to_owned(), unquote(value.trim()).to_owned())
                }
                _ => Field::Positional(unquote(field).to_owned()),
            })
            .collect();

        let mut attributes = Self {
            fields,
            ..Self::default()
        };

        if let Some(Field::Positional(first)) = attributes.fields.first() {
            let (style, id) = parse_shorthand(first);
            attributes.style = style;
            attributes.id = id;
        }
        if let Some(id) = attributes.named("id") {
            attributes.id = Some(id.to_owned());
        }
        if let Some(reftext) = attributes.named("reftext") {
            attributes.reftext = Some(reftext.to_owned());
        }
        attributes
    }

    /// Positional field at `index`, if present and non-empty.
    pub fn positional(&self, index: usize) -> Option<&str> {
        match self.fields.get(index)? {
            Field::Positional(value) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    /// Value of a named field.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            Field::Named(key, value) if key == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether `subs` enables attribute substitution.
    pub fn has_attribute_subs(&self) -> bool {
        self.named("subs").is_some_and(|subs| {
            subs.split(',')
                .map(str::trim)
                .any(|sub| matches!(sub, "attributes" | "+attributes" | "attributes+"))
        })
    }
}

/// Split on commas outside double or single quotes.
fn split_fields(inner: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut quote = None;
    let mut start = 0;

    for (idx, c) in inner.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ',') => {
                fields.push(inner[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(inner[start..].trim());
    fields
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Split `style#id.role%option` into style and id.
fn parse_shorthand(first: &str) -> (Option<String>, Option<String>) {
    let style_end = first.find(['#', '.', '%']).unwrap_or(first.len());
    let style = Some(&first[..style_end])
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    let id = first[style_end..].strip_prefix('#').and_then(|rest| {
        let end = rest.find(['.', '%']).unwrap_or(rest.len());
        Some(&rest[..end]).filter(|id| !id.is_empty()).map(str::to_owned)
    });
    (style, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank() {
        assert_eq!(classify(""), Line::Blank);
    }

    #[test]
    fn test_attribute_entry() {
        assert_eq!(
            classify(":product: ACME"),
            Line::AttributeEntry { name: "product", value: "ACME" }
        );
        assert_eq!(
            classify(":empty-string:"),
            Line::AttributeEntry { name: "empty-string", value: "" }
        );
    }

    #[test]
    fn test_attribute_unset() {
        assert_eq!(classify(":toc!:"), Line::AttributeUnset { name: "toc" });
        assert_eq!(classify(":!toc:"), Line::AttributeUnset { name: "toc" });
    }

    #[test]
    fn test_malformed_attribute_entry_is_text() {
        assert_eq!(classify(": not an entry"), Line::Text);
        assert_eq!(classify(":name:value"), Line::Text);
    }

    #[test]
    fn test_comments() {
        assert_eq!(classify("// a comment"), Line::Comment);
        assert_eq!(classify("//fin"), Line::Comment);
        assert_eq!(classify("////"), Line::Delimiter(BlockKind::Comment));
    }

    #[test]
    fn test_conditionals() {
        assert!(matches!(classify("ifdef::flag[]"), Line::Conditional(_)));
        assert!(matches!(classify("ifndef::flag[text]"), Line::Conditional(_)));
        assert_eq!(classify("endif::[]"), Line::EndIf);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(classify("----"), Line::Delimiter(BlockKind::Listing));
        assert_eq!(classify("...."), Line::Delimiter(BlockKind::Literal));
        assert_eq!(classify("|==="), Line::Delimiter(BlockKind::Table));
        assert_eq!(classify(":==="), Line::Delimiter(BlockKind::Table));
        assert_eq!(classify("```js"), Line::Delimiter(BlockKind::Fenced));
    }

    #[test]
    fn test_section_titles() {
        assert_eq!(classify("= Title"), Line::SectionTitle { level: 1, title: "Title" });
        assert_eq!(classify("=== Level 2"), Line::SectionTitle { level: 3, title: "Level 2" });
        assert_eq!(classify("## Markdown"), Line::SectionTitle { level: 2, title: "Markdown" });
        assert_eq!(classify("=Title"), Line::Text);
        assert_eq!(classify("======= Too deep"), Line::Text);
    }

    #[test]
    fn test_toc() {
        assert_eq!(classify("toc::[]"), Line::Toc);
    }

    #[test]
    fn test_block_attributes() {
        assert_eq!(classify("[,js]"), Line::BlockAttributes("[,js]"));
        assert_eq!(classify("[[deploy]]"), Line::BlockAttributes("[[deploy]]"));
        assert_eq!(classify("[.path]_README.adoc_ contains"), Line::Text);
        assert_eq!(classify("[x] done [y]"), Line::Text);
    }

    #[test]
    fn test_list_items() {
        assert_eq!(classify("* work"), Line::UnorderedItem { depth: 1, text: "work" });
        assert_eq!(classify("** nested"), Line::UnorderedItem { depth: 2, text: "nested" });
        assert_eq!(classify("- dash"), Line::UnorderedItem { depth: 1, text: "dash" });
        assert_eq!(classify(". one"), Line::OrderedItem { depth: 1, text: "one" });
        assert_eq!(classify(".. two"), Line::OrderedItem { depth: 2, text: "two" });
        assert_eq!(
            classify("<1> Enables strict mode."),
            Line::CalloutItem { number: "1", text: "Enables strict mode." }
        );
        assert_eq!(classify("+"), Line::ListContinuation);
    }

    #[test]
    fn test_bold_text_is_not_a_list_item() {
        assert_eq!(classify("*bold* start"), Line::Text);
    }

    #[test]
    fn test_block_title() {
        assert_eq!(classify(".Clone the repository"), Line::BlockTitle("Clone the repository"));
        assert_eq!(classify("..."), Line::Text);
    }

    #[test]
    fn test_indented() {
        assert_eq!(classify(" literal"), Line::Indented);
        assert_eq!(classify("\tliteral"), Line::Indented);
    }

    #[test]
    fn test_parse_language_field() {
        let attrs = BlockAttributes::parse("[, text]");
        assert_eq!(attrs.style, None);
        assert_eq!(attrs.positional(1), Some("text"));
    }

    #[test]
    fn test_parse_style() {
        let attrs = BlockAttributes::parse("[plantuml]");
        assert_eq!(attrs.style.as_deref(), Some("plantuml"));
        assert_eq!(attrs.positional(1), None);
    }

    #[test]
    fn test_parse_id_shorthand() {
        let attrs = BlockAttributes::parse("[#build]");
        assert_eq!(attrs.style, None);
        assert_eq!(attrs.id.as_deref(), Some("build"));

        let attrs = BlockAttributes::parse("[source#example.role]");
        assert_eq!(attrs.style.as_deref(), Some("source"));
        assert_eq!(attrs.id.as_deref(), Some("example"));
    }

    #[test]
    fn test_parse_anchor() {
        let attrs = BlockAttributes::parse("[[get-started]]");
        assert_eq!(attrs.id.as_deref(), Some("get-started"));
        assert_eq!(attrs.reftext, None);

        let attrs = BlockAttributes::parse("[[deploy, Deploying]]");
        assert_eq!(attrs.id.as_deref(), Some("deploy"));
        assert_eq!(attrs.reftext.as_deref(), Some("Deploying"));
    }

    #[test]
    fn test_attribute_subs() {
        assert!(BlockAttributes::parse("[,console,subs=+attributes]").has_attribute_subs());
        assert!(BlockAttributes::parse(r#"[,console,subs="attributes+"]"#).has_attribute_subs());
        assert!(BlockAttributes::parse(r#"[source,subs="verbatim,attributes"]"#).has_attribute_subs());
        assert!(!BlockAttributes::parse("[,console,subs=-attributes]").has_attribute_subs());
        assert!(!BlockAttributes::parse("[,console]").has_attribute_subs());
    }

    #[test]
    fn test_quoted_commas_do_not_split() {
        let attrs = BlockAttributes::parse(r#"[quote,"Doe, Jane"]"#);
        assert_eq!(attrs.style.as_deref(), Some("quote"));
        assert_eq!(attrs.positional(1), Some("Doe, Jane"));
    }
}
