//! Cross-reference table and resolver.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::slug::heading_anchor;

/// Matches `<<id>>`, `<<id,text>>` and `xref:id[text]`.
static XREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<<([\w#/.:{][\w\-#/.:{}]*)(?:,\s*(.+?))?>>|xref:([\w#/.:{][\w\-#/.:{}]*)\[((?:\\.|[^\]\\])*)\]",
    )
    .unwrap()
});

/// Where a registered id points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    /// Text used when the reference supplies none.
    pub text: Option<String>,
    /// Fragment of the link target, without `#`.
    pub fragment: String,
}

/// Mapping from id to reference target, built before rendering.
///
/// A later registration of the same id replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    entries: HashMap<String, RefTarget>,
}

impl IdTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section heading.
    ///
    /// The link target is the anchor Markdown renderers generate for the
    /// rendered heading, which differs from `id` when the id is explicit or
    /// carries a prefix.
    pub fn register_section(&mut self, id: impl Into<String>, title: &str, reftext: Option<&str>) {
        let target = RefTarget {
            text: Some(reftext.unwrap_or(title).to_owned()),
            fragment: heading_anchor(title),
        };
        self.entries.insert(id.into(), target);
    }

    /// Register a standalone anchor.
    pub fn register_anchor(&mut self, id: impl Into<String>, reftext: Option<&str>) {
        let id = id.into();
        let target = RefTarget {
            text: reftext.map(str::to_owned),
            fragment: id.clone(),
        };
        self.entries.insert(id, target);
    }

    pub fn get(&self, id: &str) -> Option<&RefTarget> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrite cross-references in `text` to Markdown links.
pub fn rewrite_xrefs<'t>(text: &'t str, table: &IdTable) -> Cow<'t, str> {
    if !text.contains("<<") && !text.contains("xref:") {
        return Cow::Borrowed(text);
    }
    XREF_RE.replace_all(text, |caps: &Captures<'_>| {
        let (id, label) = match caps.get(1) {
            Some(id) => (id.as_str(), caps.get(2).map(|m| m.as_str())),
            None => (
                caps.get(3).map_or("", |m| m.as_str()),
                caps.get(4).map(|m| m.as_str()),
            ),
        };
        let label = label.map(str::trim).filter(|label| !label.is_empty());
        let (target, fill) = resolve(id, table);
        format!("[{}]({target})", label.unwrap_or(fill.as_str()))
    })
}

/// Resolve an id to a link target and the text used when none is given.
fn resolve(id: &str, table: &IdTable) -> (String, String) {
    let key = match id.split_once('#') {
        Some((path, fragment)) if !path.is_empty() => {
            let target = if fragment.is_empty() {
                path.to_owned()
            } else {
                id.to_owned()
            };
            return (target.clone(), target);
        }
        Some((_, fragment)) => fragment,
        None => id,
    };

    if let Some(entry) = table.get(key) {
        let fill = entry.text.clone().unwrap_or_else(|| key.to_owned());
        return (format!("#{}", entry.fragment), fill);
    }

    if !id.contains('#') && (key.contains('.') || key.contains('/')) {
        return (key.to_owned(), key.to_owned());
    }

    tracing::debug!(id = key, "unresolved cross reference");
    (format!("#{key}"), key.to_owned())
}
