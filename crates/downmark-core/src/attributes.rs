//! Document attribute store and attribute reference substitution.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Reserved name of the document title attribute.
pub const DOCTITLE: &str = "doctitle";

/// Matches `{name}` and its escaped form `\{name}`.
static ATTRIBUTE_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\?\{([a-z0-9_-]+)\}").unwrap());

/// Named string values available for `{name}` substitution.
///
/// The document title lives in its own field so a title defined by the
/// document always takes precedence over a seeded `doctitle` entry.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    entries: HashMap<String, String>,
    /// Seed attributes the document is not allowed to change.
    locked: HashSet<String>,
    doctitle: Option<String>,
}

impl AttributeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from caller-supplied seed attributes.
    ///
    /// Seed values are locked against document attribute entries unless
    /// they end with `@`.
    #[must_use]
    pub fn with_seed(seed: &BTreeMap<String, String>) -> Self {
        let mut store = Self::new();
        for (name, value) in seed {
            if let Some(soft) = value.strip_suffix('@') {
                store.entries.insert(name.clone(), soft.to_owned());
            } else {
                store.entries.insert(name.clone(), value.clone());
                store.locked.insert(name.clone());
            }
        }
        store
    }

    /// Define an attribute from an attribute entry.
    ///
    /// References in `raw_value` are resolved against the current contents
    /// first, so an entry can build on attributes defined before it.
    pub fn set(&mut self, name: &str, raw_value: &str) {
        if name == DOCTITLE {
            let value = self.resolve(raw_value).into_owned();
            self.doctitle = Some(value);
            return;
        }
        if self.locked.contains(name) {
            tracing::trace!(name, "ignoring entry for locked attribute");
            return;
        }
        let value = self.resolve(raw_value).into_owned();
        self.entries.insert(name.to_owned(), value);
    }

    /// Define an attribute without resolving references in `value`.
    pub fn set_literal(&mut self, name: &str, value: &str) {
        if self.locked.contains(name) {
            return;
        }
        self.entries.insert(name.to_owned(), value.to_owned());
    }

    /// Remove an attribute (`:name!:`).
    pub fn unset(&mut self, name: &str) {
        if name == DOCTITLE {
            self.doctitle = None;
        }
        if self.locked.contains(name) {
            tracing::trace!(name, "ignoring unset of locked attribute");
            return;
        }
        self.entries.remove(name);
    }

    /// Record the document title.
    pub fn set_doctitle(&mut self, title: impl Into<String>) {
        self.doctitle = Some(title.into());
    }

    /// The title defined by the document, if any.
    pub fn doctitle(&self) -> Option<&str> {
        self.doctitle.as_deref()
    }

    /// Look up an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == DOCTITLE
            && let Some(title) = &self.doctitle
        {
            return Some(title);
        }
        self.entries.get(name).map(String::as_str)
    }

    /// Whether an attribute is defined (its value is irrelevant).
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace attribute references in `text`.
    ///
    /// Unknown references are kept as written. An escaped reference
    /// (`\{name}`) loses its backslash and is never replaced.
    pub fn resolve<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains('{') {
            return Cow::Borrowed(text);
        }
        ATTRIBUTE_REFERENCE_RE.replace_all(text, |caps: &Captures<'_>| {
            let reference = &caps[0];
            if let Some(escaped) = reference.strip_prefix('\\') {
                return escaped.to_owned();
            }
            self.get(&caps[1])
                .map_or_else(|| reference.to_owned(), str::to_owned)
        })
    }
}
