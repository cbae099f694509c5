//! Conversion options.

use std::collections::BTreeMap;

/// Options for a single conversion.
///
/// Seed attributes are visible from the first line of the document. A seed
/// value is locked: attribute entries in the document cannot replace it,
/// unless the value ends with `@`, which marks it as a default the document
/// may override (the `@` is not part of the value). The document title is
/// the exception, a title defined by the document always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConvertOptions {
    /// Seed attributes, keyed by attribute name.
    pub attributes: BTreeMap<String, String>,
}

impl ConvertOptions {
    /// Create options with no seed attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seed attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add several seed attributes.
    #[must_use]
    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(attributes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}
