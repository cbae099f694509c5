//! AsciiDoc to Markdown conversion engine.
//!
//! This crate converts a practical subset of AsciiDoc (document header and
//! attributes, sections, lists, admonitions, listing and literal blocks,
//! cross-references, inline formatting, preprocessor conditionals) into
//! Markdown without building a document tree.
//!
//! # Architecture
//!
//! Conversion is line-oriented. Each line is classified on its own by
//! [`syntax::classify`] and handled by a small state machine that tracks
//! the header, open delimited blocks, skipped regions, list state and the
//! block attribute list waiting for the next block. The document is scanned
//! twice: the first pass builds an [`IdTable`] of section and anchor ids, the
//! second renders, so references to sections further down resolve.
//!
//! Conversion is total: any input produces output, malformed constructs are
//! passed through or dropped.
//!
//! # Example
//!
//! ```
//! use downmark_core::{ConvertOptions, convert};
//!
//! let source = "= Guide\n:product: ACME\n\nSee <<usage>>.\n\n== Usage\n\nRun *{product}*.";
//! let markdown = convert(source, &ConvertOptions::default());
//!
//! assert_eq!(markdown, "# Guide\n\nSee [Usage](#usage).\n\n## Usage\n\nRun **ACME**.");
//! ```

mod admonition;
pub mod attributes;
mod block;
pub mod conditional;
mod converter;
pub mod fence;
mod header;
pub mod inline;
mod options;
mod output;
pub mod slug;
pub mod syntax;
pub mod xref;

pub use attributes::AttributeStore;
pub use converter::Converter;
pub use options::ConvertOptions;
pub use xref::{IdTable, RefTarget};

/// Convert an AsciiDoc document to Markdown.
///
/// The output has no trailing newline.
#[must_use]
pub fn convert(source: &str, options: &ConvertOptions) -> String {
    Converter::new(options).convert(source)
}
