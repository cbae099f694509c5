//! Identifier generation for section titles.

/// Generate the auto id of a section from its title.
///
/// The title is lower-cased, every run of characters that are not
/// alphanumeric becomes a single `separator`, and separators at either end
/// are removed before `prefix` is prepended.
///
/// # Example
///
/// ```
/// use downmark_core::slug::section_id;
///
/// assert_eq!(section_id("System Requirements", "ref_", "-"), "ref_system-requirements");
/// assert_eq!(section_id("Don't Panic!", "", "_"), "don_t_panic");
/// ```
#[must_use]
pub fn section_id(title: &str, prefix: &str, separator: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push_str(separator);
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    let mut id = String::with_capacity(prefix.len() + slug.len());
    id.push_str(prefix);
    id.push_str(&slug);
    id
}

/// Generate the anchor a Markdown renderer assigns to a heading.
///
/// Letters and digits are lower-cased, `-` and `_` are kept, spaces become
/// `-` and everything else is dropped. Runs are not collapsed.
#[must_use]
pub fn heading_anchor(title: &str) -> String {
    let mut anchor = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            anchor.extend(c.to_lowercase());
        } else if c == '-' || c == '_' {
            anchor.push(c);
        } else if c == ' ' {
            anchor.push('-');
        }
    }
    anchor
}
