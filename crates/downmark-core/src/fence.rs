//! Delimited block detection.
//!
//! Recognizes the openers of the delimited blocks the converter handles and
//! tracks the line that closes the currently open one.

/// Kind of delimited block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `----`, rendered as a fenced code block.
    Listing,
    /// `....`, rendered as a fenced code block.
    Literal,
    /// A backtick fence, passed through as written.
    Fenced,
    /// `++++`, contents emitted raw without a fence.
    Passthrough,
    /// `////`, contents dropped.
    Comment,
    /// `|===`, `,===` or `:===`, contents dropped.
    Table,
}

impl BlockKind {
    /// Whether the block contents are dropped from the output.
    pub fn is_skipped(self) -> bool {
        matches!(self, Self::Comment | Self::Table)
    }
}

/// How an open block recognizes its closing line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Closer {
    /// A line identical to the opening delimiter.
    Exact(String),
    /// A backtick run at least as long as the opening one.
    Backticks(usize),
}

/// An open delimited block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBlock {
    kind: BlockKind,
    closer: Closer,
}

impl OpenBlock {
    /// Open a block for a delimiter line previously accepted by [`detect`].
    pub fn new(kind: BlockKind, line: &str) -> Self {
        let closer = if kind == BlockKind::Fenced {
            Closer::Backticks(backtick_run(line.trim_start()))
        } else {
            Closer::Exact(line.to_owned())
        };
        Self { kind, closer }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// The line that closes this block in its shortest form.
    pub fn closing_delimiter(&self) -> String {
        match &self.closer {
            Closer::Exact(delimiter) => delimiter.clone(),
            Closer::Backticks(len) => "`".repeat(*len),
        }
    }

    /// Check whether `line` closes this block.
    pub fn is_closed_by(&self, line: &str) -> bool {
        match &self.closer {
            Closer::Exact(delimiter) => line == delimiter,
            Closer::Backticks(min_len) => is_closing_fence(line.trim_start(), *min_len),
        }
    }
}

/// Detect a delimited block opener.
pub fn detect(line: &str) -> Option<BlockKind> {
    if matches!(line, "|===" | ",===" | ":===") {
        return Some(BlockKind::Table);
    }
    if backtick_run(line.trim_start()) >= 3 {
        return Some(BlockKind::Fenced);
    }
    let first = line.chars().next()?;
    let kind = match first {
        '-' => BlockKind::Listing,
        '.' => BlockKind::Literal,
        '+' => BlockKind::Passthrough,
        '/' => BlockKind::Comment,
        _ => return None,
    };
    if line.len() >= 4 && line.chars().all(|c| c == first) {
        Some(kind)
    } else {
        None
    }
}

/// The info string following an opening backtick fence.
pub fn fence_info(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed[backtick_run(trimmed)..].trim()
}

fn backtick_run(trimmed: &str) -> usize {
    trimmed.chars().take_while(|&c| c == '`').count()
}

/// A closing fence is a backtick run at least as long as the opener,
/// followed only by whitespace.
fn is_closing_fence(trimmed: &str, min_len: usize) -> bool {
    let count = backtick_run(trimmed);
    if count < min_len {
        return false;
    }
    trimmed[count..].chars().all(char::is_whitespace)
}
