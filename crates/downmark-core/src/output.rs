//! Rendered line accumulator.

/// Ordered sequence of rendered lines.
///
/// Blank lines pushed with [`push_blank`](Self::push_blank) are collapsed:
/// the output never holds two blank lines in a row. Verbatim content bypasses the collapsing through
/// [`push_raw`](Self::push_raw).
#[derive(Debug, Default)]
pub struct OutputLines {
    lines: Vec<String>,
}

impl OutputLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered line.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.is_empty() {
            self.push_blank();
        } else {
            self.lines.push(line);
        }
    }

    /// Append a blank line unless the previous line is already blank.
    pub fn push_blank(&mut self) {
        if !self.lines.last().is_some_and(String::is_empty) {
            self.lines.push(String::new());
        }
    }

    /// Append a line exactly as given, blank or not.
    pub fn push_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Join the lines with `\n`, dropping trailing blank lines.
    pub fn finish(mut self) -> String {
        while self.lines.last().is_some_and(String::is_empty) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_lines() {
        let mut output = OutputLines::new();
        output.push("one");
        output.push_blank();
        output.push_blank();
        output.push("");
        output.push("two");

        assert_eq!(output.finish(), "one\n\ntwo");
    }

    #[test]
    fn test_leading_blank_line_kept_once() {
        let mut output = OutputLines::new();
        output.push_blank();
        output.push_blank();
        output.push("first");

        assert_eq!(output.finish(), "\nfirst");
    }

    #[test]
    fn test_no_trailing_blank_lines() {
        let mut output = OutputLines::new();
        output.push("last");
        output.push_blank();

        assert_eq!(output.finish(), "last");
    }

    #[test]
    fn test_raw_lines_keep_blanks() {
        let mut output = OutputLines::new();
        output.push("```");
        output.push_raw("a");
        output.push_raw("");
        output.push_raw("");
        output.push_raw("b");
        output.push("```");

        assert_eq!(output.finish(), "```\na\n\n\nb\n```");
    }

    #[test]
    fn test_empty() {
        assert_eq!(OutputLines::new().finish(), "");
    }
}
