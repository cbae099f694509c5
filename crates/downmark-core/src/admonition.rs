//! Admonition labels.

/// Admonition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admonition {
    Caution,
    Important,
    Note,
    Tip,
    Warning,
}

impl Admonition {
    /// Parse an admonition keyword (`NOTE`, `TIP`, ...).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CAUTION" => Some(Self::Caution),
            "IMPORTANT" => Some(Self::Important),
            "NOTE" => Some(Self::Note),
            "TIP" => Some(Self::Tip),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Caution => "CAUTION",
            Self::Important => "IMPORTANT",
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Warning => "WARNING",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Caution => "\u{1f525}",
            Self::Important => "\u{2757}",
            Self::Note => "\u{1f4cc}",
            Self::Tip => "\u{1f4a1}",
            Self::Warning => "\u{26a0}\u{fe0f}",
        }
    }

    /// Markdown label, e.g. `📌 **NOTE:**`.
    pub fn label(self) -> String {
        format!("{} **{}:**", self.emoji(), self.keyword())
    }
}

/// Replace a leading `NOTE: ` style label with its Markdown label.
pub fn rewrite_label(line: &str) -> Option<String> {
    let (keyword, rest) = line.split_once(':')?;
    let admonition = Admonition::from_keyword(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(format!("{}{rest}", admonition.label()))
}
