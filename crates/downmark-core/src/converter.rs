//! Line-by-line conversion driver.
//!
//! A `Driver` walks the document once, classifying each line and
//! dispatching on the current `Mode`. Conversion runs the driver twice: the
//! first pass only collects section and anchor ids into an `IdTable`, the
//! second renders with the finished table so forward references resolve.
//! Both passes start from a fresh attribute store, so attribute state evolves
//! identically in each.

use std::borrow::Cow;

use crate::admonition::{self, Admonition};
use crate::attributes::AttributeStore;
use crate::block::{self, ListState, LiteralRun};
use crate::conditional;
use crate::fence::{self, BlockKind, OpenBlock};
use crate::header;
use crate::inline;
use crate::options::ConvertOptions;
use crate::output::OutputLines;
use crate::slug;
use crate::syntax::{self, BlockAttributes, Line};
use crate::xref::IdTable;

/// Converts documents with a fixed set of options.
///
/// # Example
///
/// ```
/// use downmark_core::{ConvertOptions, Converter};
///
/// let options = ConvertOptions::new().with_attribute("product", "ACME");
/// let converter = Converter::new(&options);
///
/// assert_eq!(converter.convert("= Intro to {product}\n\nHello."), "# Intro to ACME\n\nHello.");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Converter<'o> {
    options: &'o ConvertOptions,
}

impl<'o> Converter<'o> {
    #[must_use]
    pub fn new(options: &'o ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert `source` to Markdown.
    #[must_use]
    pub fn convert(&self, source: &str) -> String {
        let ids = self.collect_ids(source);
        tracing::trace!(ids = ids.len(), "collected reference ids");

        let driver = Driver::new(self.options, RefPass::Resolve(&ids));
        let (output, _) = driver.run(source);
        output
    }

    /// Collect the ids of sections and anchors.
    #[must_use]
    pub fn collect_ids(&self, source: &str) -> IdTable {
        let driver = Driver::new(self.options, RefPass::Collect(IdTable::new()));
        match driver.run(source) {
            (_, RefPass::Collect(ids)) => ids,
            (_, RefPass::Resolve(_)) => IdTable::new(),
        }
    }
}

/// Which pass the driver performs.
enum RefPass<'a> {
    /// Register ids, skip inline rendering.
    Collect(IdTable),
    /// Render with a complete table.
    Resolve(&'a IdTable),
}

/// Processing mode carried across lines.
#[derive(Debug)]
enum Mode {
    Normal,
    /// Inside a block whose lines are emitted without interpretation.
    Verbatim { block: OpenBlock, subs: bool },
    /// Dropping lines up to a closing delimiter.
    SkipBlock(OpenBlock),
    /// Dropping lines up to `endif::[]`.
    SkipConditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    /// Before the document title. `entries` is set once a header entry
    /// (attribute, comment, conditional, block attributes) has been seen.
    Preamble { entries: bool },
    /// After the title; position among the author and revision lines.
    AfterTitle(u8),
    Done,
}

struct Driver<'a> {
    attributes: AttributeStore,
    pass: RefPass<'a>,
    output: OutputLines,
    mode: Mode,
    header: HeaderState,
    /// Block attribute list waiting for the block it applies to.
    pending: Option<BlockAttributes>,
    list: ListState,
    /// Indent applied after a list continuation.
    indent: Option<&'static str>,
    literal: Option<LiteralRun>,
    /// The next text line starts a paragraph.
    paragraph_start: bool,
    line_num: usize,
}

impl<'a> Driver<'a> {
    fn new(options: &ConvertOptions, pass: RefPass<'a>) -> Self {
        Self {
            attributes: AttributeStore::with_seed(&options.attributes),
            pass,
            output: OutputLines::new(),
            mode: Mode::Normal,
            header: HeaderState::Preamble { entries: false },
            pending: None,
            list: ListState::default(),
            indent: None,
            literal: None,
            paragraph_start: true,
            line_num: 0,
        }
    }

    fn run(mut self, source: &str) -> (String, RefPass<'a>) {
        for line in source.trim_end().lines() {
            self.line_num += 1;
            self.process_line(line);
        }
        self.finish();
        (self.output.finish(), self.pass)
    }

    fn is_render_pass(&self) -> bool {
        matches!(self.pass, RefPass::Resolve(_))
    }

    fn process_line(&mut self, raw: &str) {
        let line = raw.trim_end();
        match &self.mode {
            Mode::Normal => self.dispatch(line),
            Mode::Verbatim { .. } => self.verbatim_line(raw),
            Mode::SkipBlock(block) => {
                if block.is_closed_by(line) {
                    self.mode = Mode::Normal;
                }
            }
            Mode::SkipConditional => {
                if conditional::is_endif(line) {
                    self.mode = Mode::Normal;
                }
            }
        }
    }

    /// Classify and handle a line outside any delimited block.
    ///
    /// The text of an active single-line conditional replaces the line and
    /// is classified again, so nested directives unwrap one per iteration.
    fn dispatch(&mut self, mut line: &str) {
        loop {
            let class = syntax::classify(line);
            if self.header != HeaderState::Done && self.header_line(line, &class) {
                return;
            }
            if let Line::Conditional(directive) = &class {
                let active = directive.is_active(&self.attributes);
                match directive.text {
                    Some(text) if active => {
                        line = text;
                        continue;
                    }
                    None if !active => self.mode = Mode::SkipConditional,
                    _ => {}
                }
                return;
            }
            self.body_line(line, class);
            return;
        }
    }

    /// Handle header-only syntax. Returns `true` when the line was consumed.
    ///
    /// Lines that are valid both in the header and the body (attribute
    /// entries, comments, conditionals, block attributes) fall through to
    /// the body handler without ending the header. Blank lines before the
    /// title are echoed until the first such entry and consumed after it.
    fn header_line(&mut self, line: &str, class: &Line<'_>) -> bool {
        match (self.header, class) {
            (HeaderState::Preamble { entries: false }, Line::Blank) => {
                self.output.push_blank();
                return true;
            }
            (HeaderState::Preamble { entries: true }, Line::Blank) => return true,
            (_, Line::Blank) => {
                self.header = HeaderState::Done;
                return false;
            }
            (
                _,
                Line::AttributeEntry { .. }
                | Line::AttributeUnset { .. }
                | Line::Comment
                | Line::Conditional(_)
                | Line::EndIf
                | Line::Delimiter(BlockKind::Comment)
                | Line::BlockAttributes(_),
            ) => {
                if let HeaderState::Preamble { .. } = self.header {
                    self.header = HeaderState::Preamble { entries: true };
                }
                return false;
            }
            (HeaderState::Preamble { .. }, Line::SectionTitle { level: 1, title }) => {
                self.document_title(title);
                return true;
            }
            (HeaderState::AfterTitle(seen), Line::Text) => {
                if seen == 0
                    && let Some(authors) = header::parse_author_line(line)
                {
                    header::apply_authors(&authors, &mut self.attributes);
                    self.header = HeaderState::AfterTitle(1);
                    return true;
                }
                if seen <= 1
                    && let Some(revision) = header::parse_revision_line(line)
                {
                    header::apply_revision(&revision, &mut self.attributes);
                    self.header = HeaderState::AfterTitle(2);
                    return true;
                }
            }
            _ => {}
        }
        if let HeaderState::AfterTitle(_) = self.header {
            self.output.push_blank();
        }
        self.header = HeaderState::Done;
        false
    }

    fn document_title(&mut self, title: &str) {
        let title = self.attributes.resolve(title).into_owned();
        self.attributes.set_doctitle(title.clone());
        if let Some(attributes) = self.pending.take()
            && let Some(id) = attributes.id
        {
            self.register_section(id, &title, attributes.reftext.as_deref());
        }
        self.output.push(format!("# {title}"));
        self.header = HeaderState::AfterTitle(0);
        self.paragraph_start = true;
    }

    fn body_line(&mut self, line: &str, class: Line<'_>) {
        if let Some(run) = self.literal
            && class != Line::Blank
        {
            self.literal_line(run, line);
            return;
        }

        match class {
            Line::Blank => self.blank(),
            Line::AttributeEntry { name, value } => self.attributes.set(name, value),
            Line::AttributeUnset { name } => self.attributes.unset(name),
            Line::Comment | Line::Conditional(_) | Line::EndIf => {}
            Line::Toc => {
                self.consume_pending();
            }
            Line::Delimiter(kind) => self.open_block(kind, line),
            Line::SectionTitle { level, title } => self.section(level, title),
            Line::BlockAttributes(raw) => {
                self.consume_pending();
                self.pending = Some(BlockAttributes::parse(raw));
            }
            Line::ListContinuation => {
                self.indent = Some("  ");
                self.output.push_blank();
                self.paragraph_start = true;
            }
            Line::UnorderedItem { depth, text } => {
                self.consume_pending();
                self.indent = None;
                let text = self.render_inline(text);
                self.emit(&block::unordered_item(depth, &text));
                self.paragraph_start = false;
            }
            Line::OrderedItem { depth, text } => {
                self.consume_pending();
                self.indent = None;
                let number = self.list.next_ordered(depth);
                let text = self.attributes.resolve(text).into_owned();
                self.emit(&block::ordered_item(number, depth, &text));
                self.paragraph_start = false;
            }
            Line::CalloutItem { number, text } => {
                self.consume_pending();
                let text = self.attributes.resolve(text).into_owned();
                self.emit(&format!("{number}. {text}"));
                self.paragraph_start = false;
            }
            Line::BlockTitle(title) => {
                let title = self.attributes.resolve(title).into_owned();
                self.emit(&format!("**{title}**"));
            }
            Line::Indented if self.paragraph_start => self.start_literal(line),
            Line::Indented => self.paragraph_line(line.trim_start()),
            Line::Text => {
                if line.starts_with(':') && self.is_render_pass() {
                    tracing::debug!(line = self.line_num, "malformed attribute entry treated as text");
                }
                self.paragraph_line(line);
            }
        }
    }

    fn blank(&mut self) {
        self.close_literal();
        self.output.push_blank();
        self.list.reset();
        self.indent = None;
        self.consume_pending();
        self.paragraph_start = true;
    }

    fn section(&mut self, level: usize, title: &str) {
        let title = self.attributes.resolve(title).into_owned();
        let attributes = self.pending.take();
        let reftext = attributes.as_ref().and_then(|a| a.reftext.clone());
        let id = attributes
            .and_then(|a| a.id)
            .unwrap_or_else(|| self.auto_id(&title));
        self.register_section(id, &title, reftext.as_deref());

        self.indent = None;
        self.list.reset();
        self.output.push(format!("{} {title}", "#".repeat(level)));
        self.paragraph_start = true;
    }

    fn auto_id(&self, title: &str) -> String {
        let prefix = self.attributes.get("idprefix").unwrap_or("");
        let separator = self.attributes.get("idseparator").unwrap_or("-");
        slug::section_id(title, prefix, separator)
    }

    fn paragraph_line(&mut self, line: &str) {
        let style = self
            .consume_pending()
            .and_then(|attributes| attributes.style)
            .and_then(|style| Admonition::from_keyword(&style));
        let mut text = self.render_inline(line);

        if self.paragraph_start {
            if let Some(admonition) = style {
                text = format!("{} {text}", admonition.label());
            } else if let Some(labelled) = admonition::rewrite_label(&text) {
                text = labelled;
            }
        }
        self.emit(&text);
        self.paragraph_start = false;
    }

    fn start_literal(&mut self, line: &str) {
        self.consume_pending();
        let run = LiteralRun::start(line);
        if run.console {
            self.emit("```console");
        }
        self.literal = Some(run);
        self.literal_line(run, line);
        self.paragraph_start = false;
    }

    fn literal_line(&mut self, run: LiteralRun, line: &str) {
        let content = run.outdent(line);
        if run.console {
            self.emit(content);
        } else {
            self.emit(&format!("    {content}"));
        }
    }

    fn close_literal(&mut self) {
        if let Some(run) = self.literal.take()
            && run.console
        {
            self.emit("```");
        }
    }

    fn open_block(&mut self, kind: BlockKind, line: &str) {
        let open = OpenBlock::new(kind, line);
        if kind.is_skipped() {
            self.consume_pending();
            self.mode = Mode::SkipBlock(open);
            return;
        }

        let attributes = self.consume_pending();
        let subs = attributes
            .as_ref()
            .is_some_and(BlockAttributes::has_attribute_subs);
        match kind {
            BlockKind::Listing | BlockKind::Literal => {
                let language = block::fence_language(kind, attributes.as_ref()).unwrap_or_default();
                self.emit(&format!("```{language}"));
            }
            BlockKind::Fenced => {
                let opener = if fence::fence_info(line).is_empty() {
                    let language = block::fence_language(kind, attributes.as_ref()).unwrap_or_default();
                    format!("{}{language}", open.closing_delimiter())
                } else {
                    line.trim().to_owned()
                };
                self.emit(&opener);
            }
            _ => {}
        }
        self.mode = Mode::Verbatim { block: open, subs };
    }

    fn verbatim_line(&mut self, raw: &str) {
        let Mode::Verbatim { block: open, subs } = &self.mode else {
            return;
        };
        if open.is_closed_by(raw.trim_end()) {
            self.close_verbatim();
            return;
        }

        let subs = *subs;
        let mut content = if open.kind() == BlockKind::Passthrough {
            Cow::Borrowed(raw)
        } else {
            block::replace_conums(raw)
        };
        if subs {
            content = Cow::Owned(self.attributes.resolve(&content).into_owned());
        }
        self.emit_raw(&content);
    }

    fn close_verbatim(&mut self) {
        if let Mode::Verbatim { block: open, .. } = std::mem::replace(&mut self.mode, Mode::Normal) {
            match open.kind() {
                BlockKind::Listing | BlockKind::Literal => self.emit("```"),
                BlockKind::Fenced => self.emit(&open.closing_delimiter()),
                _ => {}
            }
        }
        self.paragraph_start = true;
    }

    /// Close whatever is still open at end of input.
    fn finish(&mut self) {
        match &self.mode {
            Mode::Normal => {}
            Mode::Verbatim { .. } => {
                if self.is_render_pass() {
                    tracing::debug!(line = self.line_num, "unterminated block closed at end of input");
                }
                self.close_verbatim();
            }
            Mode::SkipBlock(_) | Mode::SkipConditional => {
                if self.is_render_pass() {
                    tracing::debug!(line = self.line_num, "unterminated skipped region ends at end of input");
                }
                self.mode = Mode::Normal;
            }
        }
        self.close_literal();
        self.consume_pending();
    }

    /// Take the pending block attributes, registering an id they carry as a
    /// standalone anchor.
    fn consume_pending(&mut self) -> Option<BlockAttributes> {
        let attributes = self.pending.take()?;
        if let Some(id) = &attributes.id
            && let RefPass::Collect(ids) = &mut self.pass
        {
            ids.register_anchor(id.clone(), attributes.reftext.as_deref());
        }
        Some(attributes)
    }

    fn register_section(&mut self, id: String, title: &str, reftext: Option<&str>) {
        if let RefPass::Collect(ids) = &mut self.pass {
            ids.register_section(id, title, reftext);
        }
    }

    fn render_inline(&self, text: &str) -> String {
        match &self.pass {
            RefPass::Collect(_) => text.to_owned(),
            RefPass::Resolve(ids) => inline::substitute(text, &self.attributes, ids),
        }
    }

    /// Emit a line with the continuation indent.
    fn emit(&mut self, line: &str) {
        match self.indent {
            Some(indent) if !line.is_empty() => self.output.push(format!("{indent}{line}")),
            _ => self.output.push(line),
        }
    }

    /// Emit verbatim content with the continuation indent, keeping blanks.
    fn emit_raw(&mut self, line: &str) {
        match self.indent {
            Some(indent) if !line.is_empty() => self.output.push_raw(format!("{indent}{line}")),
            _ => self.output.push_raw(line),
        }
    }
}
