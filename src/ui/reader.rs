use crate::app::{App, ContentState};
use crate::util::{display_width, viewport};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame,
};
use thiserror::Error;

/// Bodies larger than this are shown as raw lines instead.
const MAX_RENDER_BYTES: usize = 4 * 1024 * 1024;

/// Narrowest width the renderer will wrap to.
const MIN_WRAP_WIDTH: usize = 20;

const RULE_WIDTH: usize = 40;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown of {0} bytes rendered to nothing")]
    Empty(usize),

    #[error("markdown too large to render: {0} bytes")]
    TooLarge(usize),
}

/// Turns document markdown into display rows.
///
/// Every returned line must fit in a single terminal row of `columns`, so
/// scrolling can count lines directly.
pub trait RichRenderer {
    fn render(&self, markdown: &str, columns: u16) -> Result<Vec<Line<'static>>, RenderError>;
}

/// pulldown-cmark backed renderer.
///
/// Wraps to the configured width, or to the terminal when that is narrower.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    wrap_width: usize,
}

impl MarkdownRenderer {
    pub fn new(wrap_width: u16) -> Self {
        Self {
            wrap_width: usize::from(wrap_width).max(MIN_WRAP_WIDTH),
        }
    }

    fn width_for(&self, columns: u16) -> usize {
        self.wrap_width.min(usize::from(columns)).max(MIN_WRAP_WIDTH)
    }
}

impl RichRenderer for MarkdownRenderer {
    fn render(&self, markdown: &str, columns: u16) -> Result<Vec<Line<'static>>, RenderError> {
        if markdown.len() > MAX_RENDER_BYTES {
            return Err(RenderError::TooLarge(markdown.len()));
        }

        let lines = render_markdown(markdown, self.width_for(columns));
        if lines.is_empty() && !markdown.trim().is_empty() {
            return Err(RenderError::Empty(markdown.len()));
        }
        Ok(lines)
    }
}

// ============================================================================
// Markdown walk
// ============================================================================

#[derive(Default)]
struct Inline {
    heading: Option<pulldown_cmark::HeadingLevel>,
    strong: bool,
    emphasis: bool,
    link: bool,
}

impl Inline {
    fn style(&self) -> Style {
        if let Some(level) = self.heading {
            let style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            return if level == pulldown_cmark::HeadingLevel::H1 {
                style.add_modifier(Modifier::UNDERLINED)
            } else {
                style
            };
        }
        let mut style = Style::default();
        if self.strong {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.emphasis {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.link {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}

struct ActiveLink {
    dest: String,
    text: String,
}

struct Walker {
    width: usize,
    lines: Vec<Line<'static>>,
    /// Spans of the logical line being built, before wrapping.
    block: Vec<Span<'static>>,
    inline: Inline,
    quote_depth: usize,
    /// Next number for ordered lists, `None` for bullets.
    lists: Vec<Option<u64>>,
    item_marker: Option<String>,
    code_block: Option<String>,
    link: Option<ActiveLink>,
    in_image: bool,
}

fn render_markdown(markdown: &str, width: usize) -> Vec<Line<'static>> {
    let mut walker = Walker {
        width,
        lines: Vec::with_capacity(markdown.lines().count()),
        block: Vec::with_capacity(4),
        inline: Inline::default(),
        quote_depth: 0,
        lists: Vec::new(),
        item_marker: None,
        code_block: None,
        link: None,
        in_image: false,
    };
    for event in Parser::new(markdown) {
        walker.event(event);
    }
    walker.finish()
}

impl Walker {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if self.code_block.is_none() {
                    self.push(format!("`{}`", code), Style::default().fg(Color::Yellow));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let html = html.trim_end_matches('\n');
                if !html.is_empty() {
                    self.push(html.to_string(), Style::default().fg(Color::DarkGray));
                }
            }
            Event::SoftBreak => {
                if let Some(code) = self.code_block.as_mut() {
                    code.push('\n');
                } else {
                    self.push(" ".to_string(), self.inline.style());
                }
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.block.push(Span::styled(
                    "─".repeat(RULE_WIDTH.min(self.width)),
                    Style::default().fg(Color::DarkGray),
                ));
                self.flush();
                self.blank();
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.push(marker.to_string(), Style::default().fg(Color::DarkGray));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.inline.heading = Some(level);
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::List(first) => {
                // text of a tight parent item comes before its nested list
                self.flush();
                self.lists.push(first);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.item_marker = Some(marker);
            }
            Tag::Emphasis => self.inline.emphasis = true,
            Tag::Strong => self.inline.strong = true,
            Tag::Link { dest_url, .. } => {
                self.inline.link = true;
                self.link = Some(ActiveLink {
                    dest: dest_url.into_string(),
                    text: String::new(),
                });
            }
            Tag::Image { dest_url, .. } => {
                self.in_image = true;
                self.push(
                    format!("[Image: {}]", dest_url),
                    Style::default().fg(Color::Blue),
                );
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading { .. } => {
                self.flush();
                self.inline.heading = None;
                self.blank();
            }
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code_block.take() {
                    self.code_lines(&code);
                }
                self.blank();
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => {
                self.flush();
                self.item_marker = None;
            }
            TagEnd::Emphasis => self.inline.emphasis = false,
            TagEnd::Strong => self.inline.strong = false,
            TagEnd::Link => {
                self.inline.link = false;
                if let Some(link) = self.link.take() {
                    if !link.dest.is_empty() && link.text.trim() != link.dest {
                        self.push(
                            format!(" ({})", link.dest),
                            Style::default().fg(Color::Blue),
                        );
                    }
                }
            }
            TagEnd::Image => self.in_image = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = self.code_block.as_mut() {
            code.push_str(text);
            return;
        }
        if self.in_image {
            return;
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
        self.push(text.to_string(), self.inline.style());
    }

    fn push(&mut self, text: String, style: Style) {
        if !text.is_empty() {
            self.block.push(Span::styled(text, style));
        }
    }

    /// Prefix for the first row of the current block, and for its continuations.
    fn prefixes(&mut self) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
        let mut base = Vec::new();
        if self.quote_depth > 0 {
            base.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        let depth = self.lists.len();
        match self.item_marker.take() {
            Some(marker) => {
                let indent = "  ".repeat(depth.saturating_sub(1));
                let mut first = base.clone();
                first.push(Span::raw(format!("{}{}", indent, marker)));
                let mut rest = base;
                rest.push(Span::raw(" ".repeat(indent.len() + display_width(&marker))));
                (first, rest)
            }
            None => {
                if depth > 0 {
                    base.push(Span::raw("  ".repeat(depth)));
                }
                (base.clone(), base)
            }
        }
    }

    fn flush(&mut self) {
        if self.block.iter().all(|span| span.content.trim().is_empty()) {
            self.block.clear();
            return;
        }
        let spans = std::mem::take(&mut self.block);
        let (first, rest) = self.prefixes();
        let wrapped = wrap_block(&spans, self.width, first, &rest);
        self.lines.extend(wrapped);
    }

    fn code_lines(&mut self, code: &str) {
        let style = Style::default().fg(Color::Yellow).bg(Color::Black);
        let (first, _) = self.prefixes();
        for line in code.trim_end_matches('\n').split('\n') {
            // blank code lines still take a row
            let spans = [Span::styled(line.to_string(), style)];
            self.lines.extend(wrap_block(&spans, self.width, first.clone(), &first));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

// ============================================================================
// Wrapping
// ============================================================================

fn prefix_width(prefix: &[Span<'_>]) -> usize {
    prefix.iter().map(|s| display_width(&s.content)).sum()
}

fn wrap_options(width: usize) -> textwrap::Options<'static> {
    textwrap::Options::new(width.max(1))
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit)
}

/// Pieces of `spans` covering bytes `start..end` of their joined text.
fn slice_spans(spans: &[Span<'static>], start: usize, end: usize) -> Vec<Span<'static>> {
    let mut out = Vec::new();
    let mut offset = 0;
    for span in spans {
        let len = span.content.len();
        let (from, to) = (start.max(offset), end.min(offset + len));
        if from < to {
            out.push(Span::styled(
                span.content[from - offset..to - offset].to_string(),
                span.style,
            ));
        }
        offset += len;
    }
    out
}

/// Word wrap a styled block, keeping span styles across row breaks.
///
/// textwrap works on the joined text; each row it returns is a slice of that
/// text, so it is located again and cut back out of the original spans.
fn wrap_block(
    spans: &[Span<'static>],
    width: usize,
    first: Vec<Span<'static>>,
    rest: &[Span<'static>],
) -> Vec<Line<'static>> {
    let text: String = spans.iter().map(|s| &*s.content).collect();
    let room = width.saturating_sub(prefix_width(&first).max(prefix_width(rest)));

    let mut lines = Vec::new();
    let mut cursor = 0;
    for (i, row) in textwrap::wrap(&text, wrap_options(room)).iter().enumerate() {
        let row: &str = row;
        let mut line = if i == 0 { first.clone() } else { rest.to_vec() };
        match text[cursor..].find(row) {
            Some(at) => {
                let start = cursor + at;
                cursor = start + row.len();
                line.extend(slice_spans(spans, start, cursor));
            }
            None => line.push(Span::raw(row.to_string())),
        }
        lines.push(Line::from(line));
    }
    lines
}

// ============================================================================
// View
// ============================================================================

/// Render the reader body: header, content window, and scroll indicator.
pub(super) fn render(f: &mut Frame, app: &App, header: Rect, body: Rect, position: Rect) {
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "📖 Reading",
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        header,
    );

    let lines = app.content_lines();
    if !matches!(app.content_state, ContentState::Loaded { .. }) || lines.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "Loading content...",
                Style::default().fg(Color::DarkGray),
            )),
            body,
        );
        return;
    }

    let capacity = app.reader_capacity();
    let range = viewport::scroll_window(lines.len(), app.scroll_offset, capacity);
    let text = Text::from_iter(lines[range].iter().cloned());
    f.render_widget(Paragraph::new(text), body);

    if lines.len() > capacity {
        let percent = viewport::scroll_percent(app.scroll_offset, lines.len(), capacity);
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("[{}%]", percent),
                Style::default().fg(Color::DarkGray),
            )),
            position,
        );
    }
}
