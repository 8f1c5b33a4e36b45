use crate::app::App;
use crate::documents::Document;
use crate::util::{display_width, truncate_to_width, viewport};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame,
};

/// Titles are never squeezed below this to make room for metadata.
const MIN_TITLE_WIDTH: usize = 16;

/// Tab bar of all categories with counts, active one bracketed.
pub(super) fn category_bar(app: &App) -> Line<'static> {
    if let [only] = app.categories.as_slice() {
        return Line::from(format!("{} ({})", only.name, only.count));
    }

    let mut spans = Vec::with_capacity(app.categories.len() * 2);
    for (i, category) in app.categories.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        if i == app.selected_category {
            spans.push(Span::styled(
                format!("[{} ({})]", category.name, category.count),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!("{} ({})", category.name, category.count)));
        }
    }
    Line::from(spans)
}

/// Dim `· N words · date` suffix, empty when neither is known.
fn metadata(doc: &Document) -> String {
    let mut parts = Vec::with_capacity(2);
    if doc.word_count > 0 {
        parts.push(format!("{} words", doc.word_count));
    }
    if !doc.published_date.is_empty() {
        parts.push(doc.published_date.clone());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("  · {}", parts.join(" · "))
    }
}

fn document_line(doc: &Document, selected: bool, width: usize) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let mut meta = metadata(doc);
    let mut title_width = width.saturating_sub(display_width(marker) + display_width(&meta));
    if title_width < MIN_TITLE_WIDTH {
        meta.clear();
        title_width = width.saturating_sub(display_width(marker));
    }

    let title_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(marker, title_style),
        Span::styled(truncate_to_width(&doc.title, title_width).into_owned(), title_style),
    ];
    if !meta.is_empty() {
        spans.push(Span::styled(meta, Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

/// Body of the list view: error, loading, empty, or the visible window.
pub(super) fn body_lines(app: &App) -> Vec<Line<'static>> {
    if let Some(error) = &app.error {
        let red = Style::default().fg(Color::Red);
        return vec![
            Line::from(Span::styled(format!("Error: {}", error), red)),
            Line::default(),
            Line::from("Press r to retry."),
            Line::from("Set token: reader config set-token <token>"),
        ];
    }
    if app.loading {
        return vec![Line::from("Loading...")];
    }
    if app.visible.is_empty() {
        return vec![Line::from("No documents found.")];
    }

    let width = usize::from(app.width);
    viewport::window(app.visible.len(), app.selected, app.list_capacity())
        .map(|i| document_line(&app.visible[i], i == app.selected, width))
        .collect()
}

/// `(n/m)` once the list no longer fits.
pub(super) fn position(app: &App) -> Option<String> {
    let total = app.visible.len();
    (app.error.is_none() && !app.loading && total > app.list_capacity())
        .then(|| format!("({}/{})", app.selected + 1, total))
}

/// Render the document list view.
pub(super) fn render(f: &mut Frame, app: &App, header: Rect, bar: Rect, body: Rect, pos: Rect) {
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "📚 Reader",
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        header,
    );

    if !app.categories.is_empty() {
        f.render_widget(Paragraph::new(category_bar(app)), bar);
    }

    f.render_widget(Paragraph::new(Text::from(body_lines(app))), body);

    if let Some(text) = position(app) {
        f.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
            pos,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Task;
    use crate::keybindings::KeybindingRegistry;
    use crate::ui::reader::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    fn doc(id: usize, location: &str) -> Document {
        Document {
            id: id.to_string(),
            title: format!("Doc {}", id),
            location: location.to_string(),
            ..Default::default()
        }
    }

    fn loaded(documents: Vec<Document>) -> App {
        let mut app = App::new(KeybindingRegistry::new(), Box::new(MarkdownRenderer::new(80)));
        let Task::LoadDocuments { generation } = app.begin_document_load() else {
            unreachable!()
        };
        app.apply_documents(generation, documents);
        app
    }

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_single_category_unbracketed() {
        let app = loaded(vec![doc(1, "new"), doc(2, "new")]);
        assert_eq!(category_bar(&app).to_string(), "📥 New (2)");
    }

    #[test]
    fn test_active_category_bracketed() {
        let mut app = loaded(vec![doc(1, "new"), doc(2, "later"), doc(3, "later")]);
        app.next_category();
        assert_eq!(category_bar(&app).to_string(), "📥 New (1) | [🕐 Later (2)]");
    }

    #[test]
    fn test_body_states() {
        let mut app = App::new(KeybindingRegistry::new(), Box::new(MarkdownRenderer::new(80)));
        assert_eq!(text(&body_lines(&app)), vec!["Loading..."]);

        app = loaded(Vec::new());
        assert_eq!(text(&body_lines(&app)), vec!["No documents found."]);

        app.error = Some("request timed out after 30s".to_string());
        assert_eq!(
            text(&body_lines(&app)),
            vec![
                "Error: request timed out after 30s",
                "",
                "Press r to retry.",
                "Set token: reader config set-token <token>"
            ]
        );
    }

    #[test]
    fn test_selected_item_marked() {
        let mut app = loaded(vec![doc(1, "new"), doc(2, "new")]);
        app.move_down();
        assert_eq!(text(&body_lines(&app)), vec!["  Doc 1", "> Doc 2"]);
    }

    #[test]
    fn test_metadata_suffix() {
        let mut d = doc(1, "new");
        d.word_count = 1200;
        d.published_date = "2024-03-05".to_string();
        let line = document_line(&d, false, 80);
        assert_eq!(line.to_string(), "  Doc 1  · 1200 words · 2024-03-05");
    }

    #[test]
    fn test_metadata_dropped_when_narrow() {
        let mut d = doc(1, "new");
        d.title = "A fairly long title for a narrow terminal".to_string();
        d.word_count = 1200;
        let line = document_line(&d, true, 24);
        assert!(line.width() <= 24);
        assert!(!line.to_string().contains("words"));
        assert!(line.to_string().starts_with("> A fairly"));
    }

    #[test]
    fn test_position_only_when_overflowing() {
        let mut app = loaded((0..30).map(|i| doc(i, "new")).collect());
        app.resize(80, 20); // capacity 12
        app.move_down();
        assert_eq!(position(&app).as_deref(), Some("(2/30)"));
        assert_eq!(body_lines(&app).len(), 12);

        app.resize(80, 50);
        assert_eq!(position(&app), None);
    }
}
