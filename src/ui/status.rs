use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Key hints for the current view.
///
/// The category hint is only offered when there is more than one category.
pub(super) fn help_text(app: &App) -> Cow<'static, str> {
    match app.view {
        View::List if app.categories.len() > 1 => {
            Cow::Borrowed("↑/↓ j/k move, enter read, ←/→ h/l switch category, r refresh, q quit")
        }
        View::List => Cow::Borrowed("↑/↓ j/k move, enter read, r refresh, q quit"),
        View::Reader => Cow::Borrowed("↑/↓ j/k scroll, esc back, q quit"),
    }
}

/// Render the key hint bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(help_text(app)).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Category;
    use crate::keybindings::KeybindingRegistry;
    use crate::ui::reader::MarkdownRenderer;

    fn app() -> App {
        App::new(KeybindingRegistry::new(), Box::new(MarkdownRenderer::new(80)))
    }

    fn category(location: &str) -> Category {
        Category {
            location: location.to_string(),
            name: location.to_string(),
            count: 1,
        }
    }

    #[test]
    fn test_single_category_hides_switch_hint() {
        let mut app = app();
        app.categories = vec![category("new")];
        assert!(!help_text(&app).contains("switch category"));
        assert!(help_text(&app).ends_with("r refresh, q quit"));
    }

    #[test]
    fn test_multiple_categories_show_switch_hint() {
        let mut app = app();
        app.categories = vec![category("new"), category("later")];
        assert!(help_text(&app).contains("←/→ h/l switch category"));
    }

    #[test]
    fn test_reader_hint() {
        let mut app = app();
        app.view = View::Reader;
        assert_eq!(help_text(&app), "↑/↓ j/k scroll, esc back, q quit");
    }
}
