//! Render dispatch for the TUI.
//!
//! Rendering is a pure function of `App` and the frame area.

use crate::app::{App, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{documents, reader, status};

pub(super) const MIN_WIDTH: u16 = 20;

/// Smallest height whose body area holds the minimum pager capacity,
/// so the selected row and the last content line are always drawable.
pub(super) fn min_height(view: View) -> u16 {
    match view {
        View::List => 12,
        View::Reader => 15,
    }
}

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < min_height(app.view) {
        let msg = if area.width < MIN_WIDTH {
            "Too small"
        } else {
            "Terminal too small"
        };
        f.render_widget(Paragraph::new(msg).alignment(Alignment::Center), area);
        return;
    }

    match app.view {
        View::List => {
            // header, category bar, documents, position, gap, key hints
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Length(2),
                    Constraint::Min(0),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(area);
            documents::render(f, app, chunks[0], chunks[1], chunks[2], chunks[3]);
            status::render(f, app, chunks[5]);
        }
        View::Reader => {
            // header, content, gap, scroll position, key hints
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Min(0),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(area);
            reader::render(f, app, chunks[0], chunks[1], chunks[3]);
            status::render(f, app, chunks[4]);
        }
    }
}
