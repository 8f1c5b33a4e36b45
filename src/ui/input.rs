//! Keyboard input handling.
//!
//! Input never performs I/O. Work that has to happen in the background is
//! returned as [`Action::Spawn`] for the event loop to start.

use crate::app::{App, View};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crossterm::event::{KeyCode, KeyModifiers};

use super::Action;

fn view_context(view: View) -> KbContext {
    match view {
        View::List => KbContext::List,
        View::Reader => KbContext::Reader,
    }
}

/// Apply one key press to `app`.
pub(super) fn handle_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    // not rebindable, so there is always a way out
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, view_context(app.view))
    else {
        return Action::Continue;
    };

    match (app.view, action) {
        (_, KbAction::Quit) => return Action::Quit,
        (_, KbAction::MoveUp) => app.move_up(),
        (_, KbAction::MoveDown) => app.move_down(),
        (_, KbAction::PageUp) => app.page_up(),
        (_, KbAction::PageDown) => app.page_down(),
        (View::List, KbAction::PrevCategory) => app.prev_category(),
        (View::List, KbAction::NextCategory) => app.next_category(),
        (View::List, KbAction::Open) => {
            if let Some(task) = app.open_selected() {
                return Action::Spawn(task);
            }
        }
        (View::List, KbAction::Refresh) => return Action::Spawn(app.begin_document_load()),
        (View::Reader, KbAction::Back) => app.close_reader(),
        (view, action) => {
            tracing::trace!(?view, ?action, "Action not available in this view");
        }
    }
    Action::Continue
}
