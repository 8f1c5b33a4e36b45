//! Background task completion handling.

use crate::app::{App, AppEvent};
use crate::documents::Document;
use crate::util::strip_control_chars;
use std::borrow::Cow;

/// Server text is printed straight to the terminal, so escape sequences in
/// it must not survive.
fn clean(text: String) -> String {
    let stripped = match strip_control_chars(&text) {
        Cow::Owned(stripped) => Some(stripped),
        Cow::Borrowed(_) => None,
    };
    stripped.unwrap_or(text)
}

fn sanitize(doc: Document) -> Document {
    Document {
        title: clean(doc.title),
        author: clean(doc.author),
        published_date: clean(doc.published_date),
        ..doc
    }
}

/// Apply a completion from a background task to `app`.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::DocumentsLoaded {
            generation,
            documents,
        } => {
            let documents = documents.into_iter().map(sanitize).collect();
            app.apply_documents(generation, documents);
        }
        AppEvent::DocumentsFailed { generation, error } => {
            app.apply_load_failure(generation, clean(error));
        }
        AppEvent::ContentLoaded {
            generation,
            document_id,
            content,
        } => {
            app.apply_content(generation, &document_id, clean(content));
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            match task {
                "load_documents" => {
                    app.loading = false;
                    app.error = Some(format!("Internal error while loading documents: {}", error));
                }
                "load_content" => {
                    app.apply_content_failure(&clean(error));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ContentState, Task, View};
    use crate::keybindings::KeybindingRegistry;
    use crate::ui::reader::MarkdownRenderer;
    use pretty_assertions::assert_eq;

    fn app() -> App {
        App::new(KeybindingRegistry::new(), Box::new(MarkdownRenderer::new(80)))
    }

    fn generation_of(task: Task) -> u64 {
        match task {
            Task::LoadDocuments { generation } | Task::LoadContent { generation, .. } => generation,
        }
    }

    #[test]
    fn test_documents_are_sanitized() {
        let mut app = app();
        let generation = generation_of(app.begin_document_load());
        handle_app_event(
            &mut app,
            AppEvent::DocumentsLoaded {
                generation,
                documents: vec![Document {
                    id: "1".to_string(),
                    title: "Evil\x1b[2J title".to_string(),
                    location: "new".to_string(),
                    ..Default::default()
                }],
            },
        );
        assert_eq!(app.visible[0].title, "Evil title");
    }

    #[test]
    fn test_failure_recorded() {
        let mut app = app();
        let generation = generation_of(app.begin_document_load());
        handle_app_event(
            &mut app,
            AppEvent::DocumentsFailed {
                generation,
                error: "HTTP error: status 500".to_string(),
            },
        );
        assert_eq!(app.error.as_deref(), Some("HTTP error: status 500"));
        assert!(!app.loading);
    }

    #[test]
    fn test_content_applied_in_reader() {
        let mut app = app();
        let generation = generation_of(app.begin_document_load());
        handle_app_event(
            &mut app,
            AppEvent::DocumentsLoaded {
                generation,
                documents: vec![Document {
                    id: "1".to_string(),
                    title: "T".to_string(),
                    ..Default::default()
                }],
            },
        );
        let Some(task) = app.open_selected() else {
            panic!("expected a document to open");
        };
        handle_app_event(
            &mut app,
            AppEvent::ContentLoaded {
                generation: generation_of(task),
                document_id: "1".to_string(),
                content: "# T\n\nbody\x07".to_string(),
            },
        );
        assert_eq!(app.view, View::Reader);
        match &app.content_state {
            ContentState::Loaded { raw, .. } => assert_eq!(raw, "# T\n\nbody"),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn test_document_task_panic_stops_loading() {
        let mut app = app();
        app.begin_document_load();
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "load_documents",
                error: "boom".to_string(),
            },
        );
        assert!(!app.loading);
        assert!(app.error.as_deref().is_some_and(|e| e.contains("boom")));
    }

    #[test]
    fn test_content_task_panic_leaves_loading_screen() {
        let mut app = app();
        let generation = generation_of(app.begin_document_load());
        handle_app_event(
            &mut app,
            AppEvent::DocumentsLoaded {
                generation,
                documents: vec![Document {
                    id: "1".to_string(),
                    title: "T".to_string(),
                    ..Default::default()
                }],
            },
        );
        app.open_selected();
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "load_content",
                error: "renderer blew up".to_string(),
            },
        );
        assert!(matches!(app.content_state, ContentState::Loaded { .. }));
        assert!(app.content_lines()[0].to_string().contains("renderer blew up"));
    }
}
