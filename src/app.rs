use crate::documents::{build_categories, filter_by_location, Category, Document};
use crate::keybindings::KeybindingRegistry;
use crate::ui::reader::RichRenderer;
use crate::util::viewport;
use ratatui::text::Line;
use std::sync::Arc;

// ============================================================================
// View and Content State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,   // Category bar + document list
    Reader, // Full-screen document body
}

/// Body of the document open in the reader.
#[derive(Debug, Clone)]
pub enum ContentState {
    Idle,
    Loading {
        document_id: String,
    },
    Loaded {
        raw: String,
        lines: Vec<Line<'static>>,
    },
}

// ============================================================================
// Events and Tasks
// ============================================================================

/// Completions sent back to the event loop by background tasks.
///
/// Every load carries the generation it was issued under. Completions from
/// an older generation are dropped, so the most recently issued load wins.
#[derive(Debug)]
pub enum AppEvent {
    DocumentsLoaded {
        generation: u64,
        documents: Vec<Document>,
    },
    DocumentsFailed {
        generation: u64,
        error: String,
    },
    ContentLoaded {
        generation: u64,
        document_id: String,
        content: String,
    },
    /// A background task panicked. `task` names it for the log.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

/// Background work requested by a state transition.
///
/// State methods only describe the work; the UI loop owns spawning it.
#[derive(Debug, Clone)]
pub enum Task {
    LoadDocuments { generation: u64 },
    LoadContent { generation: u64, document: Arc<Document> },
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub keybindings: KeybindingRegistry,
    renderer: Box<dyn RichRenderer>,

    pub view: View,

    /// Every valid document from the last successful load.
    pub documents: Vec<Arc<Document>>,
    /// Documents in the active category, in load order.
    pub visible: Vec<Arc<Document>>,
    pub categories: Vec<Category>,
    pub selected_category: usize,
    /// Index into `visible`.
    pub selected: usize,

    pub content_state: ContentState,
    pub reader_document: Option<Arc<Document>>,
    pub scroll_offset: usize,

    pub error: Option<String>,
    pub loading: bool,

    pub width: u16,
    pub height: u16,

    documents_generation: u64,
    content_generation: u64,

    pub needs_redraw: bool,
}

impl App {
    pub fn new(keybindings: KeybindingRegistry, renderer: Box<dyn RichRenderer>) -> Self {
        Self {
            keybindings,
            renderer,
            view: View::List,
            documents: Vec::new(),
            visible: Vec::new(),
            categories: Vec::new(),
            selected_category: 0,
            selected: 0,
            content_state: ContentState::Idle,
            reader_document: None,
            scroll_offset: 0,
            error: None,
            loading: true,
            width: 80,
            height: 24,
            documents_generation: 0,
            content_generation: 0,
            needs_redraw: true,
        }
    }

    // ------------------------------------------------------------------------
    // Document loading
    // ------------------------------------------------------------------------

    /// Start a (re)load of every document. Supersedes any load in flight.
    pub fn begin_document_load(&mut self) -> Task {
        self.documents_generation += 1;
        self.loading = true;
        self.error = None;
        tracing::debug!(generation = self.documents_generation, "Requesting document load");
        Task::LoadDocuments {
            generation: self.documents_generation,
        }
    }

    /// Replace the document set. Returns `false` for a stale generation.
    pub fn apply_documents(&mut self, generation: u64, documents: Vec<Document>) -> bool {
        if generation != self.documents_generation {
            tracing::debug!(
                generation,
                current = self.documents_generation,
                "Discarding stale document load"
            );
            return false;
        }

        let total = documents.len();
        self.documents = documents
            .into_iter()
            .filter(Document::is_valid)
            .map(Arc::new)
            .collect();
        self.categories = build_categories(&self.documents);
        self.selected_category = 0;
        self.refilter();
        self.loading = false;
        self.error = None;

        tracing::info!(
            received = total,
            valid = self.documents.len(),
            categories = self.categories.len(),
            "Documents loaded"
        );
        true
    }

    /// Record a failed load. Returns `false` for a stale generation.
    pub fn apply_load_failure(&mut self, generation: u64, error: String) -> bool {
        if generation != self.documents_generation {
            return false;
        }
        tracing::warn!(error = %error, "Document load failed");
        self.error = Some(error);
        self.loading = false;
        true
    }

    fn refilter(&mut self) {
        self.visible = match self.categories.get(self.selected_category) {
            Some(category) => filter_by_location(&self.documents, &category.location),
            None => Vec::new(),
        };
        self.selected = 0;
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn list_capacity(&self) -> usize {
        viewport::list_capacity(self.height)
    }

    pub fn reader_capacity(&self) -> usize {
        viewport::reader_capacity(self.height)
    }

    /// Rendered lines of the open document, empty while loading.
    pub fn content_lines(&self) -> &[Line<'static>] {
        match &self.content_state {
            ContentState::Loaded { lines, .. } => lines,
            _ => &[],
        }
    }

    pub fn max_scroll(&self) -> usize {
        viewport::max_scroll(self.content_lines().len(), self.reader_capacity())
    }

    pub fn move_up(&mut self) {
        self.move_by(-1);
    }

    pub fn move_down(&mut self) {
        self.move_by(1);
    }

    pub fn page_up(&mut self) {
        let step = self.page_step();
        self.move_by(-(step as isize));
    }

    pub fn page_down(&mut self) {
        let step = self.page_step();
        self.move_by(step as isize);
    }

    fn page_step(&self) -> usize {
        match self.view {
            View::List => viewport::half_page(self.list_capacity()),
            View::Reader => viewport::half_page(self.reader_capacity()),
        }
    }

    /// Move the selection (list) or scroll offset (reader), clamped.
    fn move_by(&mut self, delta: isize) {
        match self.view {
            View::List => {
                let last = self.visible.len().saturating_sub(1);
                self.selected = self.selected.saturating_add_signed(delta).min(last);
            }
            View::Reader => {
                let max = self.max_scroll();
                self.scroll_offset = self.scroll_offset.saturating_add_signed(delta).min(max);
            }
        }
    }

    pub fn prev_category(&mut self) {
        if self.view == View::List && self.selected_category > 0 {
            self.selected_category -= 1;
            self.refilter();
        }
    }

    pub fn next_category(&mut self) {
        if self.view == View::List && self.selected_category + 1 < self.categories.len() {
            self.selected_category += 1;
            self.refilter();
        }
    }

    pub fn active_category(&self) -> Option<&Category> {
        self.categories.get(self.selected_category)
    }

    pub fn selected_document(&self) -> Option<&Arc<Document>> {
        self.visible.get(self.selected)
    }

    // ------------------------------------------------------------------------
    // Reader
    // ------------------------------------------------------------------------

    /// Open the selected document. `None` when there is nothing to open.
    pub fn open_selected(&mut self) -> Option<Task> {
        if self.view != View::List {
            return None;
        }
        let document = Arc::clone(self.visible.get(self.selected)?);

        self.content_generation += 1;
        self.view = View::Reader;
        self.scroll_offset = 0;
        self.content_state = ContentState::Loading {
            document_id: document.id.clone(),
        };
        self.reader_document = Some(Arc::clone(&document));

        tracing::debug!(document_id = %document.id, "Opening document");
        Some(Task::LoadContent {
            generation: self.content_generation,
            document,
        })
    }

    pub fn close_reader(&mut self) {
        // invalidates any content load still in flight
        self.content_generation += 1;
        self.view = View::List;
        self.content_state = ContentState::Idle;
        self.reader_document = None;
        self.scroll_offset = 0;
    }

    /// Install loaded content. Ignored outside the reader or when stale.
    pub fn apply_content(&mut self, generation: u64, document_id: &str, content: String) -> bool {
        if self.view != View::Reader || generation != self.content_generation {
            tracing::debug!(document_id, generation, "Discarding stale content");
            return false;
        }

        let lines = self.render_content(&content);
        self.scroll_offset = 0;
        self.content_state = ContentState::Loaded { raw: content, lines };
        true
    }

    /// Show something in place of content whose load task died.
    ///
    /// The document summary is used when there is one, otherwise the error.
    pub fn apply_content_failure(&mut self, error: &str) -> bool {
        if self.view != View::Reader || !matches!(self.content_state, ContentState::Loading { .. }) {
            return false;
        }
        let raw = match self.reader_document.as_deref() {
            Some(doc) if !doc.summary.trim().is_empty() => doc.summary.clone(),
            _ => format!("Failed to load content: {}", error),
        };
        let lines = self.render_content(&raw);
        self.scroll_offset = 0;
        self.content_state = ContentState::Loaded { raw, lines };
        true
    }

    fn render_content(&self, raw: &str) -> Vec<Line<'static>> {
        match self.renderer.render(raw, self.width) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(error = %e, "Rich render failed, showing raw text");
                raw.split('\n').map(|l| Line::from(l.to_string())).collect()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Terminal
    // ------------------------------------------------------------------------

    /// Record new terminal dimensions. Loaded content is re-wrapped when
    /// the width changes.
    pub fn resize(&mut self, width: u16, height: u16) {
        let rewrap = width != self.width;
        self.width = width;
        self.height = height;
        if rewrap {
            if let ContentState::Loaded { raw, .. } = &self.content_state {
                let lines = self.render_content(raw);
                if let ContentState::Loaded { lines: current, .. } = &mut self.content_state {
                    *current = lines;
                }
            }
        }
        self.clamp();
    }

    /// Pull selection and scroll offset back into range.
    pub fn clamp(&mut self) {
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }
}
