//! Keybinding registry: maps keys to actions per view, with config overrides.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// Everything a key press can ask the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    PrevCategory,
    NextCategory,
    Open,
    Back,
    Refresh,
}

// ============================================================================
// Context Enum
// ============================================================================

/// Which bindings are active. View-specific bindings shadow `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    List,
    Reader,
}

// ============================================================================
// Key Specification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report `Shift` alongside uppercase letters; the character
    /// already carries that information.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) if self.modifiers == KeyModifiers::SHIFT => Self::plain(self.code),
            _ => self,
        }
    }
}

/// Parse a key string from config.
///
/// Accepts single characters (`q`, `/`), named keys (`Enter`, `Esc`,
/// `PageDown`, ...), `Ctrl+<char>` and `F1` to `F12`.
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return chars.next().is_none().then(|| KeySpec::ctrl(c));
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "pageup" | "pgup" => Some(KeyCode::PageUp),
        "pagedown" | "pgdn" => Some(KeyCode::PageDown),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
    {
        return Some(KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| KeySpec::plain(KeyCode::Char(c)))
}

/// Parse an action name from the `[keybindings]` config table.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "move_up" | "moveup" | "up" => Some(Action::MoveUp),
        "move_down" | "movedown" | "down" => Some(Action::MoveDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "prev_category" | "prevcategory" | "left" => Some(Action::PrevCategory),
        "next_category" | "nextcategory" | "right" => Some(Action::NextCategory),
        "open" | "select" | "enter" => Some(Action::Open),
        "back" => Some(Action::Back),
        "refresh" => Some(Action::Refresh),
        _ => None,
    }
}

// ============================================================================
// Keybinding Registry
// ============================================================================

pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn bind_all(&mut self, context: Context, keys: &[KeySpec], action: Action) {
        for &key in keys {
            self.bind(context, key, action);
        }
    }

    fn register_defaults(&mut self) {
        use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Up};

        // movement means selection in the list and scrolling in the reader
        self.bind(Context::Global, KeySpec::plain(Char('q')), Action::Quit);
        self.bind_all(
            Context::Global,
            &[KeySpec::plain(Up), KeySpec::plain(Char('k'))],
            Action::MoveUp,
        );
        self.bind_all(
            Context::Global,
            &[KeySpec::plain(Down), KeySpec::plain(Char('j'))],
            Action::MoveDown,
        );
        self.bind_all(
            Context::Global,
            &[KeySpec::plain(KeyCode::PageUp), KeySpec::ctrl('u')],
            Action::PageUp,
        );
        self.bind_all(
            Context::Global,
            &[KeySpec::plain(KeyCode::PageDown), KeySpec::ctrl('d')],
            Action::PageDown,
        );

        self.bind_all(
            Context::List,
            &[KeySpec::plain(Left), KeySpec::plain(Char('h'))],
            Action::PrevCategory,
        );
        self.bind_all(
            Context::List,
            &[KeySpec::plain(Right), KeySpec::plain(Char('l'))],
            Action::NextCategory,
        );
        self.bind(Context::List, KeySpec::plain(Enter), Action::Open);
        self.bind(Context::List, KeySpec::plain(Char('r')), Action::Refresh);

        self.bind_all(
            Context::Reader,
            &[KeySpec::plain(Esc), KeySpec::plain(Backspace)],
            Action::Back,
        );
    }

    /// Apply overrides from the config `[keybindings]` table.
    ///
    /// Keys are action names (`quit`, `move_down`, ...), values are key
    /// strings (`q`, `Ctrl+d`, `F5`). An override replaces every default key
    /// for that action, in every context the action was bound in.
    ///
    /// Returns one warning per entry that could not be applied.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    /// Action for a key in `context`, falling back to `Global`.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();

        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
