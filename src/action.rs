use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks of the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert(char),
    Delete,
    /// Same text again
    Restart,
    /// Fresh text from the provider
    NewText,
    Quit,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
            KeyCode::Char(c) => Some(Self::Insert(c)),
            KeyCode::Backspace => Some(Self::Delete),
            KeyCode::Left => Some(Self::Restart),
            KeyCode::Right => Some(Self::NewText),
            KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }
}
