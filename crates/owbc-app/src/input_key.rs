//! Abstract input key event, independent of terminal library.
//!
//! The engine never sees crossterm types; the TUI boundary converts
//! `crossterm::event::KeyEvent` into this enum before dispatch.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),
    /// Character with Ctrl modifier
    CharCtrl(char),

    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    Enter,
    Esc,
    Tab,
    BackTab,
    Backspace,
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_modifier_distinguishes_keys() {
        assert_eq!(InputKey::Char('c'), InputKey::Char('c'));
        assert_ne!(InputKey::CharCtrl('c'), InputKey::Char('c'));
    }
}
