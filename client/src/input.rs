//! Pointer capture and lobby key handling

use macroquad::prelude::*;
use shared::SESSION_CODE_LEN;

/// Lobby actions requested by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Create,
    Join(String),
    /// Put the share code on the clipboard
    CopyCode,
}

/// One frame's worth of input
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    /// Pointer position in table coordinates
    pub pointer: Option<(f32, f32)>,
    pub action: Option<UiAction>,
    pub quit: bool,
}

/// Buffer for the share code typed by the player
#[derive(Debug, Clone, Default)]
pub struct CodeEntry {
    buffer: String,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts ASCII letters and digits, upper-cased, up to the code length.
    pub fn push(&mut self, c: char) -> bool {
        if !c.is_ascii_alphanumeric() || self.buffer.len() >= SESSION_CODE_LEN {
            return false;
        }
        self.buffer.push(c.to_ascii_uppercase());
        true
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn set(&mut self, code: &str) {
        self.buffer.clear();
        for c in code.chars() {
            self.push(c);
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// The typed code, if there is one to join with.
    pub fn submit(&self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.clone())
        }
    }
}

/// Samples mouse/touch and keyboard each frame
pub struct InputManager {
    code_entry: CodeEntry,

    // Previous frame key states for edge detection
    prev_tab: bool,
    prev_enter: bool,
    prev_backspace: bool,
    prev_copy: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            code_entry: CodeEntry::new(),
            prev_tab: false,
            prev_enter: false,
            prev_backspace: false,
            prev_copy: false,
        }
    }

    pub fn code_entry(&self) -> &CodeEntry {
        &self.code_entry
    }

    pub fn code_entry_mut(&mut self) -> &mut CodeEntry {
        &mut self.code_entry
    }

    /// Reads this frame's input. `table_origin` is where the table's top-left
    /// corner sits in window coordinates.
    pub fn update(&mut self, table_origin: (f32, f32)) -> InputFrame {
        let mut frame = InputFrame {
            pointer: Self::pointer(table_origin),
            ..Default::default()
        };

        let ctrl = is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl);

        // Chords with Ctrl are shortcuts, not code characters
        while let Some(c) = get_char_pressed() {
            if !ctrl {
                self.code_entry.push(c);
            }
        }

        let tab = is_key_down(KeyCode::Tab);
        let enter = is_key_down(KeyCode::Enter) || is_key_down(KeyCode::KpEnter);
        let backspace = is_key_down(KeyCode::Backspace);
        let copy = ctrl && is_key_down(KeyCode::C);

        // Detect key press events (current && !previous)
        if backspace && !self.prev_backspace {
            self.code_entry.backspace();
        }
        if tab && !self.prev_tab {
            frame.action = Some(UiAction::Create);
        }
        if enter && !self.prev_enter {
            if let Some(code) = self.code_entry.submit() {
                frame.action = Some(UiAction::Join(code));
            }
        }

        if copy && !self.prev_copy {
            frame.action = Some(UiAction::CopyCode);
        }

        self.prev_tab = tab;
        self.prev_enter = enter;
        self.prev_backspace = backspace;
        self.prev_copy = copy;

        frame.quit = is_key_down(KeyCode::Escape);
        frame
    }

    /// First touch if any, otherwise the mouse.
    fn pointer(table_origin: (f32, f32)) -> Option<(f32, f32)> {
        let (x, y) = match touches().first() {
            Some(touch) => (touch.position.x, touch.position.y),
            None => mouse_position(),
        };
        Some((x - table_origin.0, y - table_origin.1))
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_entry_filters_and_uppercases() {
        let mut entry = CodeEntry::new();
        assert!(entry.push('a'));
        assert!(entry.push('1'));
        assert!(!entry.push(' '));
        assert!(!entry.push('\t'));
        assert!(!entry.push('-'));
        assert_eq!(entry.as_str(), "A1");
    }

    #[test]
    fn test_code_entry_length_limit() {
        let mut entry = CodeEntry::new();
        for c in "abcdefg".chars() {
            entry.push(c);
        }
        assert_eq!(entry.as_str(), "ABCDE");

        entry.backspace();
        assert_eq!(entry.as_str(), "ABCD");
        assert!(entry.push('z'));
        assert_eq!(entry.as_str(), "ABCDZ");
    }

    #[test]
    fn test_code_entry_submit() {
        let mut entry = CodeEntry::new();
        assert_eq!(entry.submit(), None);

        entry.set("x1y2z");
        assert_eq!(entry.submit(), Some("X1Y2Z".to_string()));
    }

    #[test]
    fn test_input_manager_creation() {
        let input_manager = InputManager::new();
        assert_eq!(input_manager.code_entry().as_str(), "");
        assert!(!input_manager.prev_tab);
        assert!(!input_manager.prev_copy);
    }
}
