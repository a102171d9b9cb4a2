use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line text editor used by every widget that takes typed input.
/// The cursor counts characters, not bytes.
#[derive(Default, Debug, Clone)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub changed: bool,
    pub cursor_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        let snapshot = self.current_input.clone();
        self.finished = false;
        self.canceled = false;
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor_pos = (self.cursor_pos + 1).min(self.len()),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear(),
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => self.insert(chr),
            _ => {}
        }
        let mut result = self.get();
        result.changed = snapshot != self.current_input;
        trace!("Input {:?} => {:?}", key.code, result.input);
        result
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor_pos = self.len();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            changed: false,
            input: self.current_input.clone(),
            cursor_pos: self.cursor_pos,
        }
    }

    pub fn value(&self) -> &str {
        &self.current_input
    }

    pub fn cursor(&self) -> usize {
        self.cursor_pos
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn insert(&mut self, chr: char) {
        let at = self.byte_pos(self.cursor_pos);
        self.current_input.insert(at, chr);
        self.cursor_pos += 1;
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let at = self.byte_pos(self.cursor_pos - 1);
            self.current_input.remove(at);
            self.cursor_pos -= 1;
        }
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.len() {
            let at = self.byte_pos(self.cursor_pos);
            self.current_input.remove(at);
        }
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn press(inputter: &mut Inputter, code: KeyCode) -> InputResult {
        inputter.read(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(inputter: &mut Inputter, s: &str) {
        for c in s.chars() {
            press(inputter, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_appends_and_reports_change() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "ab");
        let result = press(&mut inputter, KeyCode::Char('c'));
        assert_eq!(result.input, "abc");
        assert!(result.changed);
        assert_eq!(result.cursor_pos, 3);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "abc");
        press(&mut inputter, KeyCode::Left);
        let result = press(&mut inputter, KeyCode::Backspace);
        assert_eq!(result.input, "ac");
        assert_eq!(result.cursor_pos, 1);
    }

    #[test]
    fn insert_in_the_middle_of_multibyte_text() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "äö");
        press(&mut inputter, KeyCode::Left);
        press(&mut inputter, KeyCode::Char('x'));
        assert_eq!(inputter.value(), "äxö");
        press(&mut inputter, KeyCode::Home);
        press(&mut inputter, KeyCode::Delete);
        assert_eq!(inputter.value(), "xö");
    }

    #[test]
    fn cursor_moves_are_not_changes() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "abc");
        assert!(!press(&mut inputter, KeyCode::Left).changed);
        assert!(!press(&mut inputter, KeyCode::End).changed);
        assert!(!press(&mut inputter, KeyCode::Right).changed);
        assert_eq!(inputter.cursor(), 3);
    }

    #[test]
    fn enter_finishes_and_escape_cancels() {
        let mut inputter = Inputter::default();
        type_str(&mut inputter, "x");
        let result = press(&mut inputter, KeyCode::Enter);
        assert!(result.finished && !result.canceled);
        assert_eq!(result.input, "x");

        let result = press(&mut inputter, KeyCode::Esc);
        assert!(result.finished && result.canceled);
        // The next key starts a fresh edit
        let result = press(&mut inputter, KeyCode::Char('y'));
        assert!(!result.finished);
        assert_eq!(result.input, "xy");
    }

    #[test]
    fn set_places_cursor_at_end() {
        let mut inputter = Inputter::default();
        inputter.set("hello");
        assert_eq!(inputter.cursor(), 5);
        inputter.clear();
        assert_eq!(inputter.get(), InputResult::default());
    }
}
