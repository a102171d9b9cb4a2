use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, Screen, TwConfig, TwError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TwConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TwError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(Some(Message::Tick));
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                Self::map_key(key, model.raw_keyevents())
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    /// While a text input has focus every key is passed through untouched.
    fn map_key(key: KeyEvent, raw: bool) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Quit);
        }
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Tab => Some(Message::NextScreen),
            KeyCode::BackTab => Some(Message::PrevScreen),
            KeyCode::Char(c @ '1'..='8') => {
                let idx = c as usize - '1' as usize;
                Screen::ALL.get(idx).map(|&s| Message::Goto(s))
            }
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::MoveBeginning),
            KeyCode::End | KeyCode::Char('G') => Some(Message::MoveEnd),
            KeyCode::Char('d') => Some(Message::SortByDate),
            KeyCode::Char('v') => Some(Message::SortByViews),
            KeyCode::Char('/') => Some(Message::Filter),
            KeyCode::Char('y') => Some(Message::CopyRow),
            KeyCode::Char('i') => Some(Message::Focus),
            KeyCode::Char('o') => Some(Message::OpenModal),
            KeyCode::Char(' ') => Some(Message::ToggleStopwatch),
            KeyCode::Char('r') => Some(Message::ResetStopwatch),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
