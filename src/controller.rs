use std::time::Duration;
use tracing::trace;

use crate::domain::{DirConfig, DirError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DirConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DirError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    /// Text entry modes get the raw key; everything else goes through the key map.
    pub fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Quit);
        }
        let message = if raw {
            Some(Message::RawKey(key))
        } else {
            match key.code {
                KeyCode::Char('q') => Some(Message::Quit),
                KeyCode::Esc => Some(Message::Exit),
                KeyCode::Char('?') => Some(Message::Help),
                KeyCode::Enter => Some(Message::Enter),
                KeyCode::Char('j') | KeyCode::Down => Some(Message::MoveDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::MoveUp),
                KeyCode::Char('h') | KeyCode::Left => Some(Message::MoveLeft),
                KeyCode::Char('l') | KeyCode::Right => Some(Message::MoveRight),
                KeyCode::Char('n') | KeyCode::PageDown => Some(Message::NextPage),
                KeyCode::Char('p') | KeyCode::PageUp => Some(Message::PrevPage),
                KeyCode::Char('/') => Some(Message::Search),
                KeyCode::Char('r') => Some(Message::CycleRoleFilter),
                KeyCode::Char('t') => Some(Message::CycleTeamFilter),
                KeyCode::Char('c') => Some(Message::ClearFilters),
                KeyCode::Char('s') => Some(Message::ToggleSort),
                KeyCode::Char('e') => Some(Message::Edit),
                KeyCode::Char('d') | KeyCode::Delete => Some(Message::Delete),
                KeyCode::Char('a') => Some(Message::Add),
                KeyCode::Char('y') => Some(Message::CopyEmail),
                KeyCode::Char('1') => Some(Message::GotoDashboard),
                KeyCode::Char('2') => Some(Message::GotoDirectory),
                _ => None,
            }
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
