use std::time::Duration;
use tracing::trace;

use crate::domain::{FVConfig, FVError, Message};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &FVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, FVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            // While a prompt is open the model consumes keys unmapped.
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Left => Some(Message::PrevColumn),
            KeyCode::Right => Some(Message::NextColumn),
            KeyCode::Up => Some(Message::PrevRelationColumn),
            KeyCode::Down => Some(Message::NextRelationColumn),
            KeyCode::Char('/') => Some(Message::Filter),
            KeyCode::Char('a') => Some(Message::ToggleShowAll),
            KeyCode::Char('p') => Some(Message::TogglePercentage),
            KeyCode::Char('r') => Some(Message::Relate),
            KeyCode::Char('o') => Some(Message::Open),
            KeyCode::Char('y') => Some(Message::CopyChart),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Esc => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
