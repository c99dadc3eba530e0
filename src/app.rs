use crate::speedtest::session::SessionState;
use crate::speedtest::TestPhase;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

/// What the terminal shows. Mirrors the last snapshot published by the
/// speed test and holds no measurement logic of its own.
pub struct App {
    pub session: SessionState,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            session: SessionState::default(),
            should_quit: false,
        }
    }

    pub fn apply(&mut self, snapshot: SessionState) {
        self.session = snapshot;
    }

    pub fn is_active(&self, phase: TestPhase) -> bool {
        self.session.phase == phase
    }

    pub fn start_label(&self) -> &'static str {
        if self.session.is_running {
            "Testing..."
        } else {
            "Start Testing"
        }
    }

    pub fn handle_key_event(&mut self, key: event::KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Some(AppAction::Quit)
            }
            KeyCode::Enter | KeyCode::Char(' ') if !self.session.is_running => Some(AppAction::StartTest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    StartTest,
}

pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
