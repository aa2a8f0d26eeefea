//! Client session lifecycle
//!
//! Tracks which screen the client is on and when it should fall back to the
//! menu after a terminal event.

use std::fmt;
use uuid::Uuid;

use crate::game::constants::timing::{
    RETURN_AFTER_DEATH_MS, RETURN_AFTER_DISCONNECT_MS, RETURN_AFTER_ROOM_CLOSE_MS,
};

/// Session phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, no game running
    Idle,
    /// In game
    Alive,
    /// Local tank destroyed
    Dead,
    /// Server is shutting the room down
    RoomClosing,
    /// Removed by an admin
    Kicked { reason: String },
    /// Transport lost
    Disconnected,
    /// Back at the menu; nothing more to render
    Menu,
}

impl SessionPhase {
    pub fn is_alive(&self) -> bool {
        matches!(self, SessionPhase::Alive)
    }

    /// Phases that end the round; outbound traffic stops
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Dead
                | SessionPhase::RoomClosing
                | SessionPhase::Kicked { .. }
                | SessionPhase::Disconnected
                | SessionPhase::Menu
        )
    }

    /// Lines of the full-screen status message, if this phase shows one
    pub fn status_lines(&self) -> Option<Vec<String>> {
        let lines = match self {
            SessionPhase::Alive | SessionPhase::Menu => return None,
            SessionPhase::Idle => vec!["Game Over!".to_string()],
            SessionPhase::Dead => vec!["You died!".to_string()],
            SessionPhase::RoomClosing => vec!["Room is closing!".to_string()],
            SessionPhase::Kicked { reason } if reason.is_empty() => {
                vec!["You were kicked!".to_string()]
            }
            SessionPhase::Kicked { reason } => {
                vec!["You were kicked for:".to_string(), reason.clone()]
            }
            SessionPhase::Disconnected => vec!["Disconnected!".to_string()],
        };
        Some(lines)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Alive => write!(f, "alive"),
            SessionPhase::Dead => write!(f, "dead"),
            SessionPhase::RoomClosing => write!(f, "room-closing"),
            SessionPhase::Kicked { .. } => write!(f, "kicked"),
            SessionPhase::Disconnected => write!(f, "disconnected"),
            SessionPhase::Menu => write!(f, "menu"),
        }
    }
}

/// Phase plus the pending return-to-menu deadline
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// Local id for log correlation; changes on every reconnect
    connection_id: Uuid,
    phase: SessionPhase,
    return_at_ms: Option<u64>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            phase: SessionPhase::Idle,
            return_at_ms: None,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn return_at_ms(&self) -> Option<u64> {
        self.return_at_ms
    }

    /// Handshake finished
    pub fn start(&mut self) {
        self.phase = SessionPhase::Alive;
        self.return_at_ms = None;
    }

    /// Returns true if this ended a running round
    pub fn died(&mut self, now_ms: u64) -> bool {
        self.enter(SessionPhase::Dead, now_ms + RETURN_AFTER_DEATH_MS)
    }

    pub fn room_closed(&mut self, now_ms: u64) -> bool {
        self.enter(SessionPhase::RoomClosing, now_ms + RETURN_AFTER_ROOM_CLOSE_MS)
    }

    pub fn kicked(&mut self, reason: impl Into<String>, now_ms: u64) -> bool {
        self.enter(
            SessionPhase::Kicked {
                reason: reason.into(),
            },
            now_ms + RETURN_AFTER_DISCONNECT_MS,
        )
    }

    /// Transport gone
    ///
    /// A disconnect that follows a death, kick or room close keeps that
    /// screen; the server hangs up after each of them.
    pub fn disconnected(&mut self, now_ms: u64) -> bool {
        match self.phase {
            SessionPhase::Dead | SessionPhase::RoomClosing | SessionPhase::Kicked { .. } => false,
            SessionPhase::Disconnected | SessionPhase::Menu => false,
            SessionPhase::Idle | SessionPhase::Alive => {
                self.phase = SessionPhase::Disconnected;
                self.return_at_ms = Some(now_ms + RETURN_AFTER_DISCONNECT_MS);
                true
            }
        }
    }

    fn enter(&mut self, phase: SessionPhase, return_at_ms: u64) -> bool {
        if matches!(self.phase, SessionPhase::Menu) {
            return false;
        }
        let was_running = !self.phase.is_terminal();
        self.phase = phase;
        self.return_at_ms = Some(return_at_ms);
        was_running
    }

    /// Advance the clock; returns true when the session just reached the menu
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.return_at_ms {
            Some(at) if now_ms >= at => {
                self.phase = SessionPhase::Menu;
                self.return_at_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Fresh connection (reconnect after returning to the menu)
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
