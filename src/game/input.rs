//! Held-key direction state machine
//!
//! Turns raw key, pointer and focus events into intents. Directional keys
//! form a small set; while any is held the keyboard owns the aim target
//! (directional lock) and pointer movement is ignored.

use smallvec::SmallVec;

use crate::game::camera::Camera;
use crate::game::constants::input::{keys, DIRECTIONAL_TARGET_MAGNITUDE, MAX_HELD_DIRECTIONS};
use crate::net::protocol::ClientIntent;
use crate::util::vec2::Vec2;

/// Logical direction bound to a held key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    StrafeLeft,
    StrafeRight,
    AngleLeft,
    AngleRight,
    PowerUp,
    PowerDown,
}

impl Direction {
    /// Continuous command sent every direction tick while held
    pub fn intent(self) -> ClientIntent {
        match self {
            Direction::StrafeLeft => ClientIntent::StrafeLeft,
            Direction::StrafeRight => ClientIntent::StrafeRight,
            Direction::AngleLeft => ClientIntent::AngleLeft,
            Direction::AngleRight => ClientIntent::AngleRight,
            Direction::PowerUp => ClientIntent::PowerUp,
            Direction::PowerDown => ClientIntent::PowerDown,
        }
    }

    /// Contribution to the horizontal target component
    fn horizontal(self) -> Option<f32> {
        match self {
            Direction::StrafeLeft | Direction::AngleLeft => Some(-DIRECTIONAL_TARGET_MAGNITUDE),
            Direction::StrafeRight | Direction::AngleRight => Some(DIRECTIONAL_TARGET_MAGNITUDE),
            _ => None,
        }
    }

    /// Contribution to the vertical target component (screen y grows down)
    fn vertical(self) -> Option<f32> {
        match self {
            Direction::PowerUp => Some(-DIRECTIONAL_TARGET_MAGNITUDE),
            Direction::PowerDown => Some(DIRECTIONAL_TARGET_MAGNITUDE),
            _ => None,
        }
    }
}

/// A key code classified by what it does in game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Direction(Direction),
    Fire,
    NextBullet,
    Other(u32),
}

impl From<u32> for Key {
    fn from(code: u32) -> Self {
        match code {
            keys::A => Key::Direction(Direction::StrafeLeft),
            keys::D => Key::Direction(Direction::StrafeRight),
            keys::LEFT => Key::Direction(Direction::AngleLeft),
            keys::RIGHT => Key::Direction(Direction::AngleRight),
            keys::UP => Key::Direction(Direction::PowerUp),
            keys::DOWN => Key::Direction(Direction::PowerDown),
            keys::SPACE => Key::Fire,
            keys::TAB => Key::NextBullet,
            other => Key::Other(other),
        }
    }
}

/// Held directions in press order, no duplicates
pub type DirectionSet = SmallVec<[Direction; MAX_HELD_DIRECTIONS]>;

#[derive(Debug, Clone)]
pub struct DirectionMachine {
    held: DirectionSet,
    locked: bool,
    target: Vec2,
    /// Fire is re-armed by any key release, so auto-repeat fires once
    fire_armed: bool,
    /// Keep the last pointer target when the pointer leaves the canvas
    continuity: bool,
}

impl DirectionMachine {
    pub fn new(continuity: bool) -> Self {
        Self {
            held: DirectionSet::new(),
            locked: false,
            target: Vec2::ZERO,
            fire_armed: true,
            continuity,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn held(&self) -> &[Direction] {
        &self.held
    }

    /// Handle a key press
    pub fn key_down(&mut self, code: u32) -> Option<ClientIntent> {
        match Key::from(code) {
            Key::Direction(direction) => {
                self.locked = true;
                if self.held.contains(&direction) {
                    return None;
                }
                self.held.push(direction);
                self.recompute_target();
                Some(ClientIntent::heartbeat(self.target))
            }
            Key::Fire if self.fire_armed => {
                self.fire_armed = false;
                Some(ClientIntent::FireGun)
            }
            Key::NextBullet => Some(ClientIntent::NextBullet),
            _ => None,
        }
    }

    /// Handle a key release
    pub fn key_up(&mut self, code: u32) -> Option<ClientIntent> {
        self.fire_armed = true;
        let Key::Direction(direction) = Key::from(code) else {
            return None;
        };
        let position = self.held.iter().position(|&d| d == direction)?;
        self.held.remove(position);
        self.recompute_target();
        if self.held.is_empty() {
            self.locked = false;
        }
        Some(ClientIntent::heartbeat(self.target))
    }

    /// Focus loss: every key counts as released
    pub fn blur(&mut self) -> Option<ClientIntent> {
        self.fire_armed = true;
        if self.held.is_empty() && !self.locked {
            return None;
        }
        self.held.clear();
        self.locked = false;
        self.target = Vec2::ZERO;
        Some(ClientIntent::heartbeat(self.target))
    }

    /// Pointer moved to `screen` (canvas pixels)
    ///
    /// The offset from the viewport centre is rotated back into world
    /// orientation so the server sees the aim the player sees.
    pub fn pointer_moved(&mut self, screen: Vec2, camera: &Camera) {
        if self.locked {
            return;
        }
        let relative = screen - camera.viewport_center();
        self.target = camera.inverse_rotate(relative);
    }

    /// Touch moves aim in raw screen orientation
    pub fn touch_moved(&mut self, screen: Vec2, viewport: Vec2) {
        if self.locked {
            return;
        }
        self.target = screen - viewport * 0.5;
    }

    pub fn pointer_left(&mut self) {
        if !self.continuity {
            self.target = Vec2::ZERO;
        }
    }

    pub fn click(&mut self) -> ClientIntent {
        ClientIntent::FireGun
    }

    /// One continuous command per held direction
    pub fn tick_held(&self) -> impl Iterator<Item = ClientIntent> + '_ {
        self.held.iter().map(|d| d.intent())
    }

    /// Drop all held state (teardown)
    pub fn reset(&mut self) {
        self.held.clear();
        self.locked = false;
        self.target = Vec2::ZERO;
        self.fire_armed = true;
    }

    fn recompute_target(&mut self) {
        let x = self.held.iter().find_map(|d| d.horizontal()).unwrap_or(0.0);
        let y = self.held.iter().find_map(|d| d.vertical()).unwrap_or(0.0);
        self.target = Vec2::new(x, y);
    }
}

impl Default for DirectionMachine {
    fn default() -> Self {
        Self::new(false)
    }
}
