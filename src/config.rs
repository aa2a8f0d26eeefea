use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::constants::{net, timing};

/// How this client joins a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    #[default]
    Player,
    Spectate,
}

impl PlayerKind {
    pub fn is_spectator(self) -> bool {
        matches!(self, PlayerKind::Spectate)
    }
}

impl std::str::FromStr for PlayerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(PlayerKind::Player),
            "spectate" | "spectator" => Ok(PlayerKind::Spectate),
            other => Err(ConfigError::UnknownPlayerKind(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown player kind '{0}'")]
    UnknownPlayerKind(String),
    #[error("server address cannot be empty")]
    EmptyServerAddress,
    #[error("screen size must be positive, got {0}x{1}")]
    InvalidScreen(u32, u32),
    #[error("frame rate must be 1-240 Hz, got {0}")]
    InvalidFrameRate(u32),
    #[error("direction interval must be at least 1 ms")]
    InvalidDirectionInterval,
    #[error("{0} capacity must be at least 1")]
    InvalidCapacity(&'static str),
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `host:port` of the game server
    pub server_address: String,
    pub player_name: String,
    pub player_kind: PlayerKind,
    /// Room to join; the server picks one when absent
    pub room_name: Option<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub frame_rate_hz: u32,
    /// Period of the held-direction command loop
    pub direction_interval_ms: u64,
    /// Keep the last target when the pointer leaves the canvas
    pub continuity: bool,
    /// Draw the world edges near the local player
    pub draw_border: bool,
    pub outbound_capacity: usize,
    pub inbound_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:3000".to_string(),
            player_name: String::new(),
            player_kind: PlayerKind::Player,
            room_name: None,
            screen_width: 1280,
            screen_height: 720,
            frame_rate_hz: timing::FRAME_RATE_HZ,
            direction_interval_ms: timing::DIRECTION_INTERVAL_MS,
            continuity: false,
            draw_border: false,
            outbound_capacity: net::OUTBOUND_CAPACITY,
            inbound_capacity: net::INBOUND_CAPACITY,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ClientConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("SERVER_ADDRESS") {
            if addr.trim().is_empty() {
                tracing::warn!("SERVER_ADDRESS is empty, using default");
            } else {
                config.server_address = addr.trim().to_string();
            }
        }

        if let Some(name) = lookup("PLAYER_NAME") {
            config.player_name = name;
        }

        if let Some(kind) = lookup("PLAYER_KIND") {
            match kind.parse::<PlayerKind>() {
                Ok(parsed) => config.player_kind = parsed,
                Err(_) => tracing::warn!("Invalid PLAYER_KIND '{}', using default", kind),
            }
        }

        if let Some(room) = lookup("ROOM_NAME") {
            if !room.trim().is_empty() {
                config.room_name = Some(room.trim().to_string());
            }
        }

        if let Some(width) = lookup("SCREEN_WIDTH") {
            match width.parse::<u32>() {
                Ok(parsed) if parsed > 0 => config.screen_width = parsed,
                _ => tracing::warn!("Invalid SCREEN_WIDTH '{}', using default", width),
            }
        }

        if let Some(height) = lookup("SCREEN_HEIGHT") {
            match height.parse::<u32>() {
                Ok(parsed) if parsed > 0 => config.screen_height = parsed,
                _ => tracing::warn!("Invalid SCREEN_HEIGHT '{}', using default", height),
            }
        }

        if let Some(rate) = lookup("FRAME_RATE_HZ") {
            match rate.parse::<u32>() {
                Ok(parsed) if (1..=240).contains(&parsed) => config.frame_rate_hz = parsed,
                _ => tracing::warn!("FRAME_RATE_HZ must be 1-240, got '{}', using default", rate),
            }
        }

        if let Some(interval) = lookup("DIRECTION_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(parsed) if parsed > 0 => config.direction_interval_ms = parsed,
                _ => tracing::warn!("Invalid DIRECTION_INTERVAL_MS '{}', using default", interval),
            }
        }

        if let Some(raw) = lookup("CONTINUITY") {
            match parse_bool(&raw) {
                Some(parsed) => config.continuity = parsed,
                None => tracing::warn!("Invalid CONTINUITY '{}', using default", raw),
            }
        }

        if let Some(raw) = lookup("DRAW_BORDER") {
            match parse_bool(&raw) {
                Some(parsed) => config.draw_border = parsed,
                None => tracing::warn!("Invalid DRAW_BORDER '{}', using default", raw),
            }
        }

        if let Some(cap) = lookup("OUTBOUND_CAPACITY") {
            match cap.parse::<usize>() {
                Ok(parsed) if parsed > 0 => config.outbound_capacity = parsed,
                _ => tracing::warn!("Invalid OUTBOUND_CAPACITY '{}', using default", cap),
            }
        }

        if let Some(cap) = lookup("INBOUND_CAPACITY") {
            match cap.parse::<usize>() {
                Ok(parsed) if parsed > 0 => config.inbound_capacity = parsed,
                _ => tracing::warn!("Invalid INBOUND_CAPACITY '{}', using default", cap),
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_address.trim().is_empty() {
            return Err(ConfigError::EmptyServerAddress);
        }
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::InvalidScreen(self.screen_width, self.screen_height));
        }
        if !(1..=240).contains(&self.frame_rate_hz) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate_hz));
        }
        if self.direction_interval_ms == 0 {
            return Err(ConfigError::InvalidDirectionInterval);
        }
        if self.outbound_capacity == 0 {
            return Err(ConfigError::InvalidCapacity("outbound"));
        }
        if self.inbound_capacity == 0 {
            return Err(ConfigError::InvalidCapacity("inbound"));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / u64::from(self.frame_rate_hz.max(1)))
    }

    pub fn direction_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.direction_interval_ms.max(1))
    }
}
