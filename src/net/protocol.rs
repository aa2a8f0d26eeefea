//! Wire protocol
//!
//! Every frame carries one JSON envelope `{"event": <name>, "data": <payload>}`.
//! Server events are decoded once here into [`ServerEvent`]; everything past
//! this module works with typed values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::PlayerKind;
use crate::game::entity::{
    Bullet, EntityId, EntityRecord, Explosion, IncrementalUpdate, SpriteName, Tank, Trajectory,
};
use crate::util::vec2::Vec2;

/// Events from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Handshake answer carrying the player settings
    #[serde(rename = "welcome")]
    Welcome(PlayerSettings),
    #[serde(rename = "gameSetup")]
    GameSetup(GameSetup),
    /// One snapshot record, or a list of them
    #[serde(rename = "initial")]
    Initial(serde_json::Value),
    /// Planet altitude patch or a single projectile
    #[serde(rename = "update")]
    Update(serde_json::Value),
    #[serde(rename = "update-tanks")]
    UpdateTanks(Vec<serde_json::Value>),
    #[serde(rename = "update-bullets")]
    UpdateBullets(Vec<Bullet>),
    #[serde(rename = "update-explosions")]
    UpdateExplosions(Vec<Explosion>),
    #[serde(rename = "trajectory")]
    Trajectory(Trajectory),
    #[serde(rename = "turns_enabled")]
    TurnsEnabled(TurnsEnabled),
    #[serde(rename = "next-turn")]
    NextTurn(NextTurn),
    /// Local tank destroyed
    #[serde(rename = "RIP")]
    Rip,
    #[serde(rename = "room_close")]
    RoomClose,
    #[serde(rename = "disconnect")]
    Disconnect,
    #[serde(rename = "connect_failed")]
    ConnectFailed,
    /// Kicked by an admin; payload is the (possibly empty) reason
    #[serde(rename = "kick")]
    Kick(Option<String>),
    #[serde(rename = "playerDied")]
    PlayerDied(PlayerNotice),
    #[serde(rename = "playerJoin")]
    PlayerJoin(PlayerNotice),
    #[serde(rename = "playerDisconnect")]
    PlayerDisconnect(PlayerNotice),
    #[serde(rename = "serverMSG")]
    ServerMessage(String),
    #[serde(rename = "serverSendPlayerChat")]
    PlayerChat(ChatLine),
    /// Latency probe answer
    #[serde(rename = "pongcheck")]
    PongCheck,
    /// Names of the rooms open for joining
    #[serde(rename = "room_list")]
    RoomList(Vec<String>),
}

impl ServerEvent {
    /// Wire name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome(_) => "welcome",
            ServerEvent::GameSetup(_) => "gameSetup",
            ServerEvent::Initial(_) => "initial",
            ServerEvent::Update(_) => "update",
            ServerEvent::UpdateTanks(_) => "update-tanks",
            ServerEvent::UpdateBullets(_) => "update-bullets",
            ServerEvent::UpdateExplosions(_) => "update-explosions",
            ServerEvent::Trajectory(_) => "trajectory",
            ServerEvent::TurnsEnabled(_) => "turns_enabled",
            ServerEvent::NextTurn(_) => "next-turn",
            ServerEvent::Rip => "RIP",
            ServerEvent::RoomClose => "room_close",
            ServerEvent::Disconnect => "disconnect",
            ServerEvent::ConnectFailed => "connect_failed",
            ServerEvent::Kick(_) => "kick",
            ServerEvent::PlayerDied(_) => "playerDied",
            ServerEvent::PlayerJoin(_) => "playerJoin",
            ServerEvent::PlayerDisconnect(_) => "playerDisconnect",
            ServerEvent::ServerMessage(_) => "serverMSG",
            ServerEvent::PlayerChat(_) => "serverSendPlayerChat",
            ServerEvent::PongCheck => "pongcheck",
            ServerEvent::RoomList(_) => "room_list",
        }
    }
}

/// Player settings sent with `welcome`
///
/// Only the id matters to the client; the rest is echoed back in the
/// `gotit` acknowledgement untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub id: EntityId,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    #[serde(rename = "gameWidth")]
    pub game_width: f32,
    #[serde(rename = "gameHeight")]
    pub game_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnsEnabled {
    pub turns_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextTurn {
    pub current_player: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNotice {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    #[serde(default)]
    pub sender: String,
    pub message: String,
}

/// Aim target carried by the heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Target {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    #[serde(rename = "screenWidth")]
    pub screen_width: f32,
    #[serde(rename = "screenHeight")]
    pub screen_height: f32,
}

/// `gotit` payload: the welcome settings plus what this client adds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    #[serde(flatten)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub name: String,
    #[serde(flatten)]
    pub screen: ScreenSize,
    pub target: Target,
    /// Room to move into
    pub new_room: Option<String>,
}

impl Handshake {
    pub fn new(
        settings: &PlayerSettings,
        name: impl Into<String>,
        screen: ScreenSize,
        target: Target,
        new_room: Option<String>,
    ) -> Self {
        let mut map = settings.extra.clone();
        for key in ["name", "screenWidth", "screenHeight", "target", "new_room"] {
            map.remove(key);
        }
        map.insert(
            "id".to_string(),
            serde_json::Value::String(settings.id.to_string()),
        );
        Self {
            settings: map,
            name: name.into(),
            screen,
            target,
            new_room,
        }
    }
}

/// Opening message on a fresh connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    #[serde(rename = "type")]
    pub kind: PlayerKind,
}

/// Intents from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientIntent {
    #[serde(rename = "connect")]
    Hello(Hello),
    /// Per-frame heartbeat with the current aim target
    #[serde(rename = "0")]
    Heartbeat(Target),
    #[serde(rename = "gotit")]
    Gotit(Box<Handshake>),
    #[serde(rename = "respawn")]
    Respawn,
    #[serde(rename = "fire_gun")]
    FireGun,
    #[serde(rename = "strafe_left")]
    StrafeLeft,
    #[serde(rename = "strafe_right")]
    StrafeRight,
    #[serde(rename = "angle_left")]
    AngleLeft,
    #[serde(rename = "angle_right")]
    AngleRight,
    #[serde(rename = "power_up")]
    PowerUp,
    #[serde(rename = "power_down")]
    PowerDown,
    #[serde(rename = "next_bullet")]
    NextBullet,
    #[serde(rename = "windowResized")]
    WindowResized(ScreenSize),
    #[serde(rename = "pingcheck")]
    PingCheck,
    #[serde(rename = "playerChat")]
    PlayerChat(ChatLine),
    #[serde(rename = "request_rooms")]
    RequestRooms,
}

impl ClientIntent {
    pub fn heartbeat(target: Vec2) -> Self {
        ClientIntent::Heartbeat(target.into())
    }

    /// Continuous or per-frame traffic, safe to drop under backpressure
    ///
    /// A zero-target heartbeat is the release edge of a directional key and
    /// must reach the server.
    pub fn is_droppable(&self) -> bool {
        match self {
            ClientIntent::Heartbeat(target) => target.x != 0.0 || target.y != 0.0,
            _ => self.is_held_command(),
        }
    }

    fn is_held_command(&self) -> bool {
        matches!(
            self,
            ClientIntent::StrafeLeft
                | ClientIntent::StrafeRight
                | ClientIntent::AngleLeft
                | ClientIntent::AngleRight
                | ClientIntent::PowerUp
                | ClientIntent::PowerDown
        )
    }
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Invalid {event} record: {source}")]
    InvalidRecord {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Encode any envelope as JSON bytes
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(ProtocolError::Encode)
}

/// Decode a JSON envelope
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}

/// Classify an `initial` payload (single record or list)
pub fn initial_records(payload: serde_json::Value) -> Result<Vec<EntityRecord>, ProtocolError> {
    let values = match payload {
        serde_json::Value::Array(items) => items,
        single => vec![single],
    };
    values
        .into_iter()
        .map(|v| {
            EntityRecord::try_from(v).map_err(|source| ProtocolError::InvalidRecord {
                event: "initial",
                source,
            })
        })
        .collect()
}

/// Classify an `update` payload
pub fn incremental_update(payload: serde_json::Value) -> Result<IncrementalUpdate, ProtocolError> {
    IncrementalUpdate::try_from(payload).map_err(|source| ProtocolError::InvalidRecord {
        event: "update",
        source,
    })
}

/// Decode an `update-tanks` list
///
/// Records without a sprite (players without a live tank) are dropped
/// before decoding; they may lack position fields entirely.
pub fn tank_list(payload: Vec<serde_json::Value>) -> Result<Vec<Tank>, ProtocolError> {
    payload
        .into_iter()
        .filter(|v| {
            v.get("sprite")
                .and_then(|s| s.as_str())
                .map(|s| !SpriteName::from_wire(s).is_empty())
                .unwrap_or(false)
        })
        .map(|v| {
            serde_json::from_value(v).map_err(|source| ProtocolError::InvalidRecord {
                event: "update-tanks",
                source,
            })
        })
        .collect()
}
