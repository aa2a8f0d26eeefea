//! Entity types mirrored from the authoritative server
//!
//! Records deserialize straight from the wire payloads. Sprite and sound
//! names have their enum prefix stripped on the way in so the rest of the
//! client only ever sees bare registry keys.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::f32::consts::TAU;
use std::fmt;

use crate::game::constants::{assets, hud};
use crate::util::vec2::Vec2;

/// Stable entity identifier
///
/// Planets and projectiles use integer ids, tanks use the owning connection
/// id. Both forms decode into the same string-backed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> de::Visitor<'de> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer or string entity id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<EntityId, E> {
                if v.fract() == 0.0 && v.is_finite() {
                    Ok(EntityId(format!("{}", v as i64)))
                } else {
                    Ok(EntityId(v.to_string()))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
                Ok(EntityId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
                Ok(EntityId(v))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Strip an enum-style prefix (`SpriteType.`) if present
fn strip_prefix<'a>(raw: &'a str, prefix: &str) -> &'a str {
    raw.strip_prefix(prefix).unwrap_or(raw)
}

/// Sprite registry key (prefix already stripped)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SpriteName(String);

impl SpriteName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Build from a wire string such as `SpriteType.BULLET_SPRITE`
    pub fn from_wire(raw: &str) -> Self {
        Self(strip_prefix(raw, assets::SPRITE_PREFIX).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_planet(&self) -> bool {
        self.0 == assets::PLANET_SPRITE
    }

    pub fn is_tank(&self) -> bool {
        assets::TANK_SPRITES.contains(&self.0.as_str())
    }

    pub fn is_projectile(&self) -> bool {
        assets::PROJECTILE_SPRITES.contains(&self.0.as_str())
    }
}

impl fmt::Display for SpriteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SpriteName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SpriteName::from_wire(&raw))
    }
}

/// Sound registry key (prefix already stripped)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SoundName(String);

impl SoundName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Build from a wire string. Empty means "no sound".
    pub fn from_wire(raw: &str) -> Option<Self> {
        let name = strip_prefix(raw, assets::SOUND_PREFIX);
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `sound` fields may be missing, null, empty or prefixed
fn deserialize_sound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SoundName>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SoundName::from_wire))
}

/// Colour tint
///
/// Tanks and bullets carry a CSS colour string; player settings carry a
/// numeric hue in degrees, rendered as a saturated HSL colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hue(String);

impl Hue {
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    pub fn as_css(&self) -> &str {
        &self.0
    }
}

fn deserialize_hue<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hue>, D::Error> {
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(Hue(s)),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .map(|deg| Hue(format!("hsl({}, 100%, 50%)", deg))),
        _ => None,
    })
}

/// Selected weapon plus per-weapon round counts and sprites
///
/// The selection is cyclic: walking past the end wraps to the start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ammunition {
    #[serde(rename = "selected_bullet", default)]
    pub selected: usize,
    #[serde(rename = "bullet_counts", default)]
    pub counts: Vec<u32>,
    #[serde(rename = "bullet_sprites", default)]
    pub sprites: Vec<SpriteName>,
}

/// Round count shown for a weapon slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundCount {
    Infinite,
    Finite(u32),
}

impl fmt::Display for RoundCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundCount::Infinite => f.write_str("Infinite"),
            RoundCount::Finite(n) => write!(f, "{}", n),
        }
    }
}

/// One resolved slot of the weapon wheel
#[derive(Debug, Clone, PartialEq)]
pub struct AmmoSlot<'a> {
    /// Index into the arsenal
    pub index: usize,
    pub sprite: Option<&'a SpriteName>,
    pub rounds: RoundCount,
}

impl Ammunition {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Arsenal index `offset` steps after the selection, wrapping
    pub fn wrapped_index(&self, offset: usize) -> Option<usize> {
        let len = self.counts.len();
        if len == 0 {
            return None;
        }
        // Both terms are below `len`, so the sum cannot overflow
        Some((self.selected % len + offset % len) % len)
    }

    pub fn slot(&self, offset: usize) -> Option<AmmoSlot<'_>> {
        let index = self.wrapped_index(offset)?;
        let rounds = if index < hud::INFINITE_AMMO_SLOTS {
            RoundCount::Infinite
        } else {
            RoundCount::Finite(self.counts[index])
        };
        Some(AmmoSlot {
            index,
            sprite: self.sprites.get(index),
            rounds,
        })
    }

    /// The first `n` slots starting at the selection
    pub fn wheel(&self, n: usize) -> impl Iterator<Item = AmmoSlot<'_>> + '_ {
        let n = if self.counts.is_empty() { 0 } else { n };
        (0..n).filter_map(move |offset| self.slot(offset))
    }
}

/// A tank (one per connected player)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub id: EntityId,
    #[serde(default)]
    pub sprite: SpriteName,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default, deserialize_with = "deserialize_hue")]
    pub hue: Option<Hue>,
    /// Turret heading relative to the surface normal, degrees
    #[serde(default)]
    pub angle: f32,
    /// Position around the parent planet, degrees
    #[serde(default)]
    pub longitude: f32,
    #[serde(default)]
    pub health: f32,
    #[serde(flatten)]
    pub ammunition: Ammunition,
    /// Centre of the planet the tank sits on
    #[serde(default)]
    pub planet_x: Option<f32>,
    #[serde(default)]
    pub planet_y: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_sound")]
    pub sound: Option<SoundName>,
}

impl Tank {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn planet_center(&self) -> Option<Vec2> {
        match (self.planet_x, self.planet_y) {
            (Some(x), Some(y)) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    /// Unit vector from the planet core towards the tank
    pub fn radial(&self) -> Vec2 {
        match self.planet_center() {
            Some(core) => (self.position() - core).normalize(),
            None => Vec2::from_angle(self.longitude.to_radians()),
        }
    }
}

/// A planet with a ring of surface altitude samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: EntityId,
    #[serde(default)]
    pub sprite: SpriteName,
    #[serde(default, deserialize_with = "deserialize_hue")]
    pub hue: Option<Hue>,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub core_radius: f32,
    #[serde(default)]
    pub sealevel_radius: f32,
    #[serde(default)]
    pub number_of_altitudes: usize,
    #[serde(default)]
    pub altitudes: Vec<f32>,
}

impl Planet {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Write `(index, altitude)` pairs into the ring
    ///
    /// Returns how many pairs fell outside `[0, N)` and were skipped.
    pub fn apply_altitude_patch(&mut self, deltas: &[(i64, f32)]) -> usize {
        let mut skipped = 0;
        for &(index, value) in deltas {
            match usize::try_from(index)
                .ok()
                .and_then(|i| self.altitudes.get_mut(i))
            {
                Some(slot) => *slot = value,
                None => skipped += 1,
            }
        }
        skipped
    }

    /// Surface polygon in world space, samples at equal angular spacing
    pub fn surface_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        let center = self.position();
        let n = self.altitudes.len().max(1) as f32;
        self.altitudes.iter().enumerate().map(move |(i, &alt)| {
            let theta = i as f32 / n * TAU;
            center + Vec2::from_angle(theta) * alt
        })
    }
}

/// A projectile in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: EntityId,
    pub sprite: SpriteName,
    pub x: f32,
    pub y: f32,
    /// Heading in radians
    #[serde(default)]
    pub roll: f32,
    #[serde(default, deserialize_with = "deserialize_sound")]
    pub sound: Option<SoundName>,
    /// Trail tint
    #[serde(default, deserialize_with = "deserialize_hue")]
    pub hue: Option<Hue>,
}

impl Bullet {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub sprite: SpriteName,
    #[serde(default)]
    pub radius: f32,
    #[serde(default, deserialize_with = "deserialize_sound")]
    pub sound: Option<SoundName>,
}

impl Explosion {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Predicted flight path of the active tank's next shot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    #[serde(default, deserialize_with = "deserialize_hue")]
    pub hue: Option<Hue>,
    #[serde(default)]
    pub positions: Vec<(f32, f32)>,
}

impl Trajectory {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.positions.iter().copied().map(Vec2::from)
    }
}

/// A snapshot record, classified by its sprite discriminator
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRecord {
    Planet(Planet),
    Tank(Tank),
    /// Anything else the server may announce; the store ignores it
    Other(SpriteName),
}

impl TryFrom<serde_json::Value> for EntityRecord {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let sprite = value
            .get("sprite")
            .and_then(|s| s.as_str())
            .map(SpriteName::from_wire)
            .unwrap_or_default();

        if sprite.is_planet() {
            serde_json::from_value(value).map(EntityRecord::Planet)
        } else if sprite.is_tank() {
            serde_json::from_value(value).map(EntityRecord::Tank)
        } else {
            Ok(EntityRecord::Other(sprite))
        }
    }
}

/// A single-entity `update` message
#[derive(Debug, Clone, PartialEq)]
pub enum IncrementalUpdate {
    /// Index-addressed altitude patch
    Planet { id: EntityId, deltas: Vec<(i64, f32)> },
    /// One projectile, appended or replaced by id
    Bullet(Bullet),
    Other(SpriteName),
}

#[derive(Deserialize)]
struct PlanetPatch {
    id: EntityId,
    #[serde(default)]
    update: Vec<(i64, f32)>,
}

impl TryFrom<serde_json::Value> for IncrementalUpdate {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let sprite = value
            .get("sprite")
            .and_then(|s| s.as_str())
            .map(SpriteName::from_wire)
            .unwrap_or_default();

        if sprite.is_planet() {
            let patch: PlanetPatch = serde_json::from_value(value)?;
            Ok(IncrementalUpdate::Planet {
                id: patch.id,
                deltas: patch.update,
            })
        } else if sprite.is_projectile() {
            serde_json::from_value(value).map(IncrementalUpdate::Bullet)
        } else {
            Ok(IncrementalUpdate::Other(sprite))
        }
    }
}
