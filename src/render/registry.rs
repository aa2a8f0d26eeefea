//! Name-to-asset lookup for sprites and sounds
//!
//! Asset loading lives outside the core; the host registers whatever it
//! loaded under the bare names the server uses (`TURRET1_SPRITE`,
//! `SCIFI_MUSIC`, ...). A lookup miss only skips the call that needed it.

use rustc_hash::FxHashMap;

use crate::game::entity::{SoundName, SpriteName};
use crate::util::vec2::Vec2;

/// Drawable handle with its natural size
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    name: String,
    width: f32,
    height: f32,
}

impl Sprite {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Playable sound handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    name: String,
}

impl Sound {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Built-in asset table: name and natural size in pixels
const DEFAULT_SPRITES: &[(&str, f32, f32)] = &[
    ("GREYBODY1_SPRITE", 83.0, 78.0),
    ("TURRET1_SPRITE", 16.0, 38.0),
    ("TREADS1_SPRITE", 83.0, 22.0),
    ("EXPLOSION1_SPRITE", 100.0, 100.0),
    ("HPBAR_SPRITE", 500.0, 100.0),
    ("HPSEGMENT_SPRITE", 19.0, 30.0),
    ("BULLET_SPRITE", 10.0, 10.0),
    ("BULLET2_SPRITE", 10.0, 10.0),
    ("BULLET3_SPRITE", 12.0, 26.0),
    ("BULLET4_SPRITE", 12.0, 26.0),
    ("BULLET5_SPRITE", 12.0, 26.0),
    ("BULLET6_SPRITE", 12.0, 26.0),
    ("BULLET7_SPRITE", 12.0, 26.0),
    ("BULLET8_SPRITE", 12.0, 26.0),
    ("BULLET9_SPRITE", 10.0, 20.0),
    ("BULLET10_SPRITE", 10.0, 20.0),
    ("BULLET11_SPRITE", 10.0, 20.0),
    ("BULLET12_SPRITE", 10.0, 20.0),
    ("MINE_SPRITE", 30.0, 16.0),
    ("SPARK_SPRITE", 16.0, 16.0),
];

const DEFAULT_SOUNDS: &[&str] = &[
    "GUN_SOUND",
    "RICOCHET_SOUND",
    "OW_SOUND",
    "CLANG_SOUND",
    "EXPLOSION1_SOUND",
    "EXPLOSION3_SOUND",
    "EXPLOSION7_SOUND",
    "SHOOT_SOUND",
    "SHOOT2_SOUND",
    "SCIFI_MUSIC",
    "NEWDAWN_MUSIC",
];

#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    sprites: FxHashMap<String, Sprite>,
    sounds: FxHashMap<String, Sound>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the stock game assets
    pub fn with_default_assets() -> Self {
        let mut registry = Self::new();
        for &(name, w, h) in DEFAULT_SPRITES {
            registry.register_sprite(Sprite::new(name, w, h));
        }
        for &name in DEFAULT_SOUNDS {
            registry.register_sound(Sound::new(name));
        }
        registry
    }

    pub fn register_sprite(&mut self, sprite: Sprite) {
        self.sprites.insert(sprite.name.clone(), sprite);
    }

    pub fn register_sound(&mut self, sound: Sound) {
        self.sounds.insert(sound.name.clone(), sound);
    }

    #[inline]
    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.get(name)
    }

    #[inline]
    pub fn sprite_for(&self, name: &SpriteName) -> Option<&Sprite> {
        self.sprite(name.as_str())
    }

    #[inline]
    pub fn sound(&self, name: &str) -> Option<&Sound> {
        self.sounds.get(name)
    }

    #[inline]
    pub fn sound_for(&self, name: &SoundName) -> Option<&Sound> {
        self.sound(name.as_str())
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }
}
