//! World-to-screen transform
//!
//! The camera centres a reference point in the viewport. In turn-based mode
//! the whole frame is also rotated about the viewport centre so that the
//! active tank's local "up" points at the top of the screen. A projectile in
//! flight moves the centre but keeps the active tank's orientation.

use std::f32::consts::FRAC_PI_2;

use crate::game::store::WorldStore;
use crate::util::vec2::Vec2;

/// What the camera is centred on this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAnchor {
    /// A tank standing on a planet; `longitude` in degrees
    Tank { position: Vec2, longitude: f32 },
    /// A projectile in flight, oriented by the active tank if there is one
    Projectile {
        position: Vec2,
        longitude: Option<f32>,
    },
    /// A bare point (spectator, unknown player)
    Point(Vec2),
}

impl CameraAnchor {
    pub fn position(&self) -> Vec2 {
        match *self {
            CameraAnchor::Tank { position, .. } => position,
            CameraAnchor::Projectile { position, .. } => position,
            CameraAnchor::Point(position) => position,
        }
    }

    /// Longitude that orients the frame, in degrees
    pub fn longitude(&self) -> Option<f32> {
        match *self {
            CameraAnchor::Tank { longitude, .. } => Some(longitude),
            CameraAnchor::Projectile { longitude, .. } => longitude,
            CameraAnchor::Point(_) => None,
        }
    }

    /// Choose the anchor for the current frame
    ///
    /// Turn-based mode follows the first projectile in flight. Otherwise the
    /// active player's tank, then the local tank, then the last known local
    /// position. The orienting tank is the same in every case.
    pub fn resolve(store: &WorldStore) -> Self {
        let reference = store.current_tank().or_else(|| store.local_tank());

        if store.turns_enabled() {
            if let Some(bullet) = store.bullets().first() {
                return CameraAnchor::Projectile {
                    position: bullet.position(),
                    longitude: reference.map(|tank| tank.longitude),
                };
            }
        }

        if let Some(tank) = reference {
            return CameraAnchor::Tank {
                position: tank.position(),
                longitude: tank.longitude,
            };
        }

        CameraAnchor::Point(store.local().anchor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    anchor: CameraAnchor,
    viewport: Vec2,
    /// Canvas rotation in radians, if installed this frame
    rotation: Option<f32>,
}

impl Camera {
    pub fn new(anchor: CameraAnchor, viewport: Vec2, rotate: bool) -> Self {
        let rotation = anchor.longitude().filter(|_| rotate).map(rotation_for);
        Self {
            anchor,
            viewport,
            rotation,
        }
    }

    /// Camera for the store's current state
    pub fn from_store(store: &WorldStore) -> Self {
        Self::new(
            CameraAnchor::resolve(store),
            store.local().screen,
            store.turns_enabled(),
        )
    }

    /// Camera with no reference: centred on `center`, never rotated
    pub fn identity(center: Vec2, viewport: Vec2) -> Self {
        Self::new(CameraAnchor::Point(center), viewport, false)
    }

    pub fn anchor(&self) -> CameraAnchor {
        self.anchor
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn viewport_center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    pub fn rotation(&self) -> Option<f32> {
        self.rotation
    }

    /// Translation-only part of the transform
    ///
    /// This is what drawing code uses while the canvas rotation is installed.
    #[inline]
    pub fn offset(&self, p: Vec2) -> Vec2 {
        p - self.anchor.position() + self.viewport_center()
    }

    /// Final pixel position of a world point, rotation included
    pub fn world_to_screen(&self, p: Vec2) -> Vec2 {
        let s = self.offset(p);
        match self.rotation {
            Some(angle) => s.rotate_about(self.viewport_center(), angle),
            None => s,
        }
    }

    /// Inverse of [`Camera::world_to_screen`]
    pub fn screen_to_world(&self, s: Vec2) -> Vec2 {
        let center = self.viewport_center();
        let unrotated = match self.rotation {
            Some(angle) => s.rotate_about(center, -angle),
            None => s,
        };
        unrotated + self.anchor.position() - center
    }

    /// Map a screen-space direction back into world orientation
    pub fn inverse_rotate(&self, v: Vec2) -> Vec2 {
        match self.rotation {
            Some(angle) => v.rotate(-angle),
            None => v,
        }
    }
}

/// Canvas rotation for a tank at `longitude` degrees
///
/// Maps the radial direction `(cos L, sin L)` onto screen up `(0, -1)`.
pub fn rotation_for(longitude: f32) -> f32 {
    -(FRAC_PI_2 + longitude.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Ammunition, Bullet, EntityId, SpriteName, Tank};

    const EPSILON: f32 = 1e-2;

    fn tank(id: &str, x: f32, y: f32, longitude: f32) -> Tank {
        Tank {
            id: EntityId::from(id),
            sprite: SpriteName::new("GREY1_SPRITE"),
            name: String::new(),
            x,
            y,
            hue: None,
            angle: 0.0,
            longitude,
            health: 100.0,
            ammunition: Ammunition::default(),
            planet_x: None,
            planet_y: None,
            sound: None,
        }
    }

    #[test]
    fn test_translation_centres_anchor() {
        let cam = Camera::identity(Vec2::new(1000.0, 1000.0), Vec2::new(800.0, 600.0));
        assert_eq!(
            cam.world_to_screen(Vec2::new(1000.0, 1000.0)),
            Vec2::new(400.0, 300.0)
        );
        assert_eq!(
            cam.world_to_screen(Vec2::new(1010.0, 990.0)),
            Vec2::new(410.0, 290.0)
        );
    }

    #[test]
    fn test_round_trip_without_rotation() {
        let cam = Camera::identity(Vec2::new(-50.0, 75.0), Vec2::new(1024.0, 768.0));
        let p = Vec2::new(123.0, -456.0);
        assert!(cam.screen_to_world(cam.world_to_screen(p)).approx_eq(p, EPSILON));
    }

    #[test]
    fn test_round_trip_with_rotation() {
        let anchor = CameraAnchor::Tank {
            position: Vec2::new(300.0, 200.0),
            longitude: 37.0,
        };
        let cam = Camera::new(anchor, Vec2::new(800.0, 600.0), true);
        for p in [Vec2::new(0.0, 0.0), Vec2::new(300.0, 200.0), Vec2::new(-90.0, 1234.0)] {
            assert!(cam.screen_to_world(cam.world_to_screen(p)).approx_eq(p, EPSILON));
        }
    }

    #[test]
    fn test_rotation_puts_radial_up() {
        for longitude in [0.0_f32, 90.0, 180.0, 271.0] {
            let position = Vec2::new(500.0, 500.0);
            let cam = Camera::new(
                CameraAnchor::Tank { position, longitude },
                Vec2::new(800.0, 600.0),
                true,
            );
            let above = position + Vec2::from_angle(longitude.to_radians()) * 10.0;
            let s = cam.world_to_screen(above);
            assert!(s.approx_eq(Vec2::new(400.0, 290.0), EPSILON), "{:?}", s);
        }
    }

    #[test]
    fn test_rotation_requires_tank_and_flag() {
        let anchor = CameraAnchor::Tank {
            position: Vec2::ZERO,
            longitude: 45.0,
        };
        assert!(Camera::new(anchor, Vec2::new(10.0, 10.0), false).rotation().is_none());
        assert!(Camera::new(anchor, Vec2::new(10.0, 10.0), true).rotation().is_some());
        let point = CameraAnchor::Point(Vec2::ZERO);
        assert!(Camera::new(point, Vec2::new(10.0, 10.0), true).rotation().is_none());
        let orphan = CameraAnchor::Projectile {
            position: Vec2::ZERO,
            longitude: None,
        };
        assert!(Camera::new(orphan, Vec2::new(10.0, 10.0), true).rotation().is_none());
    }

    #[test]
    fn test_inverse_rotate_undoes_rotation() {
        let cam = Camera::new(
            CameraAnchor::Tank {
                position: Vec2::ZERO,
                longitude: 0.0,
            },
            Vec2::new(100.0, 100.0),
            true,
        );
        // Screen up is the tank's radial (+x at longitude 0)
        let world_dir = cam.inverse_rotate(Vec2::UP);
        assert!(world_dir.approx_eq(Vec2::new(1.0, 0.0), 1e-5));
    }

    fn bullet(x: f32, y: f32) -> Bullet {
        Bullet {
            id: EntityId::from(1u64),
            sprite: SpriteName::new("BULLET_SPRITE"),
            x,
            y,
            roll: 0.0,
            sound: None,
            hue: None,
        }
    }

    #[test]
    fn test_resolve_prefers_bullet_in_turn_mode() {
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.replace_tanks(vec![tank("a", 10.0, 10.0, 0.0)]);
        store.set_current_player(EntityId::from("a"));
        store.replace_bullets(vec![bullet(99.0, 98.0)]);

        assert!(matches!(CameraAnchor::resolve(&store), CameraAnchor::Tank { .. }));

        store.set_turns_enabled(true);
        assert_eq!(
            CameraAnchor::resolve(&store),
            CameraAnchor::Projectile {
                position: Vec2::new(99.0, 98.0),
                longitude: Some(0.0)
            }
        );
        let cam = Camera::from_store(&store);
        assert_eq!(cam.rotation(), Some(rotation_for(0.0)));
        assert!(cam
            .world_to_screen(Vec2::new(99.0, 98.0))
            .approx_eq(Vec2::new(400.0, 300.0), EPSILON));
    }

    #[test]
    fn test_rotation_survives_shot_in_flight() {
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.set_turns_enabled(true);
        store.replace_tanks(vec![tank("a", 10.0, 10.0, 45.0)]);
        store.set_current_player(EntityId::from("a"));

        let before = Camera::from_store(&store);
        assert_eq!(before.rotation(), Some(rotation_for(45.0)));

        store.replace_bullets(vec![bullet(200.0, 50.0)]);
        let during = Camera::from_store(&store);
        assert_eq!(during.rotation(), before.rotation());
        assert!(during
            .inverse_rotate(Vec2::UP)
            .approx_eq(before.inverse_rotate(Vec2::UP), 1e-5));

        store.replace_bullets(Vec::new());
        assert_eq!(Camera::from_store(&store), before);
    }

    #[test]
    fn test_shot_without_known_shooter_is_upright() {
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.set_turns_enabled(true);
        store.replace_bullets(vec![bullet(5.0, 5.0)]);
        let cam = Camera::from_store(&store);
        assert_eq!(cam.anchor().longitude(), None);
        assert!(cam.rotation().is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_local_view() {
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.set_local_player(Some(EntityId::from("me")), "me");
        store.replace_tanks(vec![tank("me", 5.0, 6.0, 10.0)]);
        store.set_current_player(EntityId::from("gone"));
        assert_eq!(
            CameraAnchor::resolve(&store),
            CameraAnchor::Tank {
                position: Vec2::new(5.0, 6.0),
                longitude: 10.0
            }
        );

        let mut spectator = WorldStore::new();
        spectator.set_screen(800.0, 600.0);
        spectator.set_local_position(Vec2::new(2500.0, 2500.0));
        assert_eq!(
            CameraAnchor::resolve(&spectator),
            CameraAnchor::Point(Vec2::new(2500.0, 2500.0))
        );
    }
}
