//! Client-only trail particles

use crate::game::constants::{particles, render};
use crate::game::entity::{Bullet, Hue};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub sprite: &'static str,
    pub position: Vec2,
    pub spawned_at_ms: u64,
    pub ttl_ms: u64,
    pub tint: Option<Hue>,
    pub scale: f32,
}

impl Particle {
    /// Trail mark left behind a projectile
    pub fn trail(bullet: &Bullet, now_ms: u64) -> Self {
        Self {
            sprite: particles::TRAIL_SPRITE,
            position: bullet.position(),
            spawned_at_ms: now_ms,
            ttl_ms: particles::TRAIL_TTL_MS,
            tint: bullet.hue.clone(),
            scale: particles::TRAIL_SCALE,
        }
    }

    #[inline]
    pub fn is_dead(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.spawned_at_ms) >= self.ttl_ms
    }

    pub fn tint_css(&self) -> &str {
        self.tint
            .as_ref()
            .map(|h| h.as_css())
            .unwrap_or(render::DEFAULT_TINT)
    }
}

/// Trail spawning follows a 50% duty cycle on the wall clock
#[inline]
pub fn should_spawn_trail(now_ms: u64) -> bool {
    now_ms % particles::SPAWN_PERIOD_MS < particles::SPAWN_DUTY_MS
}

/// Particles owned by the render pipeline
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Drop dead particles; returns how many were removed
    pub fn collect_garbage(&mut self, now_ms: u64) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_dead(now_ms));
        before - self.particles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
