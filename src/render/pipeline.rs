//! Per-frame render pipeline
//!
//! Paints the world surface from the store through the camera, keeps the
//! trail particles, and repaints the HUD surfaces when they are dirty.

use tracing::trace;

use crate::game::camera::Camera;
use crate::game::constants::{assets, particles as particle_consts, render};
use crate::game::entity::{Bullet, Explosion, Planet, SoundName, Tank, Trajectory};
use crate::game::store::WorldStore;
use crate::net::session::SessionPhase;
use crate::render::audio::AudioSink;
use crate::render::canvas::{Canvas, Paint, RadialGradient, Surfaces, TextAlign};
use crate::render::hud;
use crate::render::particles::{should_spawn_trail, Particle, ParticleSystem};
use crate::render::registry::ReferenceRegistry;
use crate::util::vec2::Vec2;

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub registry_misses: u64,
    pub sounds_played: u64,
    pub particles_spawned: u64,
    pub particles_collected: u64,
    pub hud_repainted: bool,
    /// The world was drawn and a heartbeat should follow
    pub heartbeat_due: bool,
}

impl FrameStats {
    pub fn registry_miss(&mut self, name: &str) {
        trace!("Registry miss: {}", name);
        self.registry_misses += 1;
    }
}

pub struct RenderPipeline {
    registry: ReferenceRegistry,
    particles: ParticleSystem,
    draw_border: bool,
}

impl RenderPipeline {
    pub fn new(registry: ReferenceRegistry, draw_border: bool) -> Self {
        Self {
            registry,
            particles: ParticleSystem::new(),
            draw_border,
        }
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    /// Drop client-side effects (teardown)
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Render one frame
    pub fn render_frame(
        &mut self,
        store: &mut WorldStore,
        phase: &SessionPhase,
        surfaces: Surfaces<'_>,
        audio: &mut dyn AudioSink,
        now_ms: u64,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let world = surfaces.world;
        world.reset_transform();

        if matches!(phase, SessionPhase::Menu) {
            return stats;
        }
        if let Some(lines) = phase.status_lines() {
            draw_status_screen(world, &lines);
            return stats;
        }

        stats.particles_collected = self.particles.collect_garbage(now_ms) as u64;

        world.clear();
        let camera = Camera::from_store(store);

        world.save();
        if let Some(angle) = camera.rotation() {
            let center = camera.viewport_center();
            world.translate(center);
            world.rotate(angle);
            world.translate(-center);
        }

        for planet in store.planets() {
            draw_planet(world, &camera, planet);
        }
        if let Some(trajectory) = store.trajectory() {
            draw_trajectory(world, &camera, trajectory, store.current_tank());
        }
        for tank in store.tanks() {
            self.draw_tank(world, audio, &camera, tank, &mut stats);
        }
        for bullet in store.bullets() {
            self.draw_bullet(world, audio, &camera, bullet, now_ms, &mut stats);
        }
        self.draw_particles(world, &camera);
        for explosion in store.explosions() {
            self.draw_explosion(world, audio, &camera, explosion, &mut stats);
        }
        if self.draw_border {
            draw_border(world, &camera, store);
        }

        world.restore();

        if store.take_inventory_dirty() {
            let local = store.local();
            hud::draw_health_bar(surfaces.health, &self.registry, local.health, &mut stats);
            hud::draw_inventory(
                surfaces.inventory,
                &self.registry,
                &local.ammunition,
                local.screen,
                &mut stats,
            );
            stats.hud_repainted = true;
        }

        stats.heartbeat_due = true;
        stats
    }

    fn play(&self, audio: &mut dyn AudioSink, sound: Option<&SoundName>, stats: &mut FrameStats) {
        let Some(name) = sound else {
            return;
        };
        match self.registry.sound_for(name) {
            Some(sound) => {
                audio.play(sound);
                stats.sounds_played += 1;
            }
            None => stats.registry_miss(name.as_str()),
        }
    }

    fn draw_tank(
        &self,
        canvas: &mut dyn Canvas,
        audio: &mut dyn AudioSink,
        camera: &Camera,
        tank: &Tank,
        stats: &mut FrameStats,
    ) {
        let center = camera.offset(tank.position());
        let turret_angle = std::f32::consts::PI + (tank.angle + tank.longitude).to_radians();
        let hull_angle = std::f32::consts::PI + tank.longitude.to_radians();

        match self.registry.sprite(assets::TURRET_SPRITE) {
            Some(turret) => canvas.draw_rotated(turret, center, turret_angle),
            None => stats.registry_miss(assets::TURRET_SPRITE),
        }

        match self.registry.sprite(assets::TREADS_SPRITE) {
            Some(treads) => {
                let back = tank.radial() * (render::TREAD_OFFSET_FRACTION * treads.height());
                canvas.draw_rotated(treads, center - back, hull_angle);
            }
            None => stats.registry_miss(assets::TREADS_SPRITE),
        }

        match self.registry.sprite(assets::BODY_SPRITE) {
            Some(body) => canvas.draw_rotated(body, center, hull_angle),
            None => stats.registry_miss(assets::BODY_SPRITE),
        }

        self.play(audio, tank.sound.as_ref(), stats);
    }

    fn draw_bullet(
        &mut self,
        canvas: &mut dyn Canvas,
        audio: &mut dyn AudioSink,
        camera: &Camera,
        bullet: &Bullet,
        now_ms: u64,
        stats: &mut FrameStats,
    ) {
        match self.registry.sprite_for(&bullet.sprite) {
            Some(sprite) => canvas.draw_rotated(sprite, camera.offset(bullet.position()), bullet.roll),
            None => stats.registry_miss(bullet.sprite.as_str()),
        }
        self.play(audio, bullet.sound.as_ref(), stats);

        if should_spawn_trail(now_ms) {
            self.particles.spawn(Particle::trail(bullet, now_ms));
            stats.particles_spawned += 1;
        }
    }

    fn draw_particles(&self, canvas: &mut dyn Canvas, camera: &Camera) {
        let size = Vec2::new(particle_consts::PARTICLE_SIZE, particle_consts::PARTICLE_SIZE);
        for particle in self.particles.iter() {
            canvas.set_fill(Paint::color(particle.tint_css()));
            canvas.fill_rect(camera.offset(particle.position), size);
        }
    }

    fn draw_explosion(
        &self,
        canvas: &mut dyn Canvas,
        audio: &mut dyn AudioSink,
        camera: &Camera,
        explosion: &Explosion,
        stats: &mut FrameStats,
    ) {
        let center = camera.offset(explosion.position());

        canvas.begin_path();
        for i in 0..render::EXPLOSION_SIDES {
            let theta = i as f32 / render::EXPLOSION_SIDES as f32 * std::f32::consts::TAU;
            let (sin, cos) = theta.sin_cos();
            canvas.line_to(center + Vec2::new(sin, cos) * explosion.radius);
        }
        canvas.close_path();
        canvas.stroke();
        canvas.fill();

        match self.registry.sprite_for(&explosion.sprite) {
            Some(sprite) => canvas.draw_rotated(sprite, center, 0.0),
            None => stats.registry_miss(explosion.sprite.as_str()),
        }
        self.play(audio, explosion.sound.as_ref(), stats);
    }
}

/// Full-screen message for non-playing phases
pub fn draw_status_screen(canvas: &mut dyn Canvas, lines: &[String]) {
    let size = canvas.size();
    canvas.set_fill(Paint::color(render::STATUS_BACKGROUND));
    canvas.fill_rect(Vec2::ZERO, size);

    canvas.set_text_align(TextAlign::Center);
    canvas.set_fill(Paint::color(render::STATUS_TEXT));
    canvas.set_font(render::STATUS_FONT);

    let center = size * 0.5;
    match lines {
        [single] => canvas.fill_text(single, center),
        [first, second, ..] => {
            canvas.fill_text(first, center - Vec2::new(0.0, 20.0));
            canvas.fill_text(second, center + Vec2::new(0.0, 20.0));
        }
        [] => {}
    }
}

/// Molten-core gradient between the core and sea-level radii
pub fn planet_gradient(center: Vec2, planet: &Planet) -> RadialGradient {
    let mut gradient = RadialGradient::new(center, planet.core_radius, planet.sealevel_radius);
    gradient.add_stop(0.0, render::PLANET_CENTER_COLOR);
    for &(depth, color) in render::PLANET_LAYERS.iter() {
        gradient.add_stop(1.0 - depth / render::PLANET_REFERENCE_RADIUS, color);
    }
    gradient
}

fn draw_planet(canvas: &mut dyn Canvas, camera: &Camera, planet: &Planet) {
    let center = camera.offset(planet.position());

    canvas.set_stroke(Paint::color(render::PLANET_STROKE));
    canvas.set_fill(Paint::Radial(planet_gradient(center, planet)));
    canvas.set_line_width(render::PLANET_LINE_WIDTH);

    canvas.begin_path();
    for point in planet.surface_points() {
        canvas.line_to(camera.offset(point));
    }
    canvas.close_path();
    canvas.stroke();
    canvas.fill();
}

fn draw_trajectory(
    canvas: &mut dyn Canvas,
    camera: &Camera,
    trajectory: &Trajectory,
    active: Option<&Tank>,
) {
    let color = active
        .and_then(|t| t.hue.as_ref())
        .or(trajectory.hue.as_ref())
        .map(|h| h.as_css())
        .unwrap_or(render::DEFAULT_TINT);

    canvas.set_stroke(Paint::color(color));
    canvas.set_line_width(render::TRAJECTORY_LINE_WIDTH);
    canvas.set_line_dash(&render::TRAJECTORY_DASH);
    canvas.begin_path();
    for (i, point) in trajectory.points().enumerate() {
        let p = camera.offset(point);
        if i == 0 {
            canvas.move_to(p);
        } else {
            canvas.line_to(p);
        }
    }
    canvas.stroke();
    canvas.set_line_dash(&[]);
}

/// World edges within half a viewport of the local player
fn draw_border(canvas: &mut dyn Canvas, camera: &Camera, store: &WorldStore) {
    let local = store.local();
    let me = local.anchor();
    let half = local.screen * 0.5;
    let world = store.world_size();

    let corners = [
        Vec2::ZERO,
        Vec2::new(world.x, 0.0),
        world,
        Vec2::new(0.0, world.y),
    ];
    let edges = [
        (me.x <= half.x, corners[0], corners[3]),           // left
        (me.y <= half.y, corners[0], corners[1]),           // top
        (world.x - me.x <= half.x, corners[1], corners[2]), // right
        (world.y - me.y <= half.y, corners[3], corners[2]), // bottom
    ];

    canvas.set_line_width(render::BORDER_LINE_WIDTH);
    canvas.set_stroke(Paint::color(render::BORDER_COLOR));
    for (visible, from, to) in edges {
        if visible {
            canvas.begin_path();
            canvas.move_to(camera.offset(from));
            canvas.line_to(camera.offset(to));
            canvas.stroke();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Ammunition, EntityId, EntityRecord, Hue, SpriteName};
    use crate::render::audio::{AudioCommand, RecordingAudio};
    use crate::render::canvas::{DrawCommand, RecordingCanvas};

    struct Harness {
        world: RecordingCanvas,
        health: RecordingCanvas,
        inventory: RecordingCanvas,
        audio: RecordingAudio,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: RecordingCanvas::new(800.0, 600.0),
                health: RecordingCanvas::new(500.0, 100.0),
                inventory: RecordingCanvas::new(300.0, 600.0),
                audio: RecordingAudio::new(),
            }
        }

        fn frame(
            &mut self,
            pipeline: &mut RenderPipeline,
            store: &mut WorldStore,
            phase: &SessionPhase,
            now_ms: u64,
        ) -> FrameStats {
            pipeline.render_frame(
                store,
                phase,
                Surfaces {
                    world: &mut self.world,
                    health: &mut self.health,
                    inventory: &mut self.inventory,
                },
                &mut self.audio,
                now_ms,
            )
        }
    }

    fn tank(id: &str) -> Tank {
        Tank {
            id: EntityId::from(id),
            sprite: SpriteName::new("GREY1_SPRITE"),
            name: String::new(),
            x: 100.0,
            y: 0.0,
            hue: Some(Hue::new("blue")),
            angle: 30.0,
            longitude: 0.0,
            health: 80.0,
            ammunition: Ammunition::default(),
            planet_x: Some(0.0),
            planet_y: Some(0.0),
            sound: Some(SoundName::new("SHOOT_SOUND")),
        }
    }

    fn bullet() -> Bullet {
        Bullet {
            id: EntityId::from(1u64),
            sprite: SpriteName::new("BULLET_SPRITE"),
            x: 10.0,
            y: 10.0,
            roll: 0.5,
            sound: None,
            hue: Some(Hue::new("green")),
        }
    }

    fn planet() -> Planet {
        Planet {
            id: EntityId::from(1u64),
            sprite: SpriteName::new("PLANET_SPRITE"),
            hue: None,
            x: 0.0,
            y: 0.0,
            core_radius: 10.0,
            sealevel_radius: 50.0,
            number_of_altitudes: 8,
            altitudes: vec![50.0; 8],
        }
    }

    fn pipeline() -> RenderPipeline {
        RenderPipeline::new(ReferenceRegistry::with_default_assets(), false)
    }

    #[test]
    fn test_status_screen_for_dead_phase() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        let stats = h.frame(&mut pipeline(), &mut store, &SessionPhase::Dead, 0);

        assert!(!stats.heartbeat_due);
        assert_eq!(h.world.commands()[0], DrawCommand::ResetTransform);
        assert_eq!(h.world.texts(), vec!["You died!"]);
        assert!(h.world.commands().contains(&DrawCommand::FillText {
            text: "You died!".to_string(),
            at: Vec2::new(400.0, 300.0)
        }));
    }

    #[test]
    fn test_kicked_with_reason_two_lines() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        let phase = SessionPhase::Kicked {
            reason: "cheating".to_string(),
        };
        h.frame(&mut pipeline(), &mut store, &phase, 0);
        assert!(h.world.commands().contains(&DrawCommand::FillText {
            text: "You were kicked for:".to_string(),
            at: Vec2::new(400.0, 280.0)
        }));
        assert!(h.world.commands().contains(&DrawCommand::FillText {
            text: "cheating".to_string(),
            at: Vec2::new(400.0, 320.0)
        }));
    }

    #[test]
    fn test_menu_draws_nothing() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        let stats = h.frame(&mut pipeline(), &mut store, &SessionPhase::Menu, 0);
        assert_eq!(h.world.commands(), &[DrawCommand::ResetTransform]);
        assert!(!stats.heartbeat_due);
    }

    #[test]
    fn test_alive_frame_order() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.apply_full_snapshot(vec![EntityRecord::Planet(planet())]);
        store.replace_tanks(vec![tank("a")]);
        store.replace_bullets(vec![bullet()]);
        store.replace_trajectory(Trajectory {
            hue: None,
            positions: vec![(0.0, 0.0), (5.0, 5.0)],
        });

        let stats = h.frame(&mut pipeline(), &mut store, &SessionPhase::Alive, 1_000);
        assert!(stats.heartbeat_due);
        assert_eq!(stats.registry_misses, 0);

        let cmds = h.world.commands();
        assert_eq!(cmds[0], DrawCommand::ResetTransform);
        assert!(matches!(cmds[1], DrawCommand::ClearRect { .. }));

        // Planet fill, then dashed trajectory, then tank sprites, then bullet
        let first_radial = cmds
            .iter()
            .position(|c| matches!(c, DrawCommand::SetFill(Paint::Radial(_))))
            .unwrap();
        let dash = cmds
            .iter()
            .position(|c| *c == DrawCommand::SetLineDash(vec![5.0, 15.0]))
            .unwrap();
        assert!(first_radial < dash);
        assert!(cmds.contains(&DrawCommand::SetLineDash(vec![])));
        assert_eq!(
            h.world.images(),
            vec!["TURRET1_SPRITE", "TREADS1_SPRITE", "GREYBODY1_SPRITE", "BULLET_SPRITE"]
        );
        assert_eq!(*cmds.last().unwrap(), DrawCommand::Restore);

        // Trail particle spawned on the duty cycle, tank sound played
        assert_eq!(stats.particles_spawned, 1);
        assert_eq!(h.audio.played(), vec!["SHOOT_SOUND"]);
    }

    #[test]
    fn test_particles_drawn_and_collected() {
        let mut h = Harness::new();
        let mut p = pipeline();
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.replace_bullets(vec![bullet()]);
        h.frame(&mut p, &mut store, &SessionPhase::Alive, 1_000);
        assert_eq!(p.particles().len(), 1);

        store.replace_bullets(Vec::new());
        h.world.take_commands();
        h.frame(&mut p, &mut store, &SessionPhase::Alive, 2_000);
        assert!(h.world.commands().contains(&DrawCommand::SetFill(Paint::color("green"))));

        let stats = h.frame(
            &mut p,
            &mut store,
            &SessionPhase::Alive,
            1_000 + particle_consts::TRAIL_TTL_MS,
        );
        assert_eq!(stats.particles_collected, 1);
        assert!(p.particles().is_empty());
    }

    #[test]
    fn test_no_trail_off_duty_cycle() {
        let mut h = Harness::new();
        let mut p = pipeline();
        let mut store = WorldStore::new();
        store.replace_bullets(vec![bullet()]);
        let stats = h.frame(&mut p, &mut store, &SessionPhase::Alive, 1_075);
        assert_eq!(stats.particles_spawned, 0);
    }

    #[test]
    fn test_rotation_installed_in_turn_mode() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.replace_tanks(vec![tank("a")]);
        store.set_current_player(EntityId::from("a"));
        store.set_turns_enabled(true);

        h.frame(&mut pipeline(), &mut store, &SessionPhase::Alive, 0);
        let cmds = h.world.commands();
        assert_eq!(cmds[2], DrawCommand::Save);
        assert_eq!(cmds[3], DrawCommand::Translate(Vec2::new(400.0, 300.0)));
        assert!(matches!(cmds[4], DrawCommand::Rotate(a) if (a + std::f32::consts::FRAC_PI_2).abs() < 1e-6));
        assert_eq!(cmds[5], DrawCommand::Translate(Vec2::new(-400.0, -300.0)));
    }

    #[test]
    fn test_hud_repainted_only_when_dirty() {
        let mut h = Harness::new();
        let mut p = pipeline();
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.set_local_player(Some(EntityId::from("a")), "me");
        store.replace_tanks(vec![tank("a")]);

        let first = h.frame(&mut p, &mut store, &SessionPhase::Alive, 0);
        assert!(first.hud_repainted);
        assert_eq!(h.health.texts(), vec!["80%"]);

        let second = h.frame(&mut p, &mut store, &SessionPhase::Alive, 16);
        assert!(!second.hud_repainted);
    }

    #[test]
    fn test_missing_sprites_skip_only_that_call() {
        let mut h = Harness::new();
        let mut p = RenderPipeline::new(ReferenceRegistry::new(), false);
        let mut store = WorldStore::new();
        store.replace_tanks(vec![tank("a")]);
        store.replace_bullets(vec![bullet()]);
        let stats = h.frame(&mut p, &mut store, &SessionPhase::Alive, 75);

        assert_eq!(stats.registry_misses, 5);
        assert!(h.world.images().is_empty());
        assert!(h.audio.commands().is_empty());
        assert!(stats.heartbeat_due);
    }

    #[test]
    fn test_explosion_polygon_sprite_and_sound() {
        let mut h = Harness::new();
        let mut store = WorldStore::new();
        store.replace_explosions(vec![Explosion {
            x: 0.0,
            y: 0.0,
            sprite: SpriteName::new("EXPLOSION1_SPRITE"),
            radius: 50.0,
            sound: Some(SoundName::new("EXPLOSION7_SOUND")),
        }]);
        h.frame(&mut pipeline(), &mut store, &SessionPhase::Alive, 75);

        let line_tos = h.world.count(|c| matches!(c, DrawCommand::LineTo(_)));
        assert_eq!(line_tos, render::EXPLOSION_SIDES);
        assert_eq!(h.world.images(), vec!["EXPLOSION1_SPRITE"]);
        assert_eq!(h.audio.commands(), &[AudioCommand::Play("EXPLOSION7_SOUND".to_string())]);
    }

    #[test]
    fn test_planet_gradient_stops() {
        let g = planet_gradient(Vec2::ZERO, &planet());
        assert_eq!(g.inner_radius, 10.0);
        assert_eq!(g.outer_radius, 50.0);
        assert_eq!(g.stops.len(), 7);
        assert_eq!(g.stops[0], (0.0, "yellow".to_string()));
        assert!((g.stops[1].0 - (1.0 - 5000.0 / 6370.0)).abs() < 1e-6);
        assert_eq!(g.stops[6], (1.0, "grey".to_string()));
    }

    #[test]
    fn test_border_edges_near_player() {
        let mut h = Harness::new();
        let mut p = RenderPipeline::new(ReferenceRegistry::with_default_assets(), true);
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.set_world_size(5000.0, 5000.0);
        store.set_local_position(Vec2::new(100.0, 2500.0));
        h.frame(&mut p, &mut store, &SessionPhase::Alive, 75);

        // Only the left edge is within half a viewport
        let strokes = h.world.count(|c| matches!(c, DrawCommand::Stroke));
        assert_eq!(strokes, 1);
        assert!(h.world.commands().contains(&DrawCommand::MoveTo(Vec2::new(300.0, -2200.0))));
    }
}
