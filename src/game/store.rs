//! Local mirror of the server-authoritative world
//!
//! Single writer: the session applies decoded events here at the start of a
//! frame, renderers and the camera only read.

use hashbrown::HashMap;
use tracing::debug;

use crate::game::entity::{
    Ammunition, Bullet, EntityId, EntityRecord, Explosion, Hue, IncrementalUpdate, Planet, Tank,
    Trajectory,
};
use crate::util::vec2::Vec2;

/// Cached copy of the local player's tank plus viewport geometry
#[derive(Debug, Clone, Default)]
pub struct LocalPlayerView {
    /// Connection id assigned by the server (absent for spectators)
    pub id: Option<EntityId>,
    pub name: String,
    /// Last known position (absent until the first tank list)
    pub position: Option<Vec2>,
    /// Previous position minus current position
    pub offset: Vec2,
    pub hue: Option<Hue>,
    pub longitude: f32,
    pub health: f32,
    pub ammunition: Ammunition,
    /// Viewport size in pixels
    pub screen: Vec2,
}

impl LocalPlayerView {
    /// Position the camera falls back to
    pub fn anchor(&self) -> Vec2 {
        self.position.unwrap_or(self.screen * 0.5)
    }
}

/// Result of an incremental update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Planet patch applied but some indices were out of range
    PartiallyApplied { skipped: usize },
    /// Target entity is not known (yet); update dropped
    UnknownEntity,
    /// Sprite the store does not track
    Unhandled,
}

#[derive(Debug, Default)]
pub struct WorldStore {
    planets: Vec<Planet>,
    planet_index: HashMap<EntityId, usize>,
    tanks: Vec<Tank>,
    tank_index: HashMap<EntityId, usize>,
    bullets: Vec<Bullet>,
    explosions: Vec<Explosion>,
    trajectory: Option<Trajectory>,

    local: LocalPlayerView,
    inventory_dirty: bool,

    world_size: Vec2,
    turns_enabled: bool,
    current_player: Option<EntityId>,
    in_initial_burst: bool,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- snapshot -----

    /// Replace planets and tanks with `batch`
    ///
    /// Later records with the same id replace earlier ones, so ids are unique
    /// per kind afterwards.
    pub fn apply_full_snapshot<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        self.planets.clear();
        self.planet_index.clear();
        self.tanks.clear();
        self.tank_index.clear();
        self.extend_snapshot(batch);
    }

    /// Apply one `initial` message
    ///
    /// The server sends the snapshot one object per message, possibly with
    /// broadcasts interleaved. The first message after the burst is opened
    /// clears the world, the rest add to it until the next handshake.
    pub fn apply_initial<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        if self.in_initial_burst {
            self.extend_snapshot(batch);
        } else {
            self.apply_full_snapshot(batch);
            self.in_initial_burst = true;
        }
    }

    /// Handshake events (`welcome`, `gameSetup`) close the current burst
    pub fn close_initial_burst(&mut self) {
        self.in_initial_burst = false;
    }

    fn extend_snapshot<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        for record in batch {
            match record {
                EntityRecord::Planet(planet) => self.upsert_planet(planet),
                EntityRecord::Tank(tank) => self.upsert_tank(tank),
                EntityRecord::Other(sprite) => {
                    debug!("Ignoring snapshot record with sprite {}", sprite);
                }
            }
        }
    }

    fn upsert_planet(&mut self, planet: Planet) {
        match self.planet_index.get(&planet.id) {
            Some(&i) => self.planets[i] = planet,
            None => {
                self.planet_index.insert(planet.id.clone(), self.planets.len());
                self.planets.push(planet);
            }
        }
    }

    fn upsert_tank(&mut self, tank: Tank) {
        match self.tank_index.get(&tank.id) {
            Some(&i) => self.tanks[i] = tank,
            None => {
                self.tank_index.insert(tank.id.clone(), self.tanks.len());
                self.tanks.push(tank);
            }
        }
    }

    // ----- incremental -----

    pub fn apply_incremental_update(&mut self, update: IncrementalUpdate) -> UpdateOutcome {
        match update {
            IncrementalUpdate::Planet { id, deltas } => {
                let Some(&i) = self.planet_index.get(&id) else {
                    debug!("Altitude patch for unknown planet {}", id);
                    return UpdateOutcome::UnknownEntity;
                };
                match self.planets[i].apply_altitude_patch(&deltas) {
                    0 => UpdateOutcome::Applied,
                    skipped => {
                        debug!("Planet {}: {} altitude indices out of range", id, skipped);
                        UpdateOutcome::PartiallyApplied { skipped }
                    }
                }
            }
            IncrementalUpdate::Bullet(bullet) => {
                match self.bullets.iter_mut().find(|b| b.id == bullet.id) {
                    Some(existing) => *existing = bullet,
                    None => self.bullets.push(bullet),
                }
                UpdateOutcome::Applied
            }
            IncrementalUpdate::Other(sprite) => {
                debug!("Unhandled update for sprite {}", sprite);
                UpdateOutcome::Unhandled
            }
        }
    }

    // ----- wholesale replacement -----

    pub fn replace_bullets(&mut self, bullets: Vec<Bullet>) {
        self.bullets = bullets;
    }

    pub fn replace_explosions(&mut self, explosions: Vec<Explosion>) {
        self.explosions = explosions;
    }

    /// An empty path clears the trajectory
    pub fn replace_trajectory(&mut self, trajectory: Trajectory) {
        self.trajectory = if trajectory.is_empty() {
            None
        } else {
            Some(trajectory)
        };
    }

    /// Replace the tank list and refresh the local player view
    pub fn replace_tanks(&mut self, tanks: Vec<Tank>) {
        self.tanks.clear();
        self.tank_index.clear();
        for tank in tanks.into_iter().filter(|t| !t.sprite.is_empty()) {
            self.upsert_tank(tank);
        }
        self.refresh_local_view();
    }

    fn refresh_local_view(&mut self) {
        let Some(local_id) = self.local.id.as_ref() else {
            return;
        };
        let Some(&i) = self.tank_index.get(local_id) else {
            return;
        };
        let tank = &self.tanks[i];
        let local = &mut self.local;

        let next = tank.position();
        local.offset = match local.position {
            Some(prev) if (prev - next).is_finite() => prev - next,
            _ => Vec2::ZERO,
        };
        local.position = Some(next);
        local.hue = tank.hue.clone();
        local.longitude = tank.longitude;

        let mut changed = false;
        if local.health != tank.health {
            local.health = tank.health;
            changed = true;
        }
        if local.ammunition.selected != tank.ammunition.selected {
            local.ammunition.selected = tank.ammunition.selected;
            changed = true;
        }
        if local.ammunition.counts != tank.ammunition.counts {
            local.ammunition.counts = tank.ammunition.counts.clone();
            changed = true;
        }
        local.ammunition.sprites = tank.ammunition.sprites.clone();

        if changed {
            self.inventory_dirty = true;
        }
    }

    // ----- teardown -----

    /// Drop everything that only lives during a round in progress
    pub fn clear_transient(&mut self) {
        self.bullets.clear();
        self.explosions.clear();
        self.trajectory = None;
    }

    pub fn clear_planets(&mut self) {
        self.planets.clear();
        self.planet_index.clear();
    }

    /// Forget the whole world (new connection)
    pub fn reset(&mut self) {
        let screen = self.local.screen;
        *self = Self::default();
        self.local.screen = screen;
    }

    // ----- session state -----

    /// Install the local player identity from the `welcome` settings
    pub fn set_local_player(&mut self, id: Option<EntityId>, name: impl Into<String>) {
        self.local.id = id;
        self.local.name = name.into();
        self.local.position = None;
        self.local.offset = Vec2::ZERO;
        self.inventory_dirty = true;
    }

    /// Seed the local view position (spectators sit at the world centre)
    pub fn set_local_position(&mut self, position: Vec2) {
        self.local.position = Some(position);
    }

    pub fn set_screen(&mut self, width: f32, height: f32) {
        self.local.screen = Vec2::new(width, height);
        self.inventory_dirty = true;
    }

    pub fn set_world_size(&mut self, width: f32, height: f32) {
        self.world_size = Vec2::new(width, height);
    }

    pub fn set_turns_enabled(&mut self, enabled: bool) {
        self.turns_enabled = enabled;
    }

    pub fn set_current_player(&mut self, id: EntityId) {
        self.current_player = Some(id);
    }

    /// Consume the HUD repaint flag
    pub fn take_inventory_dirty(&mut self) -> bool {
        std::mem::take(&mut self.inventory_dirty)
    }

    pub fn mark_inventory_dirty(&mut self) {
        self.inventory_dirty = true;
    }

    // ----- read-only views -----

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn planet(&self, id: &EntityId) -> Option<&Planet> {
        self.planet_index.get(id).map(|&i| &self.planets[i])
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn find_tank(&self, id: &EntityId) -> Option<&Tank> {
        self.tank_index.get(id).map(|&i| &self.tanks[i])
    }

    /// Tank whose turn it is, if any and if known
    pub fn current_tank(&self) -> Option<&Tank> {
        self.current_player.as_ref().and_then(|id| self.find_tank(id))
    }

    pub fn local_tank(&self) -> Option<&Tank> {
        self.local.id.as_ref().and_then(|id| self.find_tank(id))
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    pub fn local(&self) -> &LocalPlayerView {
        &self.local
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    pub fn turns_enabled(&self) -> bool {
        self.turns_enabled
    }

    pub fn current_player(&self) -> Option<&EntityId> {
        self.current_player.as_ref()
    }

    pub fn inventory_dirty(&self) -> bool {
        self.inventory_dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::SpriteName;

    fn planet(id: u64, altitudes: Vec<f32>) -> Planet {
        Planet {
            id: EntityId::from(id),
            sprite: SpriteName::new("PLANET_SPRITE"),
            hue: None,
            x: 0.0,
            y: 0.0,
            core_radius: 1.0,
            sealevel_radius: 10.0,
            number_of_altitudes: altitudes.len(),
            altitudes,
        }
    }

    fn tank(id: &str, x: f32, y: f32, health: f32) -> Tank {
        Tank {
            id: EntityId::from(id),
            sprite: SpriteName::new("GREY1_SPRITE"),
            name: String::new(),
            x,
            y,
            hue: None,
            angle: 0.0,
            longitude: 0.0,
            health,
            ammunition: Ammunition::default(),
            planet_x: None,
            planet_y: None,
            sound: None,
        }
    }

    fn bullet(id: u64) -> Bullet {
        Bullet {
            id: EntityId::from(id),
            sprite: SpriteName::new("BULLET_SPRITE"),
            x: 0.0,
            y: 0.0,
            roll: 0.0,
            sound: None,
            hue: None,
        }
    }

    #[test]
    fn test_full_snapshot_clears_and_dedups() {
        let mut store = WorldStore::new();
        store.apply_full_snapshot(vec![EntityRecord::Planet(planet(1, vec![1.0]))]);
        store.apply_full_snapshot(vec![
            EntityRecord::Planet(planet(2, vec![1.0])),
            EntityRecord::Planet(planet(2, vec![5.0])),
            EntityRecord::Tank(tank("a", 0.0, 0.0, 100.0)),
            EntityRecord::Other(SpriteName::new("WORMHOLE_SPRITE")),
        ]);
        assert_eq!(store.planets().len(), 1);
        assert_eq!(store.planets()[0].altitudes, vec![5.0]);
        assert!(store.planet(&EntityId::from(1u64)).is_none());
        assert_eq!(store.tanks().len(), 1);
    }

    #[test]
    fn test_initial_burst_accumulates_until_closed() {
        let mut store = WorldStore::new();
        store.apply_initial(vec![EntityRecord::Planet(planet(1, vec![1.0]))]);
        store.apply_initial(vec![EntityRecord::Planet(planet(2, vec![1.0]))]);
        assert_eq!(store.planets().len(), 2);

        store.close_initial_burst();
        store.apply_initial(vec![EntityRecord::Planet(planet(3, vec![1.0]))]);
        assert_eq!(store.planets().len(), 1);
        assert!(store.planet(&EntityId::from(3u64)).is_some());
    }

    #[test]
    fn test_planet_patch() {
        let mut store = WorldStore::new();
        store.apply_full_snapshot(vec![EntityRecord::Planet(planet(7, vec![10.0, 10.0, 10.0]))]);

        let patch = IncrementalUpdate::Planet {
            id: EntityId::from(7u64),
            deltas: vec![(1, 20.0)],
        };
        assert_eq!(store.apply_incremental_update(patch.clone()), UpdateOutcome::Applied);
        assert_eq!(store.planets()[0].altitudes, vec![10.0, 20.0, 10.0]);

        // Idempotent
        store.apply_incremental_update(patch);
        assert_eq!(store.planets()[0].altitudes, vec![10.0, 20.0, 10.0]);
    }

    #[test]
    fn test_planet_patch_unknown_id_ignored() {
        let mut store = WorldStore::new();
        store.apply_full_snapshot(vec![EntityRecord::Planet(planet(7, vec![10.0]))]);
        let outcome = store.apply_incremental_update(IncrementalUpdate::Planet {
            id: EntityId::from(99u64),
            deltas: vec![(0, 1.0)],
        });
        assert_eq!(outcome, UpdateOutcome::UnknownEntity);
        assert_eq!(store.planets()[0].altitudes, vec![10.0]);
    }

    #[test]
    fn test_planet_patch_out_of_range_reported() {
        let mut store = WorldStore::new();
        store.apply_full_snapshot(vec![EntityRecord::Planet(planet(7, vec![10.0, 10.0]))]);
        let outcome = store.apply_incremental_update(IncrementalUpdate::Planet {
            id: EntityId::from(7u64),
            deltas: vec![(0, 3.0), (2, 1.0)],
        });
        assert_eq!(outcome, UpdateOutcome::PartiallyApplied { skipped: 1 });
        assert_eq!(store.planets()[0].altitudes, vec![3.0, 10.0]);
    }

    #[test]
    fn test_bullet_update_appends_or_replaces() {
        let mut store = WorldStore::new();
        store.apply_incremental_update(IncrementalUpdate::Bullet(bullet(1)));
        let mut moved = bullet(1);
        moved.x = 50.0;
        store.apply_incremental_update(IncrementalUpdate::Bullet(moved));
        store.apply_incremental_update(IncrementalUpdate::Bullet(bullet(2)));
        assert_eq!(store.bullets().len(), 2);
        assert_eq!(store.bullets()[0].x, 50.0);
    }

    #[test]
    fn test_replace_bullets_then_empty() {
        let mut store = WorldStore::new();
        store.replace_bullets(vec![bullet(1), bullet(2)]);
        assert_eq!(store.bullets().len(), 2);
        store.replace_bullets(Vec::new());
        assert!(store.bullets().is_empty());
    }

    fn explosion(x: f32, sprite: &str) -> Explosion {
        Explosion {
            x,
            y: 0.0,
            sprite: SpriteName::new(sprite),
            radius: 10.0,
            sound: None,
        }
    }

    #[test]
    fn test_replace_explosions_wholesale_in_order() {
        let mut store = WorldStore::new();
        store.replace_explosions(vec![explosion(1.0, "EXPLOSION_SPRITE"), explosion(2.0, "EXPLOSION_SPRITE")]);

        let next = vec![
            explosion(9.0, "EXPLOSION2_SPRITE"),
            explosion(3.0, "EXPLOSION_SPRITE"),
            explosion(9.0, "EXPLOSION2_SPRITE"),
        ];
        store.replace_explosions(next.clone());
        assert_eq!(store.explosions(), next.as_slice());

        store.replace_explosions(Vec::new());
        assert!(store.explosions().is_empty());
    }

    #[test]
    fn test_initial_burst_survives_broadcasts() {
        let mut store = WorldStore::new();
        store.apply_initial(vec![EntityRecord::Planet(planet(1, vec![1.0]))]);
        store.replace_explosions(Vec::new());
        store.replace_bullets(Vec::new());
        store.apply_initial(vec![EntityRecord::Planet(planet(2, vec![1.0]))]);
        assert_eq!(store.planets().len(), 2);
    }

    #[test]
    fn test_empty_trajectory_clears() {
        let mut store = WorldStore::new();
        store.replace_trajectory(Trajectory {
            hue: None,
            positions: vec![(0.0, 0.0), (1.0, 1.0)],
        });
        assert!(store.trajectory().is_some());
        store.replace_trajectory(Trajectory::default());
        assert!(store.trajectory().is_none());
    }

    #[test]
    fn test_replace_tanks_updates_local_view() {
        let mut store = WorldStore::new();
        store.set_local_player(Some(EntityId::from("me")), "tester");
        assert!(store.take_inventory_dirty());

        store.replace_tanks(vec![tank("me", 10.0, 10.0, 100.0), tank("other", 0.0, 0.0, 50.0)]);
        assert_eq!(store.local().position, Some(Vec2::new(10.0, 10.0)));
        assert_eq!(store.local().offset, Vec2::ZERO);
        assert!(store.take_inventory_dirty());

        // Same health and ammunition: no repaint
        store.replace_tanks(vec![tank("me", 12.0, 7.0, 100.0)]);
        assert_eq!(store.local().offset, Vec2::new(-2.0, 3.0));
        assert!(!store.take_inventory_dirty());

        store.replace_tanks(vec![tank("me", 12.0, 7.0, 90.0)]);
        assert_eq!(store.local().health, 90.0);
        assert!(store.take_inventory_dirty());
    }

    #[test]
    fn test_replace_tanks_drops_spriteless_records() {
        let mut store = WorldStore::new();
        let mut ghost = tank("ghost", 0.0, 0.0, 0.0);
        ghost.sprite = SpriteName::default();
        store.replace_tanks(vec![ghost, tank("a", 1.0, 1.0, 100.0)]);
        assert_eq!(store.tanks().len(), 1);
        assert!(store.find_tank(&EntityId::from("ghost")).is_none());
    }

    #[test]
    fn test_current_tank_resolution() {
        let mut store = WorldStore::new();
        store.replace_tanks(vec![tank("a", 1.0, 1.0, 100.0), tank("b", 2.0, 2.0, 100.0)]);
        assert!(store.current_tank().is_none());
        store.set_current_player(EntityId::from("b"));
        assert_eq!(store.current_tank().map(|t| t.x), Some(2.0));
    }

    #[test]
    fn test_reset_keeps_screen() {
        let mut store = WorldStore::new();
        store.set_screen(800.0, 600.0);
        store.replace_bullets(vec![bullet(1)]);
        store.reset();
        assert!(store.bullets().is_empty());
        assert_eq!(store.local().screen, Vec2::new(800.0, 600.0));
    }
}
