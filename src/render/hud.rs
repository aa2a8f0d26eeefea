//! Health bar and weapon wheel
//!
//! Both live on their own surfaces and are repainted only when the local
//! player's health or ammunition changed.

use std::f32::consts::FRAC_PI_4;
use tracing::trace;

use crate::game::constants::{assets, hud};
use crate::game::entity::Ammunition;
use crate::render::canvas::{Canvas, Paint, TextAlign};
use crate::render::pipeline::FrameStats;
use crate::render::registry::ReferenceRegistry;
use crate::util::vec2::Vec2;

/// Number of bar segments shown for `health`
pub fn health_segments(health: f32) -> usize {
    if health <= 0.0 || !health.is_finite() {
        return 0;
    }
    (health / hud::HEALTH_PER_SEGMENT as f32).ceil() as usize
}

/// Health label, e.g. `"75%"` or `"92.5%"`
pub fn health_label(health: f32) -> String {
    format!("{}%", health)
}

pub fn draw_health_bar(
    canvas: &mut dyn Canvas,
    registry: &ReferenceRegistry,
    health: f32,
    stats: &mut FrameStats,
) {
    canvas.clear();

    match registry.sprite(assets::HPBAR_SPRITE) {
        Some(bar) => canvas.draw_image(bar, Vec2::ZERO, 1.0),
        None => stats.registry_miss(assets::HPBAR_SPRITE),
    }

    match registry.sprite(assets::HPSEGMENT_SPRITE) {
        Some(segment) => {
            let mut x = hud::SEGMENT_START_X;
            for _ in 0..health_segments(health) {
                canvas.draw_image(segment, Vec2::new(x, hud::SEGMENT_Y), 1.0);
                x += segment.width();
            }
        }
        None => stats.registry_miss(assets::HPSEGMENT_SPRITE),
    }

    canvas.set_fill(Paint::color(hud::HEALTH_TEXT_COLOR));
    canvas.set_text_align(TextAlign::Center);
    canvas.set_font(hud::HUD_FONT);
    canvas.fill_text(&health_label(health), hud::HEALTH_TEXT_POS.into());
}

/// Weapon wheel: selected weapon first, tilted and marked
pub fn draw_inventory(
    canvas: &mut dyn Canvas,
    registry: &ReferenceRegistry,
    ammunition: &Ammunition,
    screen: Vec2,
    stats: &mut FrameStats,
) {
    canvas.clear();
    canvas.set_fill(Paint::color(hud::AMMO_TEXT_COLOR));
    canvas.set_text_align(TextAlign::Start);
    canvas.set_font(hud::HUD_FONT);

    let top = screen.y / 3.0 - hud::AMMO_TOP_MARGIN;
    for (row, slot) in ammunition.wheel(hud::AMMO_SLOTS).enumerate() {
        let y = top + row as f32 * hud::AMMO_ROW_HEIGHT;
        let angle = if row == 0 { FRAC_PI_4 } else { 0.0 };

        match slot.sprite.and_then(|name| registry.sprite_for(name)) {
            Some(sprite) => canvas.draw_rotated(sprite, Vec2::new(hud::AMMO_ICON_X, y), angle),
            None => {
                let name = slot.sprite.map(|s| s.as_str()).unwrap_or("<none>");
                stats.registry_miss(name);
            }
        }

        canvas.fill_text(&slot.rounds.to_string(), Vec2::new(hud::AMMO_COUNT_X, y));
        if row == 0 {
            canvas.fill_text("<-", Vec2::new(hud::AMMO_MARKER_X, y));
        }
    }
    trace!("Inventory repainted ({} weapons)", ammunition.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::SpriteName;
    use crate::render::canvas::{DrawCommand, RecordingCanvas};

    #[test]
    fn test_health_segments() {
        assert_eq!(health_segments(100.0), 25);
        assert_eq!(health_segments(99.0), 25);
        assert_eq!(health_segments(4.0), 1);
        assert_eq!(health_segments(1.0), 1);
        assert_eq!(health_segments(0.0), 0);
        assert_eq!(health_segments(-5.0), 0);
    }

    #[test]
    fn test_health_label() {
        assert_eq!(health_label(100.0), "100%");
        assert_eq!(health_label(92.5), "92.5%");
    }

    #[test]
    fn test_health_bar_layout() {
        let registry = ReferenceRegistry::with_default_assets();
        let mut canvas = RecordingCanvas::new(500.0, 100.0);
        let mut stats = FrameStats::default();
        draw_health_bar(&mut canvas, &registry, 8.0, &mut stats);

        assert_eq!(canvas.images(), vec!["HPBAR_SPRITE", "HPSEGMENT_SPRITE", "HPSEGMENT_SPRITE"]);
        let seg_w = registry.sprite("HPSEGMENT_SPRITE").unwrap().width();
        let positions: Vec<Vec2> = canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawImage { sprite, at, .. } if sprite == "HPSEGMENT_SPRITE" => Some(*at),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![Vec2::new(8.0, 40.0), Vec2::new(8.0 + seg_w, 40.0)]);
        assert_eq!(canvas.texts(), vec!["8%"]);
        assert_eq!(stats.registry_misses, 0);
    }

    #[test]
    fn test_inventory_wheel() {
        let registry = ReferenceRegistry::with_default_assets();
        let mut canvas = RecordingCanvas::new(300.0, 600.0);
        let mut stats = FrameStats::default();
        let ammo = Ammunition {
            selected: 2,
            counts: vec![0, 0, 3],
            sprites: ["BULLET_SPRITE", "BULLET2_SPRITE", "BULLET3_SPRITE"]
                .iter()
                .map(|s| SpriteName::new(*s))
                .collect(),
        };
        draw_inventory(&mut canvas, &registry, &ammo, Vec2::new(300.0, 600.0), &mut stats);

        assert_eq!(canvas.texts(), vec!["3", "<-", "Infinite", "Infinite", "3", "Infinite"]);
        assert_eq!(canvas.images().len(), 5);
        assert_eq!(canvas.images()[0], "BULLET3_SPRITE");
        assert!(canvas
            .commands()
            .contains(&DrawCommand::Rotate(FRAC_PI_4)));
    }

    #[test]
    fn test_inventory_counts_missing_sprites() {
        let registry = ReferenceRegistry::new();
        let mut canvas = RecordingCanvas::new(300.0, 600.0);
        let mut stats = FrameStats::default();
        let ammo = Ammunition {
            selected: 0,
            counts: vec![0],
            sprites: vec![SpriteName::new("BULLET_SPRITE")],
        };
        draw_inventory(&mut canvas, &registry, &ammo, Vec2::new(300.0, 600.0), &mut stats);
        assert_eq!(stats.registry_misses, 5);
        assert_eq!(canvas.texts().len(), 6);
    }
}
