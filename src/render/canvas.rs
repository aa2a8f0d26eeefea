//! Drawing surface abstraction
//!
//! The client core never owns a real graphics context. It issues 2D
//! context-style calls through [`Canvas`]; a host can forward them to an
//! actual surface. [`RecordingCanvas`] keeps them as a command list for the
//! headless binary, tests and benches.

use crate::render::registry::Sprite;
use crate::util::vec2::Vec2;

/// Colour stop list of a radial gradient between two circles
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub inner_center: Vec2,
    pub inner_radius: f32,
    pub outer_center: Vec2,
    pub outer_radius: f32,
    /// `(offset in [0, 1], css colour)`
    pub stops: Vec<(f32, String)>,
}

impl RadialGradient {
    pub fn new(center: Vec2, inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            inner_center: center,
            inner_radius,
            outer_center: center,
            outer_radius,
            stops: Vec::new(),
        }
    }

    pub fn add_stop(&mut self, offset: f32, color: impl Into<String>) {
        self.stops.push((offset.clamp(0.0, 1.0), color.into()));
    }
}

/// Fill or stroke style
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(String),
    Radial(RadialGradient),
}

impl Paint {
    pub fn color(css: impl Into<String>) -> Self {
        Paint::Color(css.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
}

/// Immediate-mode 2D drawing surface
pub trait Canvas {
    fn size(&self) -> Vec2;
    fn resize(&mut self, size: Vec2);

    fn save(&mut self);
    fn restore(&mut self);
    fn reset_transform(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, radians: f32);

    fn set_fill(&mut self, paint: Paint);
    fn set_stroke(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);
    fn set_line_dash(&mut self, segments: &[f32]);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn clear_rect(&mut self, origin: Vec2, size: Vec2);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2);
    fn fill_text(&mut self, text: &str, at: Vec2);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Vec2);
    fn line_to(&mut self, p: Vec2);
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn fill(&mut self);

    /// Draw `sprite` with its top-left corner at `at`, at natural size times `scale`
    fn draw_image(&mut self, sprite: &Sprite, at: Vec2, scale: f32);

    /// Draw `sprite` centred on `center`, rotated by `radians`
    fn draw_rotated(&mut self, sprite: &Sprite, center: Vec2, radians: f32) {
        self.save();
        self.translate(center);
        self.rotate(radians);
        self.translate(-sprite.size() * 0.5);
        self.draw_image(sprite, Vec2::ZERO, 1.0);
        self.restore();
    }

    /// Clear the whole surface
    fn clear(&mut self) {
        let size = self.size();
        self.clear_rect(Vec2::ZERO, size);
    }
}

/// One recorded canvas call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    ResetTransform,
    Translate(Vec2),
    Rotate(f32),
    SetFill(Paint),
    SetStroke(Paint),
    SetLineWidth(f32),
    SetLineDash(Vec<f32>),
    SetFont(String),
    SetTextAlign(TextAlign),
    ClearRect { origin: Vec2, size: Vec2 },
    FillRect { origin: Vec2, size: Vec2 },
    FillText { text: String, at: Vec2 },
    BeginPath,
    MoveTo(Vec2),
    LineTo(Vec2),
    ClosePath,
    Stroke,
    Fill,
    DrawImage { sprite: String, at: Vec2, scale: f32 },
}

/// Canvas that records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the list empty
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sprite names drawn, in order
    pub fn images(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawImage { sprite, .. } => Some(sprite.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn set_fill(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::SetFill(paint));
    }

    fn set_stroke(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::SetStroke(paint));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::SetLineWidth(width));
    }

    fn set_line_dash(&mut self, segments: &[f32]) {
        self.commands.push(DrawCommand::SetLineDash(segments.to_vec()));
    }

    fn set_font(&mut self, font: &str) {
        self.commands.push(DrawCommand::SetFont(font.to_string()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.commands.push(DrawCommand::SetTextAlign(align));
    }

    fn clear_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::ClearRect { origin, size });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::FillRect { origin, size });
    }

    fn fill_text(&mut self, text: &str, at: Vec2) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
        });
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn draw_image(&mut self, sprite: &Sprite, at: Vec2, scale: f32) {
        self.commands.push(DrawCommand::DrawImage {
            sprite: sprite.name().to_string(),
            at,
            scale,
        });
    }
}

/// The three surfaces a frame paints
pub struct Surfaces<'a> {
    pub world: &'a mut dyn Canvas,
    pub health: &'a mut dyn Canvas,
    pub inventory: &'a mut dyn Canvas,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_rotated_brackets_with_save_restore() {
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        let sprite = Sprite::new("TURRET1_SPRITE", 20.0, 10.0);
        canvas.draw_rotated(&sprite, Vec2::new(50.0, 50.0), 1.0);

        assert_eq!(
            canvas.commands(),
            &[
                DrawCommand::Save,
                DrawCommand::Translate(Vec2::new(50.0, 50.0)),
                DrawCommand::Rotate(1.0),
                DrawCommand::Translate(Vec2::new(-10.0, -5.0)),
                DrawCommand::DrawImage {
                    sprite: "TURRET1_SPRITE".to_string(),
                    at: Vec2::ZERO,
                    scale: 1.0
                },
                DrawCommand::Restore,
            ]
        );
    }

    #[test]
    fn test_clear_uses_canvas_size() {
        let mut canvas = RecordingCanvas::new(640.0, 480.0);
        canvas.clear();
        assert_eq!(
            canvas.commands(),
            &[DrawCommand::ClearRect {
                origin: Vec2::ZERO,
                size: Vec2::new(640.0, 480.0)
            }]
        );
    }

    #[test]
    fn test_gradient_stops_clamped() {
        let mut g = RadialGradient::new(Vec2::ZERO, 1.0, 2.0);
        g.add_stop(-0.5, "yellow");
        g.add_stop(1.5, "grey");
        assert_eq!(g.stops[0].0, 0.0);
        assert_eq!(g.stops[1].0, 1.0);
    }

    #[test]
    fn test_recording_helpers() {
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        canvas.fill_text("hi", Vec2::ZERO);
        canvas.draw_image(&Sprite::new("A", 1.0, 1.0), Vec2::ZERO, 1.0);
        assert_eq!(canvas.texts(), vec!["hi"]);
        assert_eq!(canvas.images(), vec!["A"]);
        assert_eq!(canvas.take_commands().len(), 2);
        assert!(canvas.is_empty());
    }
}
