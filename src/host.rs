//! What the session borrows from its front end each frame
//!
//! A front end owns the three drawing surfaces, the audio device and the chat
//! box. [`HeadlessHost`] records everything and is what the binary runs with.

use tracing::trace;

use crate::chat::{ChatSink, LogChat};
use crate::render::audio::{AudioSink, RecordingAudio};
use crate::render::canvas::{Canvas, RecordingCanvas, Surfaces};
use crate::util::vec2::Vec2;

/// Borrowed collaborators for one handler or frame
pub struct HostParts<'a> {
    pub surfaces: Surfaces<'a>,
    pub audio: &'a mut dyn AudioSink,
    pub chat: &'a mut dyn ChatSink,
}

pub trait Host {
    fn parts(&mut self) -> HostParts<'_>;

    /// Resize the world and inventory surfaces to the viewport
    fn resize(&mut self, viewport: Vec2);

    /// Called once a frame has been painted
    fn present(&mut self) {}
}

/// Front end with recording surfaces and a logging chat
pub struct HeadlessHost {
    pub world: RecordingCanvas,
    pub health: RecordingCanvas,
    pub inventory: RecordingCanvas,
    pub audio: RecordingAudio,
    pub chat: LogChat,
    frames_presented: u64,
}

impl HeadlessHost {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            world: RecordingCanvas::new(viewport.x, viewport.y),
            health: RecordingCanvas::new(500.0, 100.0),
            inventory: RecordingCanvas::new(300.0, viewport.y),
            audio: RecordingAudio::new(),
            chat: LogChat,
            frames_presented: 0,
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Host for HeadlessHost {
    fn parts(&mut self) -> HostParts<'_> {
        HostParts {
            surfaces: Surfaces {
                world: &mut self.world,
                health: &mut self.health,
                inventory: &mut self.inventory,
            },
            audio: &mut self.audio,
            chat: &mut self.chat,
        }
    }

    fn resize(&mut self, viewport: Vec2) {
        self.world.resize(viewport);
        self.inventory.resize(Vec2::new(self.inventory.size().x, viewport.y));
    }

    fn present(&mut self) {
        self.frames_presented += 1;
        let world = self.world.take_commands();
        let hud = self.health.take_commands().len() + self.inventory.take_commands().len();
        let audio = self.audio.take_commands();
        trace!(
            "Frame {}: {} world commands, {} hud commands, {} audio commands",
            self.frames_presented,
            world.len(),
            hud,
            audio.len()
        );
    }
}
