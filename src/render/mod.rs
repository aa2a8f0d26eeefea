//! Rendering: surfaces, asset lookup, HUD, particles and the frame pipeline

pub mod audio;
pub mod canvas;
pub mod hud;
pub mod particles;
pub mod pipeline;
pub mod registry;

pub use audio::{AudioSink, RecordingAudio, SilentAudio};
pub use canvas::{Canvas, RecordingCanvas, Surfaces};
pub use pipeline::{FrameStats, RenderPipeline};
pub use registry::ReferenceRegistry;
