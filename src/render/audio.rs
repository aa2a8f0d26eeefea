//! Audio playback collaborator
//!
//! The core only decides which sound to play; the host plays it.

use crate::render::registry::Sound;

pub trait AudioSink {
    /// Play once from the start
    fn play(&mut self, sound: &Sound);
    /// Play on repeat until stopped
    fn play_looped(&mut self, sound: &Sound);
    /// Stop everything and rewind
    fn stop_all(&mut self);
}

/// What a [`RecordingAudio`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    Play(String),
    Loop(String),
    StopAll,
}

/// Audio sink that records requests instead of playing them
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    commands: Vec<AudioCommand>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Names played once, in order
    pub fn played(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                AudioCommand::Play(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: &Sound) {
        self.commands.push(AudioCommand::Play(sound.name().to_string()));
    }

    fn play_looped(&mut self, sound: &Sound) {
        self.commands.push(AudioCommand::Loop(sound.name().to_string()));
    }

    fn stop_all(&mut self) {
        self.commands.push(AudioCommand::StopAll);
    }
}

/// Sink that drops every request
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _sound: &Sound) {}
    fn play_looped(&mut self, _sound: &Sound) {}
    fn stop_all(&mut self) {}
}
