//! Planet Tanks client core
//!
//! Headless client for the planet tanks game: keeps a local view of the
//! world from server events, turns keyboard and pointer input into intents,
//! and paints each frame through a pluggable 2D canvas.
//!
//! # Features
//!
//! - `transport` - TCP transport and the session driver loop (enabled by default)

pub mod chat;
pub mod config;
pub mod game;
pub mod host;
pub mod metrics;
pub mod net;
pub mod render;
pub mod util;
