pub mod event_buffer;
pub mod framing;
pub mod game_session;
pub mod protocol;
pub mod session;

// Length-prefixed JSON over TCP
#[cfg(feature = "transport")]
pub mod transport;
