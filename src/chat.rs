//! Chat collaborator
//!
//! The chat box itself lives in the host. The session only hands it system
//! lines and player lines; formatting of the server notices happens here.

/// Shown instead of an empty player name
pub const UNNAMED_TANK: &str = "An unnamed tank";

pub trait ChatSink {
    fn add_system_line(&mut self, line: &str);
    fn add_chat_line(&mut self, sender: &str, message: &str);
}

/// Player event announced in the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Died,
    Joined,
    Disconnected,
}

impl Notice {
    fn verb(self) -> &'static str {
        match self {
            Notice::Died => "has died.",
            Notice::Joined => "joined.",
            Notice::Disconnected => "disconnected.",
        }
    }
}

pub fn display_name(name: &str) -> &str {
    if name.is_empty() {
        UNNAMED_TANK
    } else {
        name
    }
}

pub fn notice_line(notice: Notice, name: &str) -> String {
    format!("{{GAME}} - <b>{}</b> {}", display_name(name), notice.verb())
}

pub fn ping_line(latency_ms: u64) -> String {
    format!("Ping: {}ms", latency_ms)
}

pub const CONNECTED_LINES: [&str; 2] = [
    "Connected to the game!",
    "Type <b>-help</b> for a list of commands.",
];

/// One line a [`RecordingChat`] received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEntry {
    System(String),
    Player { sender: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingChat {
    entries: Vec<ChatEntry>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn system_lines(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                ChatEntry::System(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ChatSink for RecordingChat {
    fn add_system_line(&mut self, line: &str) {
        self.entries.push(ChatEntry::System(line.to_string()));
    }

    fn add_chat_line(&mut self, sender: &str, message: &str) {
        self.entries.push(ChatEntry::Player {
            sender: sender.to_string(),
            message: message.to_string(),
        });
    }
}

/// Chat sink that logs lines instead of showing them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChat;

impl ChatSink for LogChat {
    fn add_system_line(&mut self, line: &str) {
        tracing::info!("[chat] {}", line);
    }

    fn add_chat_line(&mut self, sender: &str, message: &str) {
        tracing::info!("[chat] {}: {}", sender, message);
    }
}
