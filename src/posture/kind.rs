//! Posture kinds, removal reasons and command results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every posture the service knows about.
///
/// `Admin` is not a posture. It only exists so the permission tables can be
/// keyed uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureKind {
    Crawl,
    Sit,
    Chair,
    Lay,
    Belly,
    Admin,
}

impl PostureKind {
    /// Kinds that are realised by riding an actuator.
    pub const SEATED: [PostureKind; 4] = [Self::Sit, Self::Chair, Self::Lay, Self::Belly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Sit => "sit",
            Self::Chair => "chair",
            Self::Lay => "lay",
            Self::Belly => "belly",
            Self::Admin => "admin",
        }
    }

    /// Check if this kind is backed by a seat actuator.
    pub fn is_seated(&self) -> bool {
        matches!(self, Self::Sit | Self::Chair | Self::Lay | Self::Belly)
    }

    pub fn start_message(&self) -> Message {
        match self {
            Self::Crawl => Message::new("posture.crawl.on"),
            Self::Sit => Message::new("posture.sit.start"),
            Self::Chair => Message::new("posture.chair.start"),
            Self::Lay => Message::new("posture.lay.start"),
            Self::Belly => Message::new("posture.belly.start"),
            Self::Admin => Message::empty(),
        }
    }

    pub fn stop_message(&self) -> Message {
        match self {
            Self::Crawl => Message::new("posture.crawl.off"),
            Self::Sit => Message::new("posture.sit.stop"),
            Self::Chair => Message::new("posture.chair.stop"),
            Self::Lay => Message::new("posture.lay.stop"),
            Self::Belly => Message::new("posture.belly.stop"),
            Self::Admin => Message::empty(),
        }
    }
}

impl fmt::Display for PostureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a posture was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    Command,
    Damage,
    Move,
    Danger,
    Teleport,
    WorldChange,
    Disconnect,
    Death,
    Disabled,
    Replaced,
    Orphaned,
    Unknown,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Damage => "damage",
            Self::Move => "move",
            Self::Danger => "danger",
            Self::Teleport => "teleport",
            Self::WorldChange => "world_change",
            Self::Disconnect => "disconnect",
            Self::Death => "death",
            Self::Disabled => "disabled",
            Self::Replaced => "replaced",
            Self::Orphaned => "orphaned",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested crawl transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlToggle {
    Enable,
    Disable,
    Toggle,
}

impl CrawlToggle {
    /// Parse a command argument. Unknown words toggle.
    pub fn from_argument(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "on" | "enable" | "start" => Self::Enable,
            "off" | "disable" | "stop" => Self::Disable,
            _ => Self::Toggle,
        }
    }

    /// Resolve the target crawl state given the current one.
    pub fn target(&self, currently: bool) -> bool {
        match self {
            Self::Enable => true,
            Self::Disable => false,
            Self::Toggle => !currently,
        }
    }
}

/// A translatable, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Translation key
    pub key: &'static str,

    /// Positional arguments for the translation
    pub args: Vec<String>,
}

impl Message {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn disabled() -> Self {
        Self::new("posture.cmd.disabled")
    }

    pub fn no_permission() -> Self {
        Self::new("posture.cmd.no_permission")
    }

    /// Cooldown rejection with the remaining seconds to one decimal place.
    pub fn cooldown(remaining_secs: f64) -> Self {
        Self::new("posture.cmd.cooldown").with_arg(format!("{:.1}", remaining_secs))
    }

    pub fn reloaded() -> Self {
        Self::new("posture.cmd.reloaded")
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key)?;
        if !self.args.is_empty() {
            write!(f, " [{}]", self.args.join(", "))?;
        }
        Ok(())
    }
}

/// Outcome of a posture command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostureResult {
    pub success: bool,
    pub message: Message,
}

impl PostureResult {
    pub fn ok(message: Message) -> Self {
        Self {
            success: true,
            message,
        }
    }

    pub fn error(message: Message) -> Self {
        Self {
            success: false,
            message,
        }
    }
}
