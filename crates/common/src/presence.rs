use serde::{Deserialize, Serialize};

/// A peer's availability state as reported by the remote application's
/// `show` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Away,
    Dnd,
    Offline,
    Invisible,
    ExtendedAway,
    #[default]
    Unknown,
}

impl Presence {
    /// Parse the wire `show` value. Unrecognized values map to `Unknown`.
    pub fn from_show(show: &str) -> Self {
        match show {
            "online" | "chat" => Self::Online,
            "away" => Self::Away,
            "dnd" => Self::Dnd,
            "offline" => Self::Offline,
            "invisible" => Self::Invisible,
            "xa" => Self::ExtendedAway,
            _ => Self::Unknown,
        }
    }

    /// Standard status icon name for the secondary notification icon.
    pub fn icon_name(self) -> &'static str {
        match self {
            Self::Online => "user-available",
            Self::Away => "user-away",
            Self::Dnd => "user-busy",
            // Everything else renders as offline, including unknown states.
            Self::Offline | Self::Invisible | Self::ExtendedAway | Self::Unknown => "user-offline",
        }
    }
}
