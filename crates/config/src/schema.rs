use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbridgeConfig {
    pub notifications: NotificationsConfig,
    pub avatars: AvatarsConfig,
    pub search: SearchConfig,
}

/// Notification behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Quiet period before a burst of inbound messages produces one notify.
    pub debounce_ms: u64,
    /// Mark session notifications urgent.
    pub urgent: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            urgent: true,
        }
    }
}

/// Avatar cache location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarsConfig {
    /// Override for the cache directory. Defaults to
    /// `<user cache root>/chatbridge/avatars`.
    pub cache_dir: Option<PathBuf>,
}

impl AvatarsConfig {
    /// Resolve the effective cache directory.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        directories::BaseDirs::new()
            .map(|d| d.cache_dir().join("chatbridge").join("avatars"))
            .unwrap_or_else(|| PathBuf::from(".chatbridge-avatars"))
    }
}

/// Contact search behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Open an in-process session when a search result is activated,
    /// instead of asking the external application to open the chat.
    pub local_chat: bool,
}
