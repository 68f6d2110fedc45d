//! Configuration schema and file discovery.

pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config, set_config_dir},
    schema::{AvatarsConfig, ChatbridgeConfig, NotificationsConfig, SearchConfig},
};
