pub mod loader;
pub mod preferences;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use preferences::{Preferences, PreferencesStore, Theme};
pub use schema::{Config, DEFAULT_RELEASE_FEED_URL};
