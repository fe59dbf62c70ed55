// src/config/mod.rs
pub mod io;
pub mod types;

pub use self::types::{
    default_skip_dirs, default_tool_map, AppSettingsFile, Config, Settings, ToolDefinition,
    ToolMap,
};

use std::path::Path;
use tracing::{debug, warn};

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the current working directory.
    #[must_use]
    pub fn load() -> Self {
        Self::load_in(Path::new("."))
    }

    /// Loads configuration from the first config file found in `dir`.
    ///
    /// Never fails: unreadable files and invalid sections fall back to
    /// defaults and are recorded in `diagnostics`.
    #[must_use]
    pub fn load_in(dir: &Path) -> Self {
        let mut config = Self::new();
        let Some(path) = io::find_config_file(dir) else {
            debug!("no config file in {}, using defaults", dir.display());
            return config;
        };

        match io::read_document(&path) {
            Ok(doc) => {
                io::apply_document(&mut config, &doc);
                config.source = Some(path);
            }
            Err(e) => {
                let message = format!("Failed to load {}: {e:#}. Skipping.", path.display());
                warn!("{message}");
                config.diagnostics.push(message);
            }
        }
        config
    }

    /// Tools configured for a language key, in configured order.
    #[must_use]
    pub fn tools_for(&self, lang_key: &str) -> &[ToolDefinition] {
        self.tools.get(lang_key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Language keys that have at least one configured tool.
    pub fn supported_languages(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }
}
