use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::persist::PersistenceMode;

/// Engine configuration, read from an optional `scriptorium` config file
/// merged with `SCRIPTORIUM_`-prefixed environment variables. API
/// credentials may also arrive through their conventional bare variables
/// (`ESV_API_KEY`, `SCRIPTURE_API_KEY`); a missing credential turns the
/// corresponding source into a no-op rather than an error.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the SQLite cache database; None keeps everything in memory.
    pub database: Option<String>,
    /// Base URL of the generic verse API.
    pub api_url: String,
    /// Per-request timeout for remote sources, in seconds.
    pub request_timeout: u64,
    /// Translation requested when the caller does not name one.
    pub default_translation: String,
    /// Clock face the chapter mapping follows: "12" or "24".
    pub time_format: String,
    /// Translations advertised to callers; the "random" sentinel draws
    /// uniformly from this list.
    pub translations: Vec<String>,
    /// Skip all remote sources; resolution then runs on cache and fallback
    /// content alone.
    pub offline: bool,
    /// Override path for the chapter/verse structure table.
    pub structure_file: Option<String>,
    /// Override path for the book summaries.
    pub summaries_file: Option<String>,
    pub esv_api_key: Option<String>,
    pub scripture_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            api_url: "https://bible-api.com".to_string(),
            request_timeout: 10,
            default_translation: "kjv".to_string(),
            time_format: "12".to_string(),
            translations: ["kjv", "web", "esv", "amp", "nlt", "msg", "nasb", "cev"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            offline: false,
            structure_file: None,
            summaries_file: None,
            esv_api_key: None,
            scripture_api_key: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("scriptorium").required(false))
            .add_source(Environment::with_prefix("SCRIPTORIUM").try_parsing(true))
            .build()?;
        let mut settings: Settings = config.try_deserialize()?;
        if settings.esv_api_key.is_none() {
            settings.esv_api_key = std::env::var("ESV_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if settings.scripture_api_key.is_none() {
            settings.scripture_api_key = std::env::var("SCRIPTURE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        Ok(settings)
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        match &self.database {
            Some(path) => PersistenceMode::File(path.clone()),
            None => PersistenceMode::InMemory,
        }
    }
}
