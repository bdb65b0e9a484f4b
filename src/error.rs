
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptoriumError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Source error: {0}")]
    Source(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, ScriptoriumError>;

// Helper conversions
impl From<rusqlite::Error> for ScriptoriumError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<config::ConfigError> for ScriptoriumError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for ScriptoriumError {
    fn from(e: serde_json::Error) -> Self { Self::DataCorruption { message: e.to_string() } }
}
impl From<std::io::Error> for ScriptoriumError {
    fn from(e: std::io::Error) -> Self { Self::Config(e.to_string()) }
}
