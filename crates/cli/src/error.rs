use connectors::error::AdapterError;
use engine_config::error::SettingsError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Could not connect to {uri} after {attempts} attempt(s): {source}")]
    Connection {
        uri: String,
        attempts: u32,
        #[source]
        source: AdapterError,
    },

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Failed to run the transfer: {0}")]
    Run(#[from] RunError),

    #[error("Collection '{0}' does not exist in the source database")]
    UnknownCollection(String),

    #[error("Source and target are the same database; refusing to replace it with itself")]
    SameSourceAndTarget,

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
