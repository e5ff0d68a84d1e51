use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Reasons a workflow action is refused before anything reaches the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No active session to run the workflow in")]
    NoSession,

    #[error("Not connected to the session server")]
    Disconnected,

    #[error("Invalid story id '{0}': expected <epic>-<story> optionally followed by -<slug>")]
    InvalidStoryId(String),

    #[error("Invalid epic number '{0}': expected a positive integer")]
    InvalidEpicNumber(String),

    #[error("Workflow '{0}' is not allowed here")]
    WorkflowNotAllowed(String),
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write message: {0}")]
    Io(#[from] std::io::Error),
}
