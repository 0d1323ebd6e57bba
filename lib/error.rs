//! Error types for mtb-env.

use std::path::PathBuf;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result type for mtb-env operations.
pub type MtbResult<T> = Result<T, MtbError>;

/// Error type for mtb-env operations.
#[derive(Debug, Error)]
pub enum MtbError {
    /// A single `.mtb` line could not be parsed.
    #[error("Invalid asset line '{line}': {reason}")]
    InvalidAssetLine { line: String, reason: String },

    /// One or more `.mtb` files in a project were malformed.
    #[error("Malformed asset files:\n{}", .errors.join("\n"))]
    MalformedAssets { errors: Vec<String> },

    /// The dependencies directory could not be created.
    #[error("Cannot create dependencies directory {path}: {source}")]
    DepsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest document did not have the expected shape.
    #[error("Invalid manifest {uri}: {reason}")]
    ManifestSchema { uri: String, reason: String },

    /// A manifest document could not be fetched.
    #[error("Failed to fetch manifest {uri}: {reason}")]
    ManifestFetch { uri: String, reason: String },

    /// No ModusToolbox tools directory could be located.
    #[error("No ModusToolbox tools directory found")]
    ToolsDirNotFound,

    /// A load is already in progress.
    #[error("Environment is already loading")]
    AlreadyLoading,

    /// A subsystem state change that is not allowed.
    #[error("Invalid load state transition for {subsystem}: {from} -> {to}")]
    InvalidState {
        subsystem: String,
        from: String,
        to: String,
    },

    /// An external command exited with a failure code.
    #[error("Command '{command}' failed with exit code {code}")]
    Command {
        command: String,
        code: i32,
        output: Vec<String>,
    },

    /// Application information could not be determined.
    #[error("Application info error: {0}")]
    AppInfo(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// XML error.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Glob pattern error.
    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}
