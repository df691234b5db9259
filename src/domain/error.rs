// Crate-wide error type

use std::path::PathBuf;

/// Errors surfaced by the model, the search engine and the plugin protocol
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for parameter {key}: {message}")]
    InvalidParameterValue { key: String, message: String },

    #[error("A plugin named '{0}' is already included")]
    DuplicatePlugin(String),

    #[error("Operation '{operation}' is not allowed in stage {stage}")]
    InvalidStage {
        operation: &'static str,
        stage: &'static str,
    },

    #[error("No {0} is included")]
    MissingPlugin(&'static str),

    #[error("Node selector '{selector}' returned node {node}, which is not open")]
    InvalidSelection { selector: String, node: u64 },

    #[error("Plugin '{plugin}': {message}")]
    Plugin { plugin: String, message: String },

    #[error("LP relaxation failed: {0}")]
    Relaxation(String),

    #[error("{}:{line}: {message}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidParameterValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
