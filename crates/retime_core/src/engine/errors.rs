//! Error types reported by engine implementations.

use std::io;

use thiserror::Error;

/// Error from a single engine operation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation was issued before `initialize`.
    #[error("Engine '{0}' is not initialized")]
    NotInitialized(String),

    /// The engine executable could not be started.
    #[error("Required tool '{tool}' not available: {message}")]
    ToolNotFound { tool: String, message: String },

    /// An engine command ran and failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Working storage I/O failed.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// No file with this name exists in working storage.
    #[error("No staged file named '{0}'")]
    NotFound(String),

    /// The name cannot be used as a working storage key.
    #[error("Invalid staging name '{0}'")]
    InvalidName(String),

    /// The engine does not implement this operation.
    #[error("{0} is not supported by this engine")]
    Unsupported(&'static str),

    /// Generic engine error with message.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a tool-not-found error.
    pub fn tool_not_found(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolNotFound {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether the error only says the file was already gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::NotFound(_) => true,
            EngineError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
