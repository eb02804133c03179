use std::path::PathBuf;
use thiserror::Error;

/// Result type for volley operations
pub type Result<T> = std::result::Result<T, PongError>;

/// Main error type for the volley crate
#[derive(Debug, Error)]
pub enum PongError {
    /// Sampling asked for more transitions than the replay memory holds
    #[error("Insufficient data: requested {requested} transitions, only {available} stored")]
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// No checkpoint exists under the given name or path
    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    /// A checkpoint exists but cannot be decoded or does not fit the agent
    #[error("Checkpoint corrupt at {}: {reason}", .path.display())]
    CheckpointCorrupt {
        path: PathBuf,
        reason: String,
    },

    /// Action index outside the discrete action set
    #[error("Invalid action {action}: must be less than {max_actions}")]
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for PongError {
    fn from(err: bincode::Error) -> Self {
        PongError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for PongError {
    fn from(err: serde_json::Error) -> Self {
        PongError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl PongError {
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        PongError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn corrupt<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        PongError::CheckpointCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether a resume attempt failed because the checkpoint is simply absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, PongError::CheckpointNotFound(_))
    }
}
