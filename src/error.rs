//! Error types for mission_viewer

use thiserror::Error;

/// Coarse failure classes surfaced to the view controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Decode,
    Parse,
    FactUnavailable,
    UnsupportedModel,
    Session,
    Other,
}

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Network error for {uri}: {reason}")]
    Network { uri: String, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Fact sheet unavailable for {0}")]
    FactUnavailable(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Invalid model identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Surface error: {0}")]
    Surface(#[from] crate::host::surface::SurfaceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session terminated; reload required")]
    SessionTerminated,
}

impl ViewerError {
    /// Build a network error for a request target
    pub fn network(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Decode(_) => FailureKind::Decode,
            Self::Parse(_) => FailureKind::Parse,
            Self::FactUnavailable(_) => FailureKind::FactUnavailable,
            Self::UnsupportedModel(_) => FailureKind::UnsupportedModel,
            Self::SessionTerminated => FailureKind::Session,
            _ => FailureKind::Other,
        }
    }
}

impl From<gltf::Error> for ViewerError {
    fn from(err: gltf::Error) -> Self {
        Self::Parse(format!("Failed to parse GLB: {err}"))
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;
