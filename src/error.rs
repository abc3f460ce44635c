//! Engine error types.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the rendering core.
#[derive(Error, Debug)]
pub enum GfxError {
    #[error("backend could not create {kind}: {reason}")]
    Creation { kind: &'static str, reason: String },

    #[error("graphics context has been torn down")]
    ContextLost,

    #[error("draw rejected: {0}")]
    Draw(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("window error: {0}")]
    Window(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}': {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
}

pub type Result<T> = std::result::Result<T, GfxError>;

impl GfxError {
    pub fn creation(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Creation {
            kind,
            reason: reason.into(),
        }
    }

    pub fn draw(msg: impl Into<String>) -> Self {
        Self::Draw(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn window(msg: impl Into<String>) -> Self {
        Self::Window(msg.into())
    }
}

/// A recorded, non-fatal problem (failed decode, skipped mesh, bad shader).
///
/// Managers and renderers keep these so callers can inspect what went wrong
/// without the failure aborting the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}
