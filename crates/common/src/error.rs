//! Error types shared across framedoc crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for framedoc operations.
#[derive(Debug, thiserror::Error)]
pub enum FramedocError {
    #[error("Invalid time {time_secs}s (valid range is 0..={duration_secs}s)")]
    InvalidTime { time_secs: f64, duration_secs: f64 },

    #[error("Capture unavailable: {message}")]
    CaptureUnavailable { message: String },

    #[error("Degenerate alignment: {message}")]
    AlignmentDegenerate { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Layout overflow: {message}")]
    LayoutOverflow { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FramedocError.
pub type FramedocResult<T> = Result<T, FramedocError>;

/// Machine-readable classification of a [`FramedocError`].
///
/// The glue layer matches on this to decide presentation; the
/// human-readable part comes from [`FramedocError::detail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTime,
    CaptureUnavailable,
    AlignmentDegenerate,
    Render,
    LayoutOverflow,
    Session,
    Config,
    FileNotFound,
    Unsupported,
    Io,
    Json,
    Other,
}

impl FramedocError {
    pub fn invalid_time(time_secs: f64, duration_secs: f64) -> Self {
        Self::InvalidTime {
            time_secs,
            duration_secs,
        }
    }

    pub fn capture_unavailable(msg: impl Into<String>) -> Self {
        Self::CaptureUnavailable {
            message: msg.into(),
        }
    }

    pub fn alignment_degenerate(msg: impl Into<String>) -> Self {
        Self::AlignmentDegenerate {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn layout_overflow(msg: impl Into<String>) -> Self {
        Self::LayoutOverflow {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTime { .. } => ErrorKind::InvalidTime,
            Self::CaptureUnavailable { .. } => ErrorKind::CaptureUnavailable,
            Self::AlignmentDegenerate { .. } => ErrorKind::AlignmentDegenerate,
            Self::Render { .. } => ErrorKind::Render,
            Self::LayoutOverflow { .. } => ErrorKind::LayoutOverflow,
            Self::Session { .. } => ErrorKind::Session,
            Self::Config { .. } => ErrorKind::Config,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Human-readable detail without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::CaptureUnavailable { message }
            | Self::AlignmentDegenerate { message }
            | Self::Render { message }
            | Self::LayoutOverflow { message }
            | Self::Session { message }
            | Self::Config { message }
            | Self::Unsupported { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the session can carry on after this error.
    ///
    /// Only layout-geometry and unexpected I/O failures are fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidTime
                | ErrorKind::CaptureUnavailable
                | ErrorKind::AlignmentDegenerate
                | ErrorKind::Render
        )
    }
}
