//! Session bundle: one video, its captured frames, and its procedure.
//!
//! On disk a session is a directory:
//!
//! ```text
//! <root>/
//!   meta/session.json     name, ids, video reference, export options
//!   meta/frames.json      captured frames (images as data URLs)
//!   meta/procedure.json   generated procedure (optional)
//!   exports/              rendered documents
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::{parse_frames, FrameCapture};
use crate::options::ExportOptions;
use crate::procedure::{parse_procedure, Procedure};

/// Top-level session file (`session.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Schema version.
    pub version: String,

    /// Human-readable session name.
    pub name: String,

    /// Unique session identifier.
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// The annotated video, once known.
    #[serde(default)]
    pub video: Option<VideoRef>,

    /// Export settings.
    #[serde(default)]
    pub export: ExportOptions,
}

/// Reference to the source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRef {
    /// Path to the video file, relative to the session root or absolute.
    pub path: String,

    /// Duration in seconds (0 while metadata is unknown).
    #[serde(default)]
    pub duration_secs: f64,
}

impl Session {
    /// Create a new session with defaults.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: session_id(now),
            created_at: now.to_rfc3339(),
            modified_at: now.to_rfc3339(),
            video: None,
            export: ExportOptions::default(),
        }
    }

    /// Known video duration, if any.
    pub fn duration_secs(&self) -> Option<f64> {
        self.video
            .as_ref()
            .map(|v| v.duration_secs)
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// The complete in-memory representation of a loaded session.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// Filesystem path to the session directory.
    pub root: PathBuf,

    /// Session metadata.
    pub session: Session,

    /// Captured frames in timeline order.
    pub frames: Vec<FrameCapture>,

    /// Generated procedure, once attached.
    pub procedure: Option<Procedure>,
}

impl LoadedSession {
    /// Load a session from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, SessionError> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join("meta");

        let session_path = meta.join("session.json");
        let session_json = read(&session_path)?;
        let session: Session =
            serde_json::from_str(&session_json).map_err(|e| SessionError::ParseError {
                path: session_path,
                source: e,
            })?;

        let frames_path = meta.join("frames.json");
        let frames = if frames_path.exists() {
            let json = read(&frames_path)?;
            parse_frames(&json).map_err(|e| SessionError::ParseError {
                path: frames_path,
                source: e,
            })?
        } else {
            vec![]
        };

        let procedure_path = meta.join("procedure.json");
        let procedure = if procedure_path.exists() {
            let json = read(&procedure_path)?;
            Some(
                parse_procedure(&json).map_err(|e| SessionError::ParseError {
                    path: procedure_path,
                    source: e,
                })?,
            )
        } else {
            None
        };

        tracing::debug!(
            root = %root.display(),
            frames = frames.len(),
            has_procedure = procedure.is_some(),
            "Loaded session"
        );

        Ok(Self {
            root,
            session,
            frames,
            procedure,
        })
    }

    /// Save session, frames, and procedure to disk.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let meta = self.root.join("meta");
        std::fs::create_dir_all(&meta).map_err(|e| SessionError::IoError {
            path: meta.clone(),
            source: e,
        })?;

        self.session.modified_at = chrono::Utc::now().to_rfc3339();
        write_json(&meta.join("session.json"), &self.session)?;
        write_json(&meta.join("frames.json"), &self.frames)?;

        let procedure_path = meta.join("procedure.json");
        match &self.procedure {
            Some(procedure) => write_json(&procedure_path, procedure)?,
            None if procedure_path.exists() => {
                std::fs::remove_file(&procedure_path).map_err(|e| SessionError::IoError {
                    path: procedure_path,
                    source: e,
                })?
            }
            None => {}
        }
        Ok(())
    }

    /// Create a new session on disk with the standard directory structure.
    pub fn create(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, SessionError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["meta", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| SessionError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let mut loaded = Self {
            root,
            session: Session::new(name),
            frames: vec![],
            procedure: None,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Default directory for rendered documents.
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Check the bundle for problems; returns human-readable findings.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        match &self.session.video {
            Some(video) => {
                let path = self.root.join(&video.path);
                if !path.exists() {
                    errors.push(format!("Video source missing: {}", video.path));
                }
            }
            None => errors.push("No video attached".to_string()),
        }

        if let Some(duration) = self.session.duration_secs() {
            for frame in &self.frames {
                if frame.time_secs() < 0.0 || frame.time_secs() > duration {
                    errors.push(format!(
                        "Frame {} at {:.2}s is outside the video duration ({duration:.2}s)",
                        frame.id(),
                        frame.time_secs()
                    ));
                }
            }
        }

        if self
            .frames
            .windows(2)
            .any(|pair| pair[0].time_secs() > pair[1].time_secs())
        {
            errors.push("Frames are not in timeline order".to_string());
        }

        if let Err(e) = self.session.export.geometry.validate() {
            errors.push(format!("Export geometry: {}", e.detail()));
        }

        errors
    }
}

/// Errors that can occur when working with session bundles.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid session: {message}")]
    ValidationError { message: String },
}

impl From<SessionError> for framedoc_common::FramedocError {
    fn from(err: SessionError) -> Self {
        framedoc_common::FramedocError::session(err.to_string())
    }
}

fn read(path: &Path) -> Result<String, SessionError> {
    std::fs::read_to_string(path).map_err(|e| SessionError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SessionError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| SessionError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| SessionError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Time-derived session identifier, formatted like a v4 UUID.
fn session_id(now: chrono::DateTime<chrono::Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_default() as u128;
    let seed = nanos ^ ((std::process::id() as u128) << 64);
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFF_FFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3FFF) | 0x8000) as u16,
        (seed >> 64) & 0xFFFF_FFFF_FFFF,
    )
}
