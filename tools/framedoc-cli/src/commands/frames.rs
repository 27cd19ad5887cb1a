//! List the frames captured in a session.

use std::path::{Path, PathBuf};

use framedoc_capture_engine::{MediaSurface, SequenceSurface, StillSurface};
use framedoc_common::timecode::format_timestamp;
use framedoc_processing_core::{keyframe_times, SceneDetector};

use super::load_session;

/// What to print besides the frame list.
#[derive(Debug, Default)]
pub struct Sampling {
    /// Evenly spaced capture times to suggest.
    pub suggest: Option<usize>,
    /// Stills taken at evenly spaced times, checked for scene changes.
    pub scenes: Vec<PathBuf>,
    pub threshold: f64,
}

pub fn run(path: PathBuf, json: bool, sampling: Sampling) -> anyhow::Result<()> {
    let session = load_session(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session.frames)?);
        return Ok(());
    }

    println!("Frames ({}):", session.frames.len());
    for frame in &session.frames {
        println!(
            "  [{}] {} ({:.2}s) {}x{}",
            frame.id(),
            frame.label(),
            frame.time_secs(),
            frame.image().width,
            frame.image().height
        );
    }

    let duration = session.session.duration_secs();

    if let Some(count) = sampling.suggest {
        println!();
        match duration {
            Some(duration) => {
                println!("Suggested capture times:");
                for t in keyframe_times(duration, count) {
                    println!("  {} ({t:.2}s)", format_timestamp(t));
                }
            }
            None => println!("Video duration unknown; cannot suggest capture times."),
        }
    }

    if !sampling.scenes.is_empty() {
        let duration = duration
            .ok_or_else(|| anyhow::anyhow!("Video duration unknown; cannot place scene stills"))?;
        let changes = scene_changes(&sampling.scenes, duration, sampling.threshold)?;
        println!();
        if changes.is_empty() {
            println!("No scene changes found.");
        } else {
            println!("Scene changes (suggested capture times):");
            for t in changes {
                println!("  {} ({t:.2}s)", format_timestamp(t));
            }
        }
    }

    Ok(())
}

/// Lay `stills` out evenly over `[0, duration]` and return the times where
/// the picture changes.
fn scene_changes(stills: &[PathBuf], duration: f64, threshold: f64) -> anyhow::Result<Vec<f64>> {
    let mut sequence = SequenceSurface::new(Some(duration));
    for (path, time) in stills.iter().zip(keyframe_times(duration, stills.len())) {
        sequence.push(time, decode(path, duration)?);
    }
    tracing::debug!(stills = sequence.len(), threshold, "Detecting scene changes");
    Ok(SceneDetector::new(threshold).detect(sequence.frames()))
}

fn decode(path: &Path, duration: f64) -> anyhow::Result<framedoc_project_model::frame::RasterFrame> {
    let still = StillSurface::open(path, Some(duration))
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    still
        .snapshot()
        .ok_or_else(|| anyhow::anyhow!("No image in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_still(dir: &Path, name: &str, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_scene_changes_from_stills() {
        let dir = std::env::temp_dir().join(format!("framedoc_scenes_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let stills = vec![
            write_still(&dir, "a.png", 10),
            write_still(&dir, "b.png", 12),
            write_still(&dir, "c.png", 240),
        ];

        let changes = scene_changes(&stills, 30.0, 30.0).unwrap();
        assert_eq!(changes, vec![30.0]);

        let missing = vec![dir.join("missing.png")];
        assert!(scene_changes(&missing, 30.0, 30.0).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
