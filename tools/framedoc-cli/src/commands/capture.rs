//! Capture a frame into a session's timeline.

use std::path::PathBuf;

use framedoc_capture_engine::{CaptureConfig, FrameCapturer, StillSurface, TimelineStore};
use framedoc_project_model::frame::ImageEncoding;

use super::{load_session, parse_time};

pub fn run(path: PathBuf, image: PathBuf, at: String, png: bool) -> anyhow::Result<()> {
    let mut session = load_session(&path)?;
    let time_secs = parse_time(&at)?;
    let duration = session.session.duration_secs();

    let mut surface = StillSurface::open(&image, duration)?;
    surface.seek(time_secs)?;

    let mut config = CaptureConfig::for_image_size(session.session.export.pdf_image_size);
    if png {
        config.encoding = ImageEncoding::Png;
    }
    let frame = FrameCapturer::new(config).capture_now(&surface)?;

    let mut timeline = TimelineStore::from_frames(std::mem::take(&mut session.frames), duration);
    timeline.insert(frame.clone())?;
    session.frames = timeline.into_frames();
    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;

    println!("Captured frame {} at {}", frame.id(), frame.label());
    println!(
        "  Image: {}x{} {:?} ({} bytes)",
        frame.image().width,
        frame.image().height,
        frame.image().encoding,
        frame.image().bytes.len()
    );
    println!("  Frames in session: {}", session.frames.len());

    Ok(())
}
