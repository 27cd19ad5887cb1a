//! Remove a captured frame.

use std::path::PathBuf;

use framedoc_capture_engine::TimelineStore;
use framedoc_project_model::frame::FrameId;

use super::load_session;

pub fn run(path: PathBuf, id: u64) -> anyhow::Result<()> {
    let mut session = load_session(&path)?;
    let duration = session.session.duration_secs();

    let mut timeline = TimelineStore::from_frames(std::mem::take(&mut session.frames), duration);
    let removed = timeline.remove_frame(FrameId(id));
    session.frames = timeline.into_frames();

    match removed {
        Some(frame) => {
            session
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
            println!("Removed frame {} at {}", frame.id(), frame.label());
        }
        None => println!("No frame with id {id}; nothing removed."),
    }
    println!("  Frames in session: {}", session.frames.len());

    Ok(())
}
