use std::path::PathBuf;

use framedoc_capture_engine::{CaptureConfig, FrameCapturer, SequenceSurface, TimelineStore};
use framedoc_project_model::frame::RasterFrame;
use framedoc_project_model::{LoadedSession, VideoRef};

fn session_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("framedoc_it_{name}_{}", std::process::id()))
}

fn playback() -> SequenceSurface {
    let mut surface = SequenceSurface::new(Some(60.0));
    surface.push(0.0, RasterFrame::solid(32, 18, [10, 20, 30, 255]));
    surface.push(20.0, RasterFrame::solid(32, 18, [200, 20, 30, 255]));
    surface.push(40.0, RasterFrame::solid(32, 18, [10, 200, 30, 255]));
    surface
}

#[test]
fn captured_frames_survive_a_save_and_reload() {
    let dir = session_dir("roundtrip");
    let _ = std::fs::remove_dir_all(&dir);

    let mut session = LoadedSession::create(&dir, "Router reset").expect("session should be created");
    session.session.video = Some(VideoRef {
        path: "walkthrough.mp4".into(),
        duration_secs: 60.0,
    });

    let mut surface = playback();
    let capturer = FrameCapturer::new(CaptureConfig::default());
    let mut timeline = TimelineStore::from_frames(vec![], session.session.duration_secs());
    for t in [45.0, 5.0, 25.0] {
        surface.seek(t).expect("time within the video");
        let frame = capturer.capture_now(&surface).expect("frame should be ready");
        timeline.insert(frame).expect("frame within the video");
    }
    session.frames = timeline.into_frames();
    session.save().expect("session should save");

    let reloaded = LoadedSession::load(&dir).expect("session should reload");
    let times: Vec<f64> = reloaded.frames.iter().map(|f| f.time_secs()).collect();
    assert_eq!(times, vec![5.0, 25.0, 45.0]);
    assert_eq!(reloaded.frames[1].label(), "00:00:25");
    assert_eq!(reloaded.frames[1].image().width, 32);
    assert_eq!(reloaded.frames[1].image().height, 18);
    for (before, after) in session.frames.iter().zip(&reloaded.frames) {
        assert_eq!(before.id(), after.id());
        assert_eq!(before.image().bytes, after.image().bytes);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn shrinking_the_duration_drops_late_frames() {
    let mut surface = playback();
    let capturer = FrameCapturer::default();
    let mut timeline = TimelineStore::with_duration(60.0);
    for t in [10.0, 50.0] {
        surface.seek(t).expect("time within the video");
        timeline
            .insert(capturer.capture_now(&surface).expect("frame should be ready"))
            .expect("frame within the video");
    }

    let dropped = timeline.set_duration(30.0);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].time_secs(), 50.0);
    assert_eq!(timeline.len(), 1);
}
