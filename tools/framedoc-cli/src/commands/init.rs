//! Initialize a new framedoc session.

use std::path::PathBuf;

use framedoc_common::config::AppConfig;
use framedoc_project_model::{LoadedSession, VideoRef};

use super::{options_from_defaults, parse_time};

pub fn run(
    name: String,
    output: Option<PathBuf>,
    video: Option<String>,
    duration: Option<String>,
) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let session_dir = output.unwrap_or(config.sessions_dir.clone()).join(&name);
    println!("Creating session '{}' at {}", name, session_dir.display());

    let duration_secs = duration.as_deref().map(parse_time).transpose()?;
    let export = options_from_defaults(&config.export)?;

    let mut session = LoadedSession::create(&session_dir, &name)
        .map_err(|e| anyhow::anyhow!("Failed to create session: {e}"))?;
    session.session.export = export;
    if let Some(path) = video {
        session.session.video = Some(VideoRef {
            path,
            duration_secs: duration_secs.unwrap_or(0.0),
        });
    }
    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;

    println!("Session created successfully:");
    println!("  Directory: {}", session.root.display());
    match &session.session.video {
        Some(v) if v.duration_secs > 0.0 => println!("  Video: {} ({:.1}s)", v.path, v.duration_secs),
        Some(v) => println!("  Video: {} (duration unknown)", v.path),
        None => println!("  Video: none"),
    }
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── meta/        (session.json, frames.json, procedure.json)");
    println!("  └── exports/     (rendered documents)");

    Ok(())
}
