//! Attach a generated procedure to a session.

use std::path::PathBuf;

use framedoc_project_model::procedure::parse_procedure;

use super::load_session;

pub fn run(path: PathBuf, procedure: PathBuf) -> anyhow::Result<()> {
    let mut session = load_session(&path)?;

    let json = std::fs::read_to_string(&procedure)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", procedure.display()))?;
    let parsed = parse_procedure(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse procedure: {e}"))?;

    println!("Attached procedure: {}", parsed.title);
    println!("  Steps: {}", parsed.steps.len());
    println!("  Prerequisites: {}", parsed.prerequisites.len());
    println!("  Troubleshooting items: {}", parsed.troubleshooting.len());
    if parsed.frame_count() > 0 {
        println!("  Frames already attached: {}", parsed.frame_count());
    }

    session.procedure = Some(parsed);
    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;

    Ok(())
}
