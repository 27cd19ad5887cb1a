//! Assign a session's frames to its procedure steps.

use std::path::PathBuf;

use framedoc_processing_core::align_procedure;

use super::load_session;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let mut session = load_session(&path)?;
    let procedure = session
        .procedure
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No procedure attached; run `framedoc attach` first"))?;

    let aligned = align_procedure(procedure, &session.frames, session.session.duration_secs());

    println!("Aligned {} frame(s):", session.frames.len());
    for (i, step) in aligned.procedure.steps.iter().enumerate() {
        let labels: Vec<&str> = step.frames.iter().map(|f| f.label()).collect();
        println!("  {}. {} [{}]", i + 1, step.main, labels.join(", "));
    }
    if !aligned.unassigned.is_empty() {
        println!("  Unassigned: {}", aligned.unassigned.len());
    }
    if let Some(advisory) = aligned.advisory {
        tracing::warn!(?advisory, "Degenerate alignment");
        println!("\nNote: {}", advisory.describe());
    }

    session.procedure = Some(aligned.procedure);
    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;

    Ok(())
}
