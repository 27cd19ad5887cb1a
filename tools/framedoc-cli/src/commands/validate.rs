//! Validate a framedoc session bundle.

use std::path::PathBuf;

use super::load_session;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating session at: {}", path.display());

    let session = load_session(&path)?;

    println!("  Name: {}", session.session.name);
    println!("  Version: {}", session.session.version);
    println!("  Frames: {}", session.frames.len());
    println!(
        "  Procedure: {}",
        if session.procedure.is_some() {
            "attached"
        } else {
            "none"
        }
    );

    let errors = session.validate();
    if errors.is_empty() {
        println!("\nSession is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Session may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}
