//! Show session information.

use std::path::PathBuf;

use super::load_session;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let session = load_session(&path)?;
    let s = &session.session;

    println!("Session: {}", s.name);
    println!("  ID: {}", s.id);
    println!("  Created: {}", s.created_at);
    println!("  Modified: {}", s.modified_at);
    println!();

    println!("Video:");
    match &s.video {
        Some(v) => match s.duration_secs() {
            Some(d) => println!("  {} ({d:.1}s)", v.path),
            None => println!("  {} (duration unknown)", v.path),
        },
        None => println!("  none"),
    }
    println!();

    println!("Frames: {}", session.frames.len());
    if let (Some(first), Some(last)) = (session.frames.first(), session.frames.last()) {
        println!("  Span: {} - {}", first.label(), last.label());
    }
    println!();

    println!("Procedure:");
    match &session.procedure {
        Some(p) => {
            println!("  Title: {}", p.title);
            println!("  Steps: {}", p.steps.len());
            println!("  Frames aligned: {}", p.frame_count());
            if let Some(usage) = &p.token_usage {
                println!(
                    "  Tokens: {} (${:.4})",
                    usage.total_tokens, usage.costs.total_cost
                );
            }
        }
        None => println!("  none attached"),
    }
    println!();

    let e = &s.export;
    println!("Export config:");
    println!("  Format: {}", e.format.extension());
    println!(
        "  Page: {:.0}x{:.0}mm, margin {:.0}mm",
        e.geometry.page_width, e.geometry.page_height, e.geometry.margin
    );
    println!(
        "  Images: {:?} source, {}% width",
        e.pdf_image_size,
        e.image_scale_percent()
    );

    Ok(())
}
