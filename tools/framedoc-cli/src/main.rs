//! framedoc CLI: capture frames from a video, bin them into procedure steps,
//! and export the result as a document.
//!
//! Usage:
//!   framedoc init <NAME> [OPTIONS]        Create a new session bundle
//!   framedoc capture <PATH> --image <F>   Capture a frame at a playback time
//!   framedoc remove <PATH> <ID>           Remove a captured frame
//!   framedoc frames <PATH>                List captured frames
//!   framedoc attach <PATH> <PROCEDURE>    Attach a generated procedure
//!   framedoc align <PATH>                 Assign frames to procedure steps
//!   framedoc export <PATH> [OPTIONS]      Export the procedure document
//!   framedoc info <PATH>                  Show session information
//!   framedoc validate <PATH>              Validate a session bundle
//!   framedoc config                       Show or create the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "framedoc",
    about = "Turn a video walkthrough into an illustrated step-by-step document",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new session bundle
    Init {
        /// Session name
        name: String,

        /// Output directory (defaults to the configured sessions directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source video path
        #[arg(long)]
        video: Option<String>,

        /// Video duration in seconds or HH:MM:SS
        #[arg(long)]
        duration: Option<String>,
    },

    /// Capture a frame from an image of the paused video
    Capture {
        /// Path to the session directory
        path: PathBuf,

        /// Image file showing the frame on screen
        #[arg(short, long)]
        image: PathBuf,

        /// Playback time in seconds or HH:MM:SS
        #[arg(short, long)]
        at: String,

        /// Store frames as PNG instead of JPEG
        #[arg(long)]
        png: bool,
    },

    /// Remove a captured frame
    Remove {
        /// Path to the session directory
        path: PathBuf,

        /// Frame id (as shown by `framedoc frames`)
        id: u64,
    },

    /// List captured frames
    Frames {
        /// Path to the session directory
        path: PathBuf,

        /// Print the frame list as JSON
        #[arg(long)]
        json: bool,

        /// Also print N evenly spaced capture times over the video
        #[arg(long)]
        suggest: Option<usize>,

        /// Stills spread evenly over the video; print where the scene changes
        #[arg(long, num_args = 1..)]
        scenes: Vec<PathBuf>,

        /// Mean grayscale difference (0-255) that counts as a scene change
        #[arg(long, default_value_t = 30.0)]
        threshold: f64,
    },

    /// Attach a procedure JSON produced by the generator
    Attach {
        /// Path to the session directory
        path: PathBuf,

        /// Procedure JSON file
        procedure: PathBuf,
    },

    /// Assign captured frames to procedure steps by time
    Align {
        /// Path to the session directory
        path: PathBuf,
    },

    /// Export the procedure document
    Export {
        /// Path to the session directory
        path: PathBuf,

        /// Output directory (defaults to the session's exports/)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: pdf|docx|txt
        #[arg(long)]
        format: Option<String>,

        /// Image scale percentage (10-100)
        #[arg(long)]
        image_scale: Option<u8>,

        /// Source image size class: small|medium|large
        #[arg(long)]
        image_size: Option<String>,

        /// Page size preset: a4|letter
        #[arg(long)]
        page_size: Option<String>,

        /// Leave frames out of the document
        #[arg(long)]
        no_frames: bool,

        /// Leave the token usage section out of the document
        #[arg(long)]
        no_usage: bool,
    },

    /// Show session information
    Info {
        /// Path to the session directory
        path: PathBuf,
    },

    /// Validate a session bundle
    Validate {
        /// Path to the session directory
        path: PathBuf,
    },

    /// Show the config file, or write one with defaults
    Config {
        /// Write the default config if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let mut logging = framedoc_common::config::AppConfig::load().logging;
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    framedoc_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            video,
            duration,
        } => commands::init::run(name, output, video, duration),
        Commands::Capture {
            path,
            image,
            at,
            png,
        } => commands::capture::run(path, image, at, png),
        Commands::Remove { path, id } => commands::remove::run(path, id),
        Commands::Frames {
            path,
            json,
            suggest,
            scenes,
            threshold,
        } => commands::frames::run(
            path,
            json,
            commands::frames::Sampling {
                suggest,
                scenes,
                threshold,
            },
        ),
        Commands::Attach { path, procedure } => commands::attach::run(path, procedure),
        Commands::Align { path } => commands::align::run(path),
        Commands::Export {
            path,
            output,
            format,
            image_scale,
            image_size,
            page_size,
            no_frames,
            no_usage,
        } => commands::export::run(
            path,
            output,
            commands::export::Overrides {
                format,
                image_scale,
                image_size,
                page_size,
                include_frames: !no_frames,
                include_token_usage: !no_usage,
            },
        ),
        Commands::Info { path } => commands::info::run(path),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Config { init } => commands::config::run(init),
    }
}
