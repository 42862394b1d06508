use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mamabear")]
#[command(about = "Baby monitor alert recorder", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Browse and manage saved alert recordings
    Recordings(RecordingsCliArgs),
    /// Replay a saved recording in the terminal
    Play(PlayCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RecordingsCliArgs {
    #[command(subcommand)]
    pub command: RecordingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum RecordingsCommand {
    /// List saved recordings, newest first
    List {
        /// Only show recordings whose alert type contains this text
        #[arg(short, long)]
        alert_type: Option<String>,
        /// Only show recordings from this feed
        #[arg(short, long)]
        feed: Option<String>,
        /// Maximum number of results to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show details of one recording
    Show {
        /// Recording ID
        id: String,
    },
    /// Delete a recording
    Delete {
        /// Recording ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Write a recording's frames, audio and metadata to a directory
    Export {
        /// Recording ID
        id: String,
        /// Output directory
        dir: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
pub struct PlayCliArgs {
    /// Recording ID (pick interactively when omitted)
    pub id: Option<String>,
    /// Playback rate in frames per second (default from config)
    #[arg(long)]
    pub fps: Option<u32>,
}
