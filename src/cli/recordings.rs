use crate::app;
use crate::config::Config;
use crate::history::{self, ListParams, RecordingSummary};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};

use super::args::{RecordingsCliArgs, RecordingsCommand};

pub async fn handle_recordings_command(args: RecordingsCliArgs) -> Result<()> {
    let config = Config::load()?;
    let store = app::open_store(&config)?;

    match args.command {
        RecordingsCommand::List {
            alert_type,
            feed,
            limit,
        } => {
            let mut params = ListParams::new().with_limit(limit);
            if let Some(alert_type) = alert_type {
                params = params.with_alert_type(alert_type);
            }
            if let Some(feed) = feed {
                params = params.with_feed(feed);
            }
            let summaries = history::list(&store, &params).await?;

            if summaries.is_empty() {
                println!("No recordings found.");
                return Ok(());
            }

            println!("Found {} recording(s):\n", summaries.len());
            for summary in &summaries {
                print_summary(summary);
                println!("---");
            }
            println!("\nTo replay a recording, use: mamabear play <ID>");
        }
        RecordingsCommand::Show { id } => {
            let recording = history::require(&store, &id).await?;
            print_summary(&RecordingSummary::from(&recording));

            let audio_frames = recording.frames.iter().filter(|f| f.has_audio()).count();
            println!("Frames with audio: {}", audio_frames);
        }
        RecordingsCommand::Delete { id, yes } => {
            let recording = history::require(&store, &id).await?;

            if !yes {
                let theme = ColorfulTheme::default();
                let proceed = Confirm::with_theme(&theme)
                    .with_prompt(format!(
                        "Delete '{}' recording from {}?",
                        recording.alert_type,
                        history::format_timestamp(recording.timestamp)
                    ))
                    .default(false)
                    .interact()?;

                if !proceed {
                    println!("Delete cancelled.");
                    return Ok(());
                }
            }

            if history::delete(&store, &id).await? {
                println!("Deleted recording {}", id);
            } else {
                println!("Recording {} was already gone.", id);
            }
        }
        RecordingsCommand::Export { id, dir } => {
            let recording = history::require(&store, &id).await?;
            let summary = history::export(&recording, &dir)?;

            println!(
                "Exported {} frame(s) to {}",
                summary.frames_written,
                summary.dir.display()
            );
            match &summary.audio_file {
                Some(path) => println!("Audio: {}", path.display()),
                None => println!("Audio: none recorded"),
            }
            println!("Metadata: {}", summary.metadata_file.display());
        }
    }

    Ok(())
}

fn print_summary(summary: &RecordingSummary) {
    println!("ID: {}", summary.id);
    println!("Date: {}", summary.created_at);
    println!("Alert: {}", summary.alert_type);
    if let Some(feed) = &summary.feed {
        println!("Feed: {}", feed);
    }
    println!(
        "Frames: {} ({:.1}s)",
        summary.frame_count, summary.duration_secs
    );
    println!("Audio: {}", if summary.has_audio { "yes" } else { "no" });
}
