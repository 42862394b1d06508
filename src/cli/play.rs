use crate::app;
use crate::config::Config;
use crate::history::{self, ListParams, RecordingSummary};
use crate::playback::{FrameRenderer, NullAudioSink, PlaybackController};
use crate::recording::Frame;
use anyhow::{anyhow, Result};
use dialoguer::{theme::ColorfulTheme, FuzzySelect};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use super::args::PlayCliArgs;

/// Shows playback position as a progress bar.
pub struct ProgressRenderer {
    pb: ProgressBar,
    frame_rate: u32,
}

impl ProgressRenderer {
    pub fn new(pb: ProgressBar, frame_rate: u32) -> Self {
        Self {
            pb,
            frame_rate: frame_rate.max(1),
        }
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.pb
    }
}

impl FrameRenderer for ProgressRenderer {
    fn render(&mut self, index: usize, total: usize, frame: &Frame) {
        self.pb.set_length(total as u64);
        self.pb.set_position(index as u64 + 1);

        let audio = if frame.has_audio() { " ♪" } else { "" };
        self.pb.set_message(format!(
            "{:.1}s  {} KB{}",
            index as f64 / self.frame_rate as f64,
            frame.video.len() / 1024,
            audio
        ));
    }
}

pub async fn handle_play_command(args: PlayCliArgs) -> Result<()> {
    let config = Config::load()?;
    let store = app::open_store(&config)?;

    let id = match args.id {
        Some(id) => id,
        None => {
            let params = ListParams::new().with_limit(store.max_recordings());
            let summaries = history::list(&store, &params).await?;
            if summaries.is_empty() {
                println!("No recordings yet.");
                return Ok(());
            }
            pick_recording(&summaries)?
        }
    };

    let recording = history::require(&store, &id).await?;
    let frame_rate = args.fps.unwrap_or(config.playback.frame_rate).max(1);

    println!(
        "Playing '{}' from {} ({} frames at {} fps)",
        recording.alert_type,
        history::format_timestamp(recording.timestamp),
        recording.frame_count(),
        frame_rate
    );

    let progress = create_progress_bar(recording.frame_count())?;
    let renderer = ProgressRenderer::new(progress, frame_rate);
    let mut playback = PlaybackController::new(recording, renderer, NullAudioSink::default())
        .with_frame_rate(frame_rate);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    playback.run(&cancel).await;

    let pb = playback.renderer().progress_bar();
    if cancel.is_cancelled() {
        pb.abandon_with_message("Stopped");
    } else {
        pb.finish_with_message(format!(
            "Done ({} audio chunk(s))",
            playback.audio_sink().played()
        ));
    }

    Ok(())
}

fn pick_recording(summaries: &[RecordingSummary]) -> Result<String> {
    let items: Vec<String> = summaries.iter().map(picker_label).collect();
    let theme = ColorfulTheme::default();
    let selection = FuzzySelect::with_theme(&theme)
        .with_prompt("Select a recording")
        .items(&items)
        .default(0)
        .interact_opt()?;

    selection
        .map(|index| summaries[index].id.clone())
        .ok_or_else(|| anyhow!("No recording selected"))
}

fn picker_label(summary: &RecordingSummary) -> String {
    format!(
        "{}  {}  {}  ({:.1}s)",
        summary.created_at,
        summary.feed.as_deref().unwrap_or("-"),
        summary.alert_type,
        summary.duration_secs
    )
}

/// Create a styled progress bar.
fn create_progress_bar(frames: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("━╸━"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_tracks_position() {
        let mut renderer = ProgressRenderer::new(ProgressBar::hidden(), 30);
        let frame = Frame::new("x".repeat(2048), Some("AAA=".to_string()));

        renderer.render(14, 45, &frame);

        let pb = renderer.progress_bar();
        assert_eq!(pb.length(), Some(45));
        assert_eq!(pb.position(), 15);
        assert_eq!(pb.message(), "0.5s  2 KB ♪");
    }

    #[test]
    fn test_picker_label() {
        let summary = RecordingSummary {
            id: "abc".to_string(),
            timestamp: 0,
            alert_type: "CRYING_ALERT".to_string(),
            feed: None,
            frame_count: 45,
            duration_secs: 1.5,
            has_audio: false,
            created_at: "2024-01-01 10:00:00".to_string(),
        };
        assert_eq!(picker_label(&summary), "2024-01-01 10:00:00  CRYING_ALERT  (1.5s)");
    }
}
