use crate::api::ApiServer;
use crate::config::{Config, FeedConfig};
use crate::feed::{FeedConnection, FeedEvent};
use crate::recording::{AlertRecorder, MonitorStatusHandle};
use crate::store::{RecordingStore, SqliteKvStore};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Recording store backed by the application database.
pub fn open_store(config: &Config) -> Result<Arc<RecordingStore>> {
    let backend = SqliteKvStore::open_default()?;
    Ok(Arc::new(RecordingStore::from_config(
        Arc::new(backend),
        &config.recording,
    )))
}

pub async fn run_service() -> Result<()> {
    info!("Starting mamabear monitor");

    let config = Config::load()?;
    let store = open_store(&config)?;
    let monitors: Vec<MonitorStatusHandle> = config
        .feeds
        .iter()
        .map(|feed| MonitorStatusHandle::for_feed(&feed.name))
        .collect();

    if config.api.enabled {
        let api_server = ApiServer::new(store.clone(), monitors.clone(), &config.api);
        tokio::spawn(async move {
            if let Err(e) = api_server.start().await {
                error!("API server failed: {:#}", e);
            }
        });
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let tasks: Vec<_> = config
        .feeds
        .iter()
        .zip(monitors)
        .map(|(feed, status)| {
            let recorder = AlertRecorder::from_config(&config.recording, store.clone(), status)
                .with_feed(&feed.name);
            spawn_feed_monitor(feed, recorder, cancel.clone())
        })
        .collect();

    info!(
        "mamabear is ready! Watching {} feed(s), recording alerts with {} frame(s) of context",
        tasks.len(),
        config.recording.pre_alert_frames
    );

    let mut saved = 0;
    for task in tasks {
        match task.await {
            Ok(count) => saved += count,
            Err(e) => error!("Feed monitor task failed: {}", e),
        }
    }
    info!("mamabear stopped, {} recording(s) saved this session", saved);

    Ok(())
}

/// Connect to one feed and record its alerts on a task of its own until
/// `cancel` fires. The task yields how many recordings it saved.
pub fn spawn_feed_monitor(
    feed: &FeedConfig,
    mut recorder: AlertRecorder,
    cancel: CancellationToken,
) -> JoinHandle<usize> {
    let connection = FeedConnection::from_config(feed);
    let name = feed.name.clone();
    info!("Watching feed '{}' at {}", name, connection.url());

    tokio::spawn(async move {
        let (handle, events) = connection.connect(cancel.clone());
        let saved = run_monitor(&mut recorder, events, &cancel).await;

        recorder.shutdown().await;
        handle.close().await;
        info!("Feed '{}' stopped after {} recording(s)", name, saved);
        saved
    })
}

/// Apply feed events to the recorder until the feed ends or `cancel` fires.
/// Returns how many recordings were saved.
pub async fn run_monitor(
    recorder: &mut AlertRecorder,
    mut events: mpsc::Receiver<FeedEvent>,
    cancel: &CancellationToken,
) -> usize {
    let mut saved = 0;
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };

        match event {
            Some(event) => {
                if recorder.handle_event(event).await.is_some() {
                    saved += 1;
                }
            }
            None => break,
        }
    }
    saved
}
