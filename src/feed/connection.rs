use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::assembler::FrameAssembler;
use super::message::InboundMessage;
use super::{ConnectionState, FeedError, FeedEvent};
use crate::config::FeedConfig;

type FeedStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_BUFFER: usize = 64;

/// One live feed endpoint. `connect` spawns the socket task; the returned
/// [`FeedHandle`] closes it.
#[derive(Debug, Clone)]
pub struct FeedConnection {
    url: String,
    reconnect_delay: Duration,
}

impl FeedConnection {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.url.clone(), config.reconnect_delay())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start connecting. The task keeps reconnecting until `cancel` fires or
    /// the event receiver is dropped.
    pub fn connect(&self, cancel: CancellationToken) -> (FeedHandle, mpsc::Receiver<FeedEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = tokio::spawn(run_feed(
            self.url.clone(),
            self.reconnect_delay,
            tx,
            state_tx,
            cancel.clone(),
        ));

        (
            FeedHandle {
                cancel,
                task,
                state: state_rx,
            },
            rx,
        )
    }
}

pub struct FeedHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
}

impl FeedHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Close the socket and stop reconnecting. Waits for the task to exit.
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Feed task ended abnormally: {}", e);
        }
    }
}

enum PumpExit {
    Cancelled,
    Closed,
    Failed(FeedError),
    ReceiverGone,
}

async fn run_feed(
    url: String,
    reconnect_delay: Duration,
    tx: mpsc::Sender<FeedEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut assembler = FrameAssembler::new();

    loop {
        if !publish(&tx, &state, ConnectionState::Connecting).await {
            break;
        }

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(url.as_str()) => result,
        };

        let exit = match connected {
            Ok((stream, _)) => {
                info!("Connected to feed {}", url);
                if !publish(&tx, &state, ConnectionState::Connected).await {
                    break;
                }
                pump(stream, &tx, &mut assembler, &cancel).await
            }
            Err(e) => PumpExit::Failed(e.into()),
        };

        assembler.reset();
        match exit {
            PumpExit::Cancelled | PumpExit::ReceiverGone => break,
            PumpExit::Failed(e) => {
                warn!("Feed {} failed: {}", url, e);
                if !publish(&tx, &state, ConnectionState::Error).await {
                    break;
                }
            }
            PumpExit::Closed => {}
        }

        if !publish(&tx, &state, ConnectionState::Disconnected).await {
            break;
        }

        debug!("Reconnecting to feed in {:?}", reconnect_delay);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    let _ = tx.try_send(FeedEvent::Connection(ConnectionState::Disconnected));
    info!("Feed {} closed", url);
}

async fn pump(
    mut stream: FeedStream,
    tx: &mpsc::Sender<FeedEvent>,
    assembler: &mut FrameAssembler,
    cancel: &CancellationToken,
) -> PumpExit {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = stream.close(None).await {
                    debug!("Error while closing feed socket: {}", e);
                }
                return PumpExit::Cancelled;
            }
            next = stream.next() => next,
        };

        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    debug!("Ignoring non-UTF-8 binary message");
                    continue;
                }
            },
            Some(Ok(Message::Close(frame))) => {
                info!("Feed closed by server: {:?}", frame);
                return PumpExit::Closed;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return PumpExit::Failed(e.into()),
            None => return PumpExit::Closed,
        };

        let message = match InboundMessage::parse(&text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring feed message: {}", e);
                continue;
            }
        };

        for event in assembler.accept(message) {
            if tx.send(event).await.is_err() {
                return PumpExit::ReceiverGone;
            }
        }
    }
}

async fn publish(
    tx: &mpsc::Sender<FeedEvent>,
    state: &watch::Sender<ConnectionState>,
    next: ConnectionState,
) -> bool {
    state.send_replace(next);
    tx.send(FeedEvent::Connection(next)).await.is_ok()
}
