//! Live feed adapter.
//!
//! Wraps one WebSocket connection to the detection backend and turns its
//! JSON messages into [`FeedEvent`]s. Reconnects on its own after a fixed
//! delay until closed.

pub mod assembler;
pub mod connection;
pub mod message;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recording::Frame;

pub use assembler::FrameAssembler;
pub use connection::{FeedConnection, FeedHandle};
pub use message::{InboundMessage, Vitals};

/// Connection state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
            Self::Error => "ERROR",
        }
    }

    /// True for states in which no frames can arrive.
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connection(ConnectionState),
    Frame {
        frame: Frame,
        status: Option<String>,
    },
    /// Status update that arrived without an image.
    Status(String),
    Vitals(Vitals),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
