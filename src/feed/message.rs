//! Inbound message parsing.
//!
//! The backend sends loosely-typed JSON objects. Fields are validated here
//! once: unknown fields are ignored and a field with the wrong type is
//! treated as absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FeedError;

/// Readings that travel with frames. Not interpreted by the recorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub bpm: Option<f64>,
    pub rpm: Option<f64>,
    pub faces_detected: Option<u64>,
    /// Recent heart-rate samples for graphing.
    pub hr_wave: Option<Vec<f64>>,
    /// Recent respiration samples for graphing.
    pub rr_wave: Option<Vec<f64>>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.bpm.is_none()
            && self.rpm.is_none()
            && self.faces_detected.is_none()
            && self.hr_wave.is_none()
            && self.rr_wave.is_none()
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            bpm: object.get("bpm").and_then(Value::as_f64),
            rpm: object.get("rpm").and_then(Value::as_f64),
            faces_detected: object.get("faces_detected").and_then(Value::as_u64),
            hr_wave: wave_field(object, "hr_wave"),
            rr_wave: wave_field(object, "rr_wave"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Frame {
        video: String,
        audio: Option<String>,
        status: Option<String>,
        vitals: Vitals,
    },
    /// Audio chunk sent on its own, to be attached to the next frame.
    Audio { audio: String },
    /// Status or vitals update without an image.
    Status {
        status: Option<String>,
        vitals: Vitals,
    },
    Empty,
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(FeedError::NotAnObject);
        };
        Ok(Self::from_object(&object))
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let video = string_field(object, "video");
        let audio = string_field(object, "audio");
        let status = string_field(object, "status");
        let kind = object.get("type").and_then(Value::as_str);
        let vitals = Vitals::from_object(object);

        if let Some(video) = video {
            return InboundMessage::Frame {
                video,
                audio,
                status,
                vitals,
            };
        }

        if let Some(audio) = audio {
            if kind == Some("audio") || (status.is_none() && vitals.is_empty()) {
                return InboundMessage::Audio { audio };
            }
        }

        if status.is_some() || !vitals.is_empty() {
            return InboundMessage::Status { status, vitals };
        }

        InboundMessage::Empty
    }
}

/// An array of numbers. Non-numeric entries are skipped.
fn wave_field(object: &Map<String, Value>, key: &str) -> Option<Vec<f64>> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect())
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
