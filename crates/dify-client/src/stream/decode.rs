//! Decoding of `data:` payloads into events.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use super::event::{DetailShape, EventDetail, EventKind, StreamEvent, TtsMessage};
use super::frame::deserialize_optional_status;
use crate::error::{Error, Result};

/// Outcome of decoding one event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// An event for the consumer.
    Event(StreamEvent),
    /// Audio for the TTS sub-channel.
    Tts(TtsMessage),
    /// Nothing to deliver.
    Skip,
}

/// Envelope as it appears on the wire, before the detail is typed.
#[derive(Deserialize)]
struct WireEvent {
    event: String,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    workflow_run_id: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    audio: Option<String>,
    #[serde(default)]
    data: Option<Box<RawValue>>,
}

/// Fields an `error` event may carry. Parsed leniently; the raw payload is
/// the authoritative record.
#[derive(Deserialize, Default)]
struct ErrorEventFields {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_status")]
    status: Option<u16>,
}

/// Turns event payloads into [`Decoded`] values.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    skip_empty_messages: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            skip_empty_messages: true,
        }
    }
}

impl Decoder {
    /// Create a decoder. With `skip_empty_messages`, `message` events whose
    /// answer is empty are dropped instead of delivered.
    pub fn new(skip_empty_messages: bool) -> Self {
        Self {
            skip_empty_messages,
        }
    }

    /// Decode the payload of a `data:` line.
    ///
    /// An `error` event is returned as [`Error::ServerEvent`]; malformed JSON
    /// as [`Error::Decode`]. Both end the stream.
    pub fn decode(&self, payload: &[u8]) -> Result<Decoded> {
        let wire: WireEvent = serde_json::from_slice(payload).map_err(Error::Decode)?;
        let kind = EventKind::from(wire.event.as_str());

        match kind {
            EventKind::Error => return Err(server_event_error(payload)),
            EventKind::Message
                if self.skip_empty_messages && wire.answer.as_deref().unwrap_or("").is_empty() =>
            {
                tracing::trace!(task_id = ?wire.task_id, "Skipping empty message event");
                return Ok(Decoded::Skip);
            }
            _ => {}
        }

        if kind.is_tts() {
            return Ok(Decoded::Tts(TtsMessage {
                event: kind,
                task_id: wire.task_id,
                message_id: wire.message_id,
                conversation_id: wire.conversation_id,
                created_at: wire.created_at,
                audio: wire.audio.unwrap_or_default(),
            }));
        }

        let detail = match wire.data {
            None => EventDetail::None,
            Some(raw) => match kind.detail_shape() {
                DetailShape::Workflow => {
                    EventDetail::Workflow(serde_json::from_str(raw.get()).map_err(Error::Decode)?)
                }
                DetailShape::Node => {
                    EventDetail::Node(serde_json::from_str(raw.get()).map_err(Error::Decode)?)
                }
                DetailShape::Opaque => EventDetail::Unknown(raw),
            },
        };

        Ok(Decoded::Event(StreamEvent {
            event: kind,
            task_id: wire.task_id,
            id: wire.id,
            conversation_id: wire.conversation_id,
            message_id: wire.message_id,
            workflow_run_id: wire.workflow_run_id,
            created_at: wire.created_at,
            answer: wire.answer,
            metadata: wire.metadata,
            detail,
        }))
    }
}

fn server_event_error(payload: &[u8]) -> Error {
    let fields: ErrorEventFields = serde_json::from_slice(payload).unwrap_or_default();
    Error::ServerEvent {
        code: fields.code,
        message: fields.message,
        status: fields.status,
        raw: String::from_utf8_lossy(payload).trim().to_string(),
    }
}
