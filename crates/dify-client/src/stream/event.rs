//! Typed stream events.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Discriminator
// ─────────────────────────────────────────────────────────────────────────────

/// The `event` field of a stream line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    AgentMessage,
    AgentThought,
    MessageFile,
    MessageEnd,
    MessageReplace,
    WorkflowStarted,
    NodeStarted,
    NodeFinished,
    WorkflowFinished,
    IterationStarted,
    IterationNext,
    IterationCompleted,
    LoopStarted,
    LoopNext,
    LoopCompleted,
    ParallelBranchStarted,
    ParallelBranchFinished,
    TextChunk,
    TtsMessage,
    TtsMessageEnd,
    Ping,
    Error,
    /// A discriminator this client does not know yet.
    Other(String),
}

/// Which typed shape the `data` object of an event takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetailShape {
    Workflow,
    Node,
    Opaque,
}

impl EventKind {
    /// Wire name of the discriminator.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::AgentMessage => "agent_message",
            Self::AgentThought => "agent_thought",
            Self::MessageFile => "message_file",
            Self::MessageEnd => "message_end",
            Self::MessageReplace => "message_replace",
            Self::WorkflowStarted => "workflow_started",
            Self::NodeStarted => "node_started",
            Self::NodeFinished => "node_finished",
            Self::WorkflowFinished => "workflow_finished",
            Self::IterationStarted => "iteration_started",
            Self::IterationNext => "iteration_next",
            Self::IterationCompleted => "iteration_completed",
            Self::LoopStarted => "loop_started",
            Self::LoopNext => "loop_next",
            Self::LoopCompleted => "loop_completed",
            Self::ParallelBranchStarted => "parallel_branch_started",
            Self::ParallelBranchFinished => "parallel_branch_finished",
            Self::TextChunk => "text_chunk",
            Self::TtsMessage => "tts_message",
            Self::TtsMessageEnd => "tts_message_end",
            Self::Ping => "ping",
            Self::Error => "error",
            Self::Other(name) => name,
        }
    }

    /// Whether frames of this kind carry synthesized audio.
    pub fn is_tts(&self) -> bool {
        matches!(self, Self::TtsMessage | Self::TtsMessageEnd)
    }

    /// Whether this kind carries an incremental `answer` chunk.
    pub fn is_answer_chunk(&self) -> bool {
        matches!(self, Self::Message | Self::AgentMessage)
    }

    pub(crate) fn detail_shape(&self) -> DetailShape {
        match self {
            Self::WorkflowStarted | Self::WorkflowFinished => DetailShape::Workflow,
            Self::NodeStarted
            | Self::NodeFinished
            | Self::IterationStarted
            | Self::IterationNext
            | Self::IterationCompleted
            | Self::LoopStarted
            | Self::LoopNext
            | Self::LoopCompleted
            | Self::ParallelBranchStarted
            | Self::ParallelBranchFinished => DetailShape::Node,
            _ => DetailShape::Opaque,
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "message" => Self::Message,
            "agent_message" => Self::AgentMessage,
            "agent_thought" => Self::AgentThought,
            "message_file" => Self::MessageFile,
            "message_end" => Self::MessageEnd,
            "message_replace" => Self::MessageReplace,
            "workflow_started" => Self::WorkflowStarted,
            "node_started" => Self::NodeStarted,
            "node_finished" => Self::NodeFinished,
            "workflow_finished" => Self::WorkflowFinished,
            "iteration_started" => Self::IterationStarted,
            "iteration_next" => Self::IterationNext,
            "iteration_completed" => Self::IterationCompleted,
            "loop_started" => Self::LoopStarted,
            "loop_next" => Self::LoopNext,
            "loop_completed" => Self::LoopCompleted,
            "parallel_branch_started" => Self::ParallelBranchStarted,
            "parallel_branch_finished" => Self::ParallelBranchFinished,
            "text_chunk" => Self::TextChunk,
            "tts_message" => Self::TtsMessage,
            "tts_message_end" => Self::TtsMessageEnd,
            "ping" => Self::Ping,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// One decoded event from a chat or workflow stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    /// Discriminator.
    pub event: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Incremental answer text for message events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Usage and retriever resources, sent with `message_end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// The `data` object, shaped by the discriminator.
    #[serde(rename = "data", skip_serializing_if = "EventDetail::is_none")]
    pub detail: EventDetail,
}

impl StreamEvent {
    /// The answer chunk, or an empty string when the event has none.
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    /// Node detail, for node, iteration, loop and parallel-branch events.
    pub fn node(&self) -> Option<&NodeDetail> {
        match &self.detail {
            EventDetail::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Workflow detail, for workflow start and finish events.
    pub fn workflow(&self) -> Option<&WorkflowDetail> {
        match &self.detail {
            EventDetail::Workflow(workflow) => Some(workflow),
            _ => None,
        }
    }
}

/// Event-specific `data` object.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(untagged)]
pub enum EventDetail {
    /// The line had no `data` object.
    #[default]
    None,
    Workflow(WorkflowDetail),
    Node(NodeDetail),
    /// Detail of a discriminator without a typed shape, kept verbatim.
    Unknown(Box<RawValue>),
}

impl EventDetail {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Raw JSON text of an untyped detail.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Unknown(raw) => Some(raw.get()),
            _ => None,
        }
    }
}

impl PartialEq for EventDetail {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Workflow(a), Self::Workflow(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Unknown(a), Self::Unknown(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}

/// Detail of `workflow_started` and `workflow_finished`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowDetail {
    pub id: Option<String>,
    pub workflow_id: Option<String>,
    pub sequence_number: Option<u64>,
    pub inputs: Option<Map<String, Value>>,
    pub outputs: Option<Map<String, Value>>,
    /// `running`, `succeeded`, `failed` or `stopped`.
    pub status: Option<String>,
    pub error: Option<Value>,
    /// Seconds.
    pub elapsed_time: Option<f64>,
    pub total_tokens: Option<u64>,
    pub total_steps: Option<u32>,
    pub created_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub files: Option<Vec<Value>>,
}

/// Detail of node-level events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDetail {
    pub id: Option<String>,
    pub node_id: Option<String>,
    pub node_type: Option<String>,
    pub title: Option<String>,
    pub label: Option<String>,
    pub index: Option<u32>,
    pub predecessor_node_id: Option<String>,
    pub inputs: Option<Map<String, Value>>,
    pub process_data: Option<Value>,
    pub outputs: Option<Map<String, Value>>,
    pub status: Option<String>,
    pub error: Option<Value>,
    /// Seconds.
    pub elapsed_time: Option<f64>,
    pub execution_metadata: Option<Map<String, Value>>,
    pub created_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub files: Option<Vec<Value>>,
    pub parallel_id: Option<String>,
    pub parallel_start_node_id: Option<String>,
    pub parent_parallel_id: Option<String>,
    pub parent_parallel_start_node_id: Option<String>,
    pub iteration_id: Option<String>,
    pub loop_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// TTS
// ─────────────────────────────────────────────────────────────────────────────

/// A chunk of synthesized speech, or the end marker of a speech stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TtsMessage {
    /// `tts_message` or `tts_message_end`.
    pub event: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Base64-encoded audio, passed through untouched.
    pub audio: String,
}

impl TtsMessage {
    /// Whether this is the end-of-speech marker.
    pub fn is_end(&self) -> bool {
        self.event == EventKind::TtsMessageEnd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names_round_trip() {
        for name in [
            "message",
            "message_end",
            "workflow_started",
            "node_started",
            "node_finished",
            "workflow_finished",
            "tts_message",
            "error",
        ] {
            assert_eq!(EventKind::from(name).as_str(), name);
        }
        assert_eq!(
            EventKind::from("agent_log"),
            EventKind::Other("agent_log".to_string())
        );
    }

    #[test]
    fn test_detail_shapes() {
        assert_eq!(
            EventKind::WorkflowFinished.detail_shape(),
            DetailShape::Workflow
        );
        assert_eq!(EventKind::LoopNext.detail_shape(), DetailShape::Node);
        assert_eq!(EventKind::MessageEnd.detail_shape(), DetailShape::Opaque);
        assert_eq!(
            EventKind::Other("x".into()).detail_shape(),
            DetailShape::Opaque
        );
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let event = StreamEvent {
            event: EventKind::Message,
            task_id: Some("t1".to_string()),
            id: None,
            conversation_id: None,
            message_id: None,
            workflow_run_id: None,
            created_at: None,
            answer: Some("hi".to_string()),
            metadata: None,
            detail: EventDetail::None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"message","task_id":"t1","answer":"hi"}"#);
    }
}
