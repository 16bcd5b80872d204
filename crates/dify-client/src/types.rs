//! Request and response types for the Dify API.
//!
//! These types mirror the server's API contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `response_mode` value for blocking calls.
pub const RESPONSE_MODE_BLOCKING: &str = "blocking";

/// `response_mode` value for streaming calls.
pub const RESPONSE_MODE_STREAMING: &str = "streaming";

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// A file attached to a chat message or workflow input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFile {
    /// File type (`image`, `document`, `audio`, `video`, `custom`).
    #[serde(rename = "type")]
    pub file_type: String,
    /// `remote_url` or `local_file`.
    pub transfer_method: String,
    /// URL, for `remote_url` transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Id returned by the upload endpoint, for `local_file` transfers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<String>,
}

impl InputFile {
    /// An image fetched by the server from `url`.
    pub fn remote_image(url: impl Into<String>) -> Self {
        Self {
            file_type: "image".to_string(),
            transfer_method: "remote_url".to_string(),
            url: Some(url.into()),
            upload_file_id: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// Request to send a chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessageRequest {
    /// App input variables.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// User query.
    pub query: String,
    /// `blocking` or `streaming`; set by the client.
    #[serde(default)]
    pub response_mode: String,
    /// End-user identifier.
    pub user: String,
    /// Continue an existing conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<InputFile>,
    /// Let the server generate a conversation title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate_name: Option<bool>,
}

impl ChatMessageRequest {
    /// Create a request for `query` on behalf of `user`.
    pub fn new(query: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user: user.into(),
            ..Default::default()
        }
    }

    /// Continue an existing conversation.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Set an input variable.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Attach a file.
    pub fn with_file(mut self, file: InputFile) -> Self {
        self.files.push(file);
        self
    }
}

/// Response to a blocking chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    /// Full answer text.
    #[serde(default)]
    pub answer: String,
    /// Usage and retriever resources.
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflows
// ─────────────────────────────────────────────────────────────────────────────

/// Request to run a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Workflow input variables.
    #[serde(default)]
    pub inputs: Map<String, Value>,
    /// `blocking` or `streaming`; set by the client.
    #[serde(default)]
    pub response_mode: String,
    /// End-user identifier.
    pub user: String,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<InputFile>,
}

impl WorkflowRequest {
    /// Create a request on behalf of `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    /// Set an input variable.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }
}

/// Response to a blocking workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunResponse {
    pub workflow_run_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub data: WorkflowRunData,
}

/// Outcome of a workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowRunData {
    pub id: String,
    pub workflow_id: Option<String>,
    /// `running`, `succeeded`, `failed` or `stopped`.
    pub status: String,
    pub outputs: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub elapsed_time: Option<f64>,
    pub total_tokens: Option<u64>,
    pub total_steps: Option<u32>,
    pub created_at: Option<i64>,
    pub finished_at: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversations
// ─────────────────────────────────────────────────────────────────────────────

/// Query for listing conversations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationsQuery {
    /// End-user identifier. Required.
    pub user: String,
    /// Id of the last conversation on the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    /// Page size; defaults to 20.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// A page of conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsResponse {
    pub limit: u32,
    pub has_more: bool,
    pub data: Vec<Conversation>,
}

/// Conversation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Map<String, Value>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Query for listing conversation variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationVariablesQuery {
    /// Conversation to read from. Required; sent in the path.
    #[serde(skip)]
    pub conversation_id: String,
    /// End-user identifier. Required.
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    /// Page size between 1 and 100; defaults to 20.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Only return the variable with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

/// A page of conversation variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationVariablesResponse {
    pub limit: u32,
    pub has_more: bool,
    pub data: Vec<ConversationVariable>,
}

/// A variable stored on a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationVariable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Request to rename a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameConversationRequest {
    /// New name. Ignored by the server when `auto_generate` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Let the server generate the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate: Option<bool>,
    /// End-user identifier.
    pub user: String,
}

/// Response to a rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConversationResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}
