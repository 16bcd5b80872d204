//! API endpoint implementations.

mod chat;
mod conversations;
mod workflows;

pub use chat::ChatApi;
pub use conversations::ConversationsApi;
pub use workflows::WorkflowsApi;
