//! HTTP client SDK for the Dify chat and workflow API.
//!
//! The interesting part of this crate is [`stream`]: it turns the
//! newline-delimited body of a streaming response into typed events, keeps
//! server error frames apart from normal events, and can be cancelled between
//! lines with a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! Streams are consumed in one of two ways:
//!
//! - **Channel mode** ([`ChatApi::stream`]): a background task decodes the
//!   body and hands events over one at a time through an [`EventStream`].
//! - **Handler mode** ([`WorkflowsApi::run_streaming`]): the caller's task
//!   decodes the body and invokes a [`WorkflowEventHandler`] per event.
//!
//! # Example
//!
//! ```no_run
//! use dify_client::{ChatMessageRequest, DifyClient, EventKind, Result};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<()> {
//! let client = DifyClient::builder()
//!     .base_url("https://api.dify.ai/v1")
//!     .api_key("app-secret")
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let mut stream = client
//!     .chat()
//!     .stream(ChatMessageRequest::new("Tell me a story", "user-1"), cancel.clone())
//!     .await?;
//!
//! while let Some(event) = stream.next().await {
//!     let event = event?;
//!     match event.event {
//!         EventKind::Message => print!("{}", event.answer_text()),
//!         EventKind::MessageEnd => println!(),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Chat**: blocking and streaming chat messages
//! - **Workflows**: blocking and streaming workflow runs
//! - **Conversations**: list, variables, rename

pub mod api;
pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use api::{ChatApi, ConversationsApi, WorkflowsApi};
pub use client::{ClientBuilder, DifyClient, CLOUD_BASE_URL};
pub use error::{Error, Result};
pub use stream::{
    EventDetail, EventKind, EventStream, NodeDetail, StreamEvent, StreamOptions, TtsMessage,
    WorkflowDetail, WorkflowEventHandler,
};
pub use types::*;
