//! Chat API.

use tokio_util::sync::CancellationToken;

use crate::client::DifyClient;
use crate::error::{Error, Result};
use crate::stream::{byte_stream, spawn_channel, EventStream, StreamOptions};
use crate::types::{
    ChatMessageRequest, ChatMessageResponse, RESPONSE_MODE_BLOCKING, RESPONSE_MODE_STREAMING,
};

/// Chat API client.
pub struct ChatApi {
    client: DifyClient,
}

impl ChatApi {
    pub(crate) fn new(client: DifyClient) -> Self {
        Self { client }
    }

    /// Send a chat message and wait for the full answer.
    pub async fn send(&self, mut request: ChatMessageRequest) -> Result<ChatMessageResponse> {
        validate(&request)?;
        request.response_mode = RESPONSE_MODE_BLOCKING.to_string();
        self.client.post("chat-messages", &request).await
    }

    /// Open a streaming chat request and return the raw HTTP response.
    pub async fn stream_raw(&self, mut request: ChatMessageRequest) -> Result<reqwest::Response> {
        validate(&request)?;
        request.response_mode = RESPONSE_MODE_STREAMING.to_string();
        self.client.post_stream("chat-messages", &request).await
    }

    /// Stream a chat answer.
    ///
    /// Events are decoded by a background task; drop the returned stream or
    /// cancel `cancel` to stop it early.
    pub async fn stream_with(
        &self,
        request: ChatMessageRequest,
        cancel: CancellationToken,
        options: StreamOptions,
    ) -> Result<EventStream> {
        let response = self.stream_raw(request).await?;
        Ok(spawn_channel(
            byte_stream(response.bytes_stream()),
            cancel,
            options,
        ))
    }

    /// Stream a chat answer with default options.
    pub async fn stream(
        &self,
        request: ChatMessageRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream> {
        self.stream_with(request, cancel, StreamOptions::default())
            .await
    }
}

fn validate(request: &ChatMessageRequest) -> Result<()> {
    if request.query.is_empty() {
        return Err(Error::Validation("query is required".to_string()));
    }
    if request.user.is_empty() {
        return Err(Error::Validation("user is required".to_string()));
    }
    Ok(())
}
