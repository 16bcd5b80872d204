//! Workflows API.

use tokio_util::sync::CancellationToken;

use crate::client::DifyClient;
use crate::error::{Error, Result};
use crate::stream::{byte_stream, drive_handler, WorkflowEventHandler};
use crate::types::{
    WorkflowRequest, WorkflowRunResponse, RESPONSE_MODE_BLOCKING, RESPONSE_MODE_STREAMING,
};

/// Workflows API client.
pub struct WorkflowsApi {
    client: DifyClient,
}

impl WorkflowsApi {
    pub(crate) fn new(client: DifyClient) -> Self {
        Self { client }
    }

    /// Run a workflow and wait for its outputs.
    pub async fn run(&self, mut request: WorkflowRequest) -> Result<WorkflowRunResponse> {
        validate(&request)?;
        request.response_mode = RESPONSE_MODE_BLOCKING.to_string();
        self.client.post("workflows/run", &request).await
    }

    /// Run a workflow in streaming mode, calling `handler` for every event.
    ///
    /// Resolves once the stream has been fully consumed or has failed.
    /// Cancelling `cancel` stops before the next line is read and returns
    /// [`Error::Cancelled`]. `message` events with an empty answer are not
    /// delivered; use [`run_streaming_with`](Self::run_streaming_with) to
    /// keep them.
    pub async fn run_streaming<H>(
        &self,
        request: WorkflowRequest,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> Result<()>
    where
        H: WorkflowEventHandler + ?Sized,
    {
        self.run_streaming_with(request, cancel, true, handler).await
    }

    /// Like [`run_streaming`](Self::run_streaming) with an explicit
    /// empty-message policy.
    pub async fn run_streaming_with<H>(
        &self,
        mut request: WorkflowRequest,
        cancel: &CancellationToken,
        skip_empty_messages: bool,
        handler: &mut H,
    ) -> Result<()>
    where
        H: WorkflowEventHandler + ?Sized,
    {
        validate(&request)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        request.response_mode = RESPONSE_MODE_STREAMING.to_string();
        let response = self.client.post_stream("workflows/run", &request).await?;
        drive_handler(
            byte_stream(response.bytes_stream()),
            cancel,
            skip_empty_messages,
            handler,
        )
        .await
    }
}

fn validate(request: &WorkflowRequest) -> Result<()> {
    if request.user.is_empty() {
        return Err(Error::Validation("user is required".to_string()));
    }
    Ok(())
}
