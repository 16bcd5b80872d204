//! Handler mode: the caller's task drives the stream through callbacks.

use tokio_util::sync::CancellationToken;

use super::decode::Decoder;
use super::event::{EventDetail, EventKind, NodeDetail, StreamEvent, TtsMessage, WorkflowDetail};
use super::pipeline::{Item, Pipeline};
use super::reader::{ByteStream, LineReader};
use crate::error::Result;

/// Callbacks for workflow stream events.
///
/// Every method defaults to doing nothing. Callbacks run one at a time, in
/// wire order, on the task that called [`drive_handler`].
///
/// Routing follows the event discriminator. A workflow or node event whose
/// line carried no `data` object still reaches its typed callback, with an
/// empty [`WorkflowDetail`] or [`NodeDetail`].
pub trait WorkflowEventHandler {
    /// The workflow run started.
    fn on_workflow_started(&mut self, _event: &StreamEvent, _workflow: &WorkflowDetail) {}

    /// A node started executing.
    fn on_node_started(&mut self, _event: &StreamEvent, _node: &NodeDetail) {}

    /// A node finished, successfully or not.
    fn on_node_finished(&mut self, _event: &StreamEvent, _node: &NodeDetail) {}

    /// The workflow run finished.
    fn on_workflow_finished(&mut self, _event: &StreamEvent, _workflow: &WorkflowDetail) {}

    /// Any other event, including ones this client does not recognise.
    fn on_event(&mut self, _event: &StreamEvent) {}

    /// Synthesized speech. TTS frames only ever arrive here.
    fn on_tts(&mut self, _message: &TtsMessage) {}
}

/// Drive `body` to completion, dispatching every event to `handler`.
///
/// Returns once the stream is exhausted (`Ok`) or has failed. Cancellation
/// surfaces as [`crate::Error::Cancelled`].
pub async fn drive_handler<H>(
    body: ByteStream,
    cancel: &CancellationToken,
    skip_empty_messages: bool,
    handler: &mut H,
) -> Result<()>
where
    H: WorkflowEventHandler + ?Sized,
{
    let mut pipeline = Pipeline::new(
        LineReader::new(body),
        Decoder::new(skip_empty_messages),
        cancel.clone(),
    );

    let mut dispatched = 0usize;
    let outcome = loop {
        match pipeline.next().await {
            Ok(Some(Item::Event(event))) => {
                dispatch(handler, &event);
                dispatched += 1;
            }
            Ok(Some(Item::Tts(message))) => handler.on_tts(&message),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    match &outcome {
        Ok(()) => tracing::debug!(dispatched, "Workflow stream finished"),
        Err(e) => tracing::debug!(dispatched, error = %e, "Workflow stream ended with error"),
    }
    outcome
}

fn dispatch<H>(handler: &mut H, event: &StreamEvent)
where
    H: WorkflowEventHandler + ?Sized,
{
    let empty_workflow = WorkflowDetail::default();
    let empty_node = NodeDetail::default();
    let workflow = match &event.detail {
        EventDetail::Workflow(workflow) => Some(workflow),
        EventDetail::None => Some(&empty_workflow),
        _ => None,
    };
    let node = match &event.detail {
        EventDetail::Node(node) => Some(node),
        EventDetail::None => Some(&empty_node),
        _ => None,
    };

    match (&event.event, workflow, node) {
        (EventKind::WorkflowStarted, Some(workflow), _) => {
            handler.on_workflow_started(event, workflow)
        }
        (EventKind::NodeStarted, _, Some(node)) => handler.on_node_started(event, node),
        (EventKind::NodeFinished, _, Some(node)) => handler.on_node_finished(event, node),
        (EventKind::WorkflowFinished, Some(workflow), _) => {
            handler.on_workflow_finished(event, workflow)
        }
        _ => handler.on_event(event),
    }
}
