//! Channel mode: a background task drives the stream into a queue.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::decode::Decoder;
use super::event::{StreamEvent, TtsMessage};
use super::pipeline::{Item, Pipeline};
use super::reader::{ByteStream, LineReader};
use crate::error::{Error, Result};

/// Options for a channel-mode stream.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Drop `message` events with an empty answer. On by default.
    pub skip_empty_messages: bool,
    /// Receives `tts_message` / `tts_message_end` frames. Without a sink those
    /// frames are discarded.
    ///
    /// Delivery never waits: a frame that finds the sink full is dropped, and
    /// once the receiver is gone all later frames are dropped. Size the sink
    /// for the audio you expect or drain it alongside the event stream.
    pub tts: Option<mpsc::Sender<TtsMessage>>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            skip_empty_messages: true,
            tts: None,
        }
    }
}

impl StreamOptions {
    /// Route TTS frames to `sink`.
    pub fn with_tts(mut self, sink: mpsc::Sender<TtsMessage>) -> Self {
        self.tts = Some(sink);
        self
    }

    /// Deliver `message` events even when their answer is empty.
    pub fn keep_empty_messages(mut self) -> Self {
        self.skip_empty_messages = false;
        self
    }
}

/// Events of a chat stream, in wire order.
///
/// The stream ends when the response is exhausted or cancelled. A failure is
/// delivered as a single final `Err` item.
pub struct EventStream {
    inner: ReceiverStream<Result<StreamEvent>>,
}

impl EventStream {
    /// Receive the next event.
    pub async fn recv(&mut self) -> Option<Result<StreamEvent>> {
        self.inner.next().await
    }

    /// Drain the stream and concatenate the answer chunks.
    pub async fn collect_answer(mut self) -> Result<String> {
        let mut answer = String::new();
        while let Some(event) = self.recv().await {
            let event = event?;
            if event.event.is_answer_chunk() {
                answer.push_str(event.answer_text());
            }
        }
        Ok(answer)
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Start a background task that decodes `body` into an [`EventStream`].
///
/// The task is the only producer and the only owner of the sender, so the
/// queue closes exactly once, when the task returns. It also owns the body;
/// the connection is released on every exit path.
pub fn spawn_channel(
    body: ByteStream,
    cancel: CancellationToken,
    options: StreamOptions,
) -> EventStream {
    let (tx, rx) = mpsc::channel(1);
    let pipeline = Pipeline::new(
        LineReader::new(body),
        Decoder::new(options.skip_empty_messages),
        cancel,
    );
    tokio::spawn(run_worker(pipeline, tx, options.tts));
    EventStream {
        inner: ReceiverStream::new(rx),
    }
}

async fn run_worker(
    mut pipeline: Pipeline,
    events: mpsc::Sender<Result<StreamEvent>>,
    mut tts: Option<mpsc::Sender<TtsMessage>>,
) {
    let mut delivered = 0usize;
    loop {
        match pipeline.next().await {
            Ok(Some(Item::Event(event))) => {
                if events.send(Ok(event)).await.is_err() {
                    tracing::debug!(delivered, "Event consumer went away, closing stream");
                    return;
                }
                delivered += 1;
            }
            Ok(Some(Item::Tts(message))) => match &tts {
                Some(sink) => match sink.try_send(message) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(message)) => {
                        tracing::warn!(event = %message.event, "TTS sink full, dropping audio frame");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!("TTS consumer went away, dropping further audio");
                        tts = None;
                    }
                },
                None => tracing::trace!(event = %message.event, "No TTS sink, dropping audio frame"),
            },
            Ok(None) => {
                tracing::debug!(delivered, "Stream finished");
                return;
            }
            Err(Error::Cancelled) => {
                tracing::debug!(delivered, "Stream cancelled");
                return;
            }
            Err(e) => {
                tracing::debug!(delivered, error = %e, "Stream failed");
                let _ = events.send(Err(e)).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::event::EventKind;
    use crate::stream::reader::byte_stream;
    use bytes::Bytes;

    fn body(lines: &[&str]) -> ByteStream {
        let chunks: Vec<std::result::Result<Bytes, std::io::Error>> = lines
            .iter()
            .map(|l| Ok(Bytes::copy_from_slice(l.as_bytes())))
            .collect();
        byte_stream(futures::stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_events_in_order_then_close() {
        let mut stream = spawn_channel(
            body(&[
                "data: {\"event\":\"message\",\"task_id\":\"t1\",\"answer\":\"Hel\"}\n",
                "data: {\"event\":\"message\",\"task_id\":\"t1\",\"answer\":\"lo\"}\n",
                "data: {\"event\":\"message_end\",\"task_id\":\"t1\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default(),
        );

        let mut kinds = Vec::new();
        let mut answer = String::new();
        while let Some(event) = stream.recv().await {
            let event = event.unwrap();
            answer.push_str(event.answer_text());
            kinds.push(event.event);
        }
        assert_eq!(
            kinds,
            vec![EventKind::Message, EventKind::Message, EventKind::MessageEnd]
        );
        assert_eq!(answer, "Hello");
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_final_item() {
        let events: Vec<Result<StreamEvent>> = spawn_channel(
            body(&[
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
                "{\"code\":\"X\",\"message\":\"m\",\"status\":400}\n",
                "data: {\"event\":\"message\",\"answer\":\"b\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default(),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(
            &events[1],
            Err(Error::Server { code, status: 400, .. }) if code == "X"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_stream_closes_without_error_item() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let events: Vec<Result<StreamEvent>> = spawn_channel(
            body(&["data: {\"event\":\"message\",\"answer\":\"a\"}\n"]),
            cancel,
            StreamOptions::default(),
        )
        .collect()
        .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_tts_goes_to_sub_channel() {
        let (tts_tx, mut tts_rx) = mpsc::channel(8);
        let events: Vec<Result<StreamEvent>> = spawn_channel(
            body(&[
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
                "data: {\"event\":\"tts_message\",\"audio\":\"AAA=\"}\n",
                "data: {\"event\":\"tts_message_end\",\"audio\":\"\"}\n",
                "data: {\"event\":\"message_end\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default().with_tts(tts_tx),
        )
        .collect()
        .await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.as_ref().unwrap().event.is_tts()));

        let first = tts_rx.recv().await.unwrap();
        assert_eq!(first.audio, "AAA=");
        assert!(tts_rx.recv().await.unwrap().is_end());
        assert!(tts_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_undrained_tts_sink_does_not_stall_events() {
        let (tts_tx, mut tts_rx) = mpsc::channel(1);
        let stream = spawn_channel(
            body(&[
                "data: {\"event\":\"tts_message\",\"audio\":\"AAA=\"}\n",
                "data: {\"event\":\"tts_message\",\"audio\":\"BBB=\"}\n",
                "data: {\"event\":\"message\",\"answer\":\"ok\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default().with_tts(tts_tx),
        );

        let answer = tokio::time::timeout(std::time::Duration::from_secs(2), stream.collect_answer())
            .await
            .expect("event stream stalled behind the TTS sink")
            .unwrap();
        assert_eq!(answer, "ok");

        assert_eq!(tts_rx.recv().await.unwrap().audio, "AAA=");
        assert!(tts_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_tts_sink_does_not_end_stream() {
        let (tts_tx, tts_rx) = mpsc::channel(1);
        drop(tts_rx);
        let answer = spawn_channel(
            body(&[
                "data: {\"event\":\"tts_message\",\"audio\":\"AAA=\"}\n",
                "data: {\"event\":\"message\",\"answer\":\"still here\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default().with_tts(tts_tx),
        )
        .collect_answer()
        .await
        .unwrap();
        assert_eq!(answer, "still here");
    }

    #[tokio::test]
    async fn test_tts_dropped_without_sink() {
        let answer = spawn_channel(
            body(&[
                "data: {\"event\":\"tts_message\",\"audio\":\"AAA=\"}\n",
                "data: {\"event\":\"message\",\"answer\":\"ok\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default(),
        )
        .collect_answer()
        .await
        .unwrap();
        assert_eq!(answer, "ok");
    }

    #[tokio::test]
    async fn test_collect_answer_surfaces_error() {
        let result = spawn_channel(
            body(&[
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
                "data: {\"event\":\"error\",\"message\":\"quota\"}\n",
            ]),
            CancellationToken::new(),
            StreamOptions::default(),
        )
        .collect_answer()
        .await;
        assert!(matches!(result, Err(Error::ServerEvent { .. })));
    }

    #[tokio::test]
    async fn test_keep_empty_messages() {
        let events: Vec<Result<StreamEvent>> = spawn_channel(
            body(&["data: {\"event\":\"message\",\"answer\":\"\"}\n"]),
            CancellationToken::new(),
            StreamOptions::default().keep_empty_messages(),
        )
        .collect()
        .await;
        assert_eq!(events.len(), 1);
    }
}
