//! Read, classify and decode loop shared by both dispatch strategies.

use tokio_util::sync::CancellationToken;

use super::decode::{Decoded, Decoder};
use super::event::{StreamEvent, TtsMessage};
use super::frame::{classify, Frame};
use super::reader::LineReader;
use crate::error::{Error, Result};

/// Something the pipeline produced for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Event(StreamEvent),
    Tts(TtsMessage),
}

/// Per-request stream state.
///
/// Once `next` has returned `Ok(None)` or an error the pipeline is finished
/// and every later call returns `Ok(None)` without touching the reader.
pub struct Pipeline {
    reader: LineReader,
    decoder: Decoder,
    cancel: CancellationToken,
    finished: bool,
}

impl Pipeline {
    pub fn new(reader: LineReader, decoder: Decoder, cancel: CancellationToken) -> Self {
        Self {
            reader,
            decoder,
            cancel,
            finished: false,
        }
    }

    /// Advance to the next deliverable item.
    ///
    /// The cancellation token is checked before every line read; a read that
    /// is already waiting on the network is not interrupted.
    pub async fn next(&mut self) -> Result<Option<Item>> {
        if self.finished {
            return Ok(None);
        }
        let outcome = self.advance().await;
        if !matches!(outcome, Ok(Some(_))) {
            self.finished = true;
        }
        outcome
    }

    async fn advance(&mut self) -> Result<Option<Item>> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let Some(line) = self.reader.next_line().await? else {
                return Ok(None);
            };

            match classify(&line) {
                Frame::Ignorable => {
                    tracing::trace!(len = line.len(), "Ignoring non-event line");
                }
                Frame::OutOfBand(payload) => {
                    tracing::warn!(code = %payload.code, status = payload.status, "Server error frame in stream");
                    return Err(Error::Server {
                        code: payload.code,
                        message: payload.message,
                        status: payload.status,
                    });
                }
                Frame::Data(payload) => match self.decoder.decode(payload) {
                    Ok(Decoded::Event(event)) => return Ok(Some(Item::Event(event))),
                    Ok(Decoded::Tts(message)) => return Ok(Some(Item::Tts(message))),
                    Ok(Decoded::Skip) => {}
                    Err(e) => {
                        tracing::warn!(
                            data = %String::from_utf8_lossy(payload).trim(),
                            error = %e,
                            "Stream event rejected"
                        );
                        return Err(e);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stream::event::EventKind;
    use crate::stream::reader::tests::reader_from;

    pub(crate) fn pipeline_from(chunks: &[&str], cancel: CancellationToken) -> Pipeline {
        Pipeline::new(reader_from(chunks), Decoder::default(), cancel)
    }

    async fn drain(pipeline: &mut Pipeline) -> (Vec<Item>, Result<()>) {
        let mut items = Vec::new();
        loop {
            match pipeline.next().await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => return (items, Ok(())),
                Err(e) => return (items, Err(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_hello_example() {
        let mut pipeline = pipeline_from(
            &[
                "data: {\"event\":\"message\",\"task_id\":\"t1\",\"answer\":\"Hel\"}\n",
                "data: {\"event\":\"message\",\"task_id\":\"t1\",\"answer\":\"lo\"}\n",
                "data: {\"event\":\"message_end\",\"task_id\":\"t1\"}\n",
            ],
            CancellationToken::new(),
        );
        let (items, outcome) = drain(&mut pipeline).await;
        assert!(outcome.is_ok());
        assert_eq!(items.len(), 3);

        let answer: String = items
            .iter()
            .filter_map(|item| match item {
                Item::Event(e) if e.event == EventKind::Message => Some(e.answer_text()),
                _ => None,
            })
            .collect();
        assert_eq!(answer, "Hello");
        assert!(matches!(&items[2], Item::Event(e) if e.event == EventKind::MessageEnd));
    }

    #[tokio::test]
    async fn test_filler_does_not_terminate() {
        let mut pipeline = pipeline_from(
            &[
                "\n",
                ": ping\n",
                "event: ping\n",
                "not json\n",
                "{\"code\":\"\",\"message\":\"\",\"status\":0}\n",
                "data: {\"event\":\"message\",\"answer\":\"\"}\n",
                "data: {\"event\":\"message_end\"}\n",
            ],
            CancellationToken::new(),
        );
        let (items, outcome) = drain(&mut pipeline).await;
        assert!(outcome.is_ok());
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_error_event_stops_reading() {
        let mut pipeline = pipeline_from(
            &[
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
                "data: {\"event\":\"error\",\"code\":\"boom\"}\n",
                "data: {\"event\":\"message\",\"answer\":\"b\"}\n",
            ],
            CancellationToken::new(),
        );
        let (items, outcome) = drain(&mut pipeline).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(outcome, Err(Error::ServerEvent { .. })));
        assert!(pipeline.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_out_of_band_error() {
        let mut pipeline = pipeline_from(
            &[
                "{\"code\":\"X\",\"message\":\"m\",\"status\":400}\n",
                "data: {\"event\":\"message\",\"answer\":\"late\"}\n",
            ],
            CancellationToken::new(),
        );
        let (items, outcome) = drain(&mut pipeline).await;
        assert!(items.is_empty());
        match outcome {
            Err(Error::Server {
                code,
                message,
                status,
            }) => {
                assert_eq!(code, "X");
                assert_eq!(message, "m");
                assert_eq!(status, 400);
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_band_error_with_unusable_status() {
        for status in ["null", "70000"] {
            let frame = format!("{{\"code\":\"X\",\"message\":\"m\",\"status\":{status}}}\n");
            let mut pipeline = pipeline_from(
                &[
                    frame.as_str(),
                    "data: {\"event\":\"message\",\"answer\":\"late\"}\n",
                ],
                CancellationToken::new(),
            );
            let (items, outcome) = drain(&mut pipeline).await;
            assert!(items.is_empty(), "status {status}");
            assert!(
                matches!(outcome, Err(Error::Server { ref code, status: 0, .. }) if code == "X"),
                "status {status}: {outcome:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_first_read() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut pipeline = pipeline_from(
            &["data: {\"event\":\"message\",\"answer\":\"a\"}\n"],
            cancel,
        );
        let (items, outcome) = drain(&mut pipeline).await;
        assert!(items.is_empty());
        assert!(matches!(outcome, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_between_events() {
        let cancel = CancellationToken::new();
        let mut pipeline = pipeline_from(
            &[
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
                "data: {\"event\":\"message\",\"answer\":\"b\"}\n",
            ],
            cancel.clone(),
        );
        assert!(pipeline.next().await.unwrap().is_some());
        cancel.cancel();
        assert!(matches!(pipeline.next().await, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_decode_error_is_terminal() {
        let mut pipeline = pipeline_from(
            &[
                "data: {broken\n",
                "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
            ],
            CancellationToken::new(),
        );
        assert!(matches!(pipeline.next().await, Err(Error::Decode(_))));
        assert!(pipeline.next().await.unwrap().is_none());
    }
}
