//! Streaming response decoding.
//!
//! A streaming response body is newline-delimited text. Lines starting with
//! `data:` carry one JSON event each; a bare `{...}` line with a non-empty
//! `code` is an error the server wrote outside the event framing; everything
//! else is filler.
//!
//! ```text
//! bytes ─▶ LineReader ─▶ classify ─▶ Decoder ─┬─▶ spawn_channel  (EventStream)
//!                 ▲                           └─▶ drive_handler  (WorkflowEventHandler)
//!                 └── CancellationToken checked before every read
//! ```
//!
//! Both dispatch strategies share [`Pipeline`]. Channel mode moves it into a
//! spawned task that owns the only sender of a one-slot queue; handler mode
//! runs it inline on the caller's task.

mod channel;
mod decode;
mod event;
mod frame;
mod handler;
mod pipeline;
mod reader;

pub use channel::{spawn_channel, EventStream, StreamOptions};
pub use decode::{Decoded, Decoder};
pub use event::{
    EventDetail, EventKind, NodeDetail, StreamEvent, TtsMessage, WorkflowDetail,
};
pub use frame::{classify, ErrorPayload, Frame};
pub use handler::{drive_handler, WorkflowEventHandler};
pub use pipeline::{Item, Pipeline};
pub use reader::{byte_stream, ByteStream, LineReader};
