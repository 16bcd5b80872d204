//! Line classification.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

const DATA_PREFIX: &[u8] = b"data:";

/// What a single line of the stream body is.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<'a> {
    /// An event line; holds everything after the `data:` prefix.
    Data(&'a [u8]),
    /// A bare JSON error object written outside the event framing.
    OutOfBand(ErrorPayload),
    /// Blank lines, keep-alive comments and anything else.
    Ignorable,
}

/// Error object the server writes into the body when it aborts a stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: u16,
}

/// Classify one raw line.
pub fn classify(line: &[u8]) -> Frame<'_> {
    if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
        return Frame::Data(payload);
    }

    if line.first() == Some(&b'{') {
        if let Ok(payload) = serde_json::from_slice::<ErrorPayload>(line) {
            if !payload.code.is_empty() {
                return Frame::OutOfBand(payload);
            }
        }
    }

    Frame::Ignorable
}

/// Read a status leniently: a JSON number or numeric string that fits in a
/// `u16`. Anything else (null, negative, out of range, other types) is `None`.
fn parse_status(value: Option<Value>) -> Option<u16> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Status field of an error frame. Never fails; unusable values become 0.
pub(crate) fn deserialize_status<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_status(Option::<Value>::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional status field. Never fails; unusable values become `None`.
pub(crate) fn deserialize_optional_status<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_status(Option::<Value>::deserialize(deserializer)?))
}
