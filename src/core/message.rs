//! # Message Model
//!
//! A single transcript entry as delivered by the event stream.
//!
//! ```text
//! Message
//! ├── origin: Origin                 // human or ai ("type" on the wire)
//! ├── body: Body                     // text, blocks, or anything else ("content")
//! ├── component_type: Option<String> // structured payload tag ("componentType")
//! ├── payload: Option<Value>         // optional structured data for renderers
//! ├── timestamp: Option<DateTime>    // no label when absent
//! ├── sequence_index: Option<u32>    // "k of n" progress ("sequence")
//! └── sequence_total: Option<u32>    //                    ("total")
//! ```
//!
//! Messages are values: once the feed hands one to `App` nothing edits it.
//!
//! Decoding is lenient field by field: any `type` other than `"human"` is
//! AI, and an unreadable timestamp or sequence number is simply absent. A
//! value that still cannot be read becomes an empty AI row (see
//! [`Message::from_wire`]) so one bad entry never costs its neighbours.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Human,
    #[default]
    #[serde(other)]
    Ai,
}

/// Message content.
///
/// The wire allows a string or an array of strings. Anything else is kept
/// as `Malformed` so the row can render as empty instead of dropping the
/// message or failing the whole snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Blocks(Vec<String>),
    Malformed(Value),
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

impl Body {
    /// Flatten to a single string; blocks are joined with one line break.
    pub fn joined(&self) -> String {
        match self {
            Body::Text(text) => text.clone(),
            Body::Blocks(blocks) => blocks.join("\n"),
            Body::Malformed(_) => String::new(),
        }
    }

    /// Individual blocks; a single text counts as one block.
    pub fn blocks(&self) -> Vec<&str> {
        match self {
            Body::Text(text) => vec![text.as_str()],
            Body::Blocks(blocks) => blocks.iter().map(String::as_str).collect(),
            Body::Malformed(_) => Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type", default, deserialize_with = "lenient_origin")]
    pub origin: Origin,
    #[serde(rename = "content", default)]
    pub body: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(
        rename = "sequence",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_index: Option<u32>,
    #[serde(
        rename = "total",
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence_total: Option<u32>,
}

fn lenient_origin<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Origin, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw.as_str() {
        Some("human") => Origin::Human,
        _ => Origin::Ai,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&raw))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_u64().and_then(|n| u32::try_from(n).ok()))
}

/// Epoch milliseconds, RFC 3339, or a zone-less date-time (read as local
/// time). Anything else yields `None`.
fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Some(ts.with_timezone(&Utc));
            }
            if let Ok(millis) = s.parse::<i64>() {
                return DateTime::<Utc>::from_timestamp_millis(millis);
            }
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"));
            if let Ok(naive) = naive {
                return naive
                    .and_local_timezone(Local)
                    .earliest()
                    .map(|ts| ts.with_timezone(&Utc));
            }
            // Date-only strings are UTC midnight.
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

impl Message {
    /// Read one message off the wire. A value that is not a readable message
    /// (not an object, or a field of the wrong shape) becomes an empty AI row
    /// carrying the raw value.
    pub fn from_wire(value: Value) -> Self {
        match Message::deserialize(&value) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unreadable message kept as empty row: {}", e);
                Self {
                    body: Body::Malformed(value),
                    ..Self::new(Origin::Ai, "")
                }
            }
        }
    }

    fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            body: Body::Text(text.into()),
            component_type: None,
            payload: None,
            timestamp: None,
            sequence_index: None,
            sequence_total: None,
        }
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(Origin::Human, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Origin::Ai, text)
    }

    pub fn with_blocks(mut self, blocks: Vec<String>) -> Self {
        self.body = Body::Blocks(blocks);
        self
    }

    pub fn with_component(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_sequence(mut self, index: Option<u32>, total: Option<u32>) -> Self {
        self.sequence_index = index;
        self.sequence_total = total;
        self
    }

    /// The structured component tag, if this message carries one.
    /// An empty tag is the same as no tag.
    pub fn component(&self) -> Option<&str> {
        self.component_type.as_deref().filter(|tag| !tag.is_empty())
    }

    /// "i/n" progress label. AI messages only, and only with both halves.
    pub fn progress_label(&self) -> Option<String> {
        if self.origin != Origin::Ai {
            return None;
        }
        match (self.sequence_index, self.sequence_total) {
            (Some(index), Some(total)) => Some(format!("{index}/{total}")),
            _ => None,
        }
    }

    /// Short local time label, e.g. `14:03` for `%H:%M`.
    pub fn time_label(&self, format: &str) -> Option<String> {
        self.timestamp
            .map(|ts| ts.with_timezone(&Local).format(format).to_string())
    }
}
