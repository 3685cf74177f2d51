//! Extracts Wormhole messages from the move events of a Sui transaction.

use std::{fmt, str::FromStr};

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};
use serde_json::Value;

use crate::Error;

const WORMHOLE_MESSAGE_EVENT: &str = "::state::WormholeMessage";

/// A message published through the Sui core bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WormholeMessage {
    /// Package that emitted the event.
    pub emitter: String,
    pub finality: u8,
    pub batch_id: u32,
    pub payload: Vec<u8>,
    /// Emitter capability the message was sent with.
    pub emitter_id: String,
    pub sequence: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveEvent {
    package_id: String,
    fields: Value,
}

#[derive(Deserialize)]
struct MessageFields {
    #[serde(deserialize_with = "number")]
    consistency_level: u8,
    #[serde(deserialize_with = "number")]
    nonce: u32,
    payload: Vec<u8>,
    sender: String,
    #[serde(deserialize_with = "number")]
    sequence: u64,
}

struct NumberVisitor<T>(std::marker::PhantomData<T>);

impl<'de, T> Visitor<'de> for NumberVisitor<T>
where
    T: FromStr + TryFrom<u64>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        T::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Sui's JSON RPC renders 64 bit integers as strings and smaller ones as numbers.
fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64>,
{
    deserializer.deserialize_any(NumberVisitor(std::marker::PhantomData))
}

/// Older Sui nodes drop the leading zeros of the package address in event types, so
/// `0x08b2...::state::WormholeMessage` shows up as `0x8b2...::state::WormholeMessage`.
fn event_types(wormhole_id: &str) -> (String, String) {
    let hex = wormhole_id.strip_prefix("0x").unwrap_or(wormhole_id);
    (
        format!("{wormhole_id}{WORMHOLE_MESSAGE_EVENT}"),
        format!("0x{}{WORMHOLE_MESSAGE_EVENT}", hex.trim_start_matches('0')),
    )
}

/// Collects every `WormholeMessage` event published by the core bridge package `wormhole_id`.
///
/// `events` are the entries returned by `sui_getEvents`, either bare move events or wrapped in a
/// `{"moveEvent": ...}` envelope. Anything else is skipped.
pub fn wormhole_messages_from_events(
    wormhole_id: &str,
    events: &[Value],
) -> Result<Vec<WormholeMessage>, Error> {
    let (event_type, stripped) = event_types(wormhole_id);

    let mut messages = Vec::new();
    for event in events {
        let event = event.get("moveEvent").unwrap_or(event);
        match event.get("type").and_then(Value::as_str) {
            Some(ty) if ty == event_type || ty == stripped => {}
            _ => continue,
        }

        let event = MoveEvent::deserialize(event)?;

        let fields = MessageFields::deserialize(&event.fields)?;
        messages.push(WormholeMessage {
            emitter: event.package_id,
            finality: fields.consistency_level,
            batch_id: fields.nonce,
            payload: fields.payload,
            emitter_id: fields.sender,
            sequence: fields.sequence,
        });
    }

    Ok(messages)
}
