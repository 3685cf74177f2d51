//! Turns `LogMessagePublished` events emitted by the EVM core bridge into the VAA bodies the
//! guardians would observe for them.
//!
//! The event is declared as
//!
//! ```solidity
//! event LogMessagePublished(
//!     address indexed sender,
//!     uint64 sequence,
//!     uint32 nonce,
//!     bytes payload,
//!     uint8 consistencyLevel
//! );
//! ```
//!
//! so the sender sits in `topics[1]` and the rest is ABI encoded in the log data.

use serde_wormhole::RawMessage;

use crate::{vaa::Body, Address, Chain, Error};

pub const LOG_MESSAGE_PUBLISHED_SIGNATURE: &str =
    "LogMessagePublished(address,uint64,uint32,bytes,uint8)";

/// Keccak256 of [`LOG_MESSAGE_PUBLISHED_SIGNATURE`], the `topics[0]` of every message event.
pub const LOG_MESSAGE_PUBLISHED_TOPIC: [u8; 32] = [
    0x6e, 0xb2, 0x24, 0xfb, 0x00, 0x1e, 0xd2, 0x10, 0xe3, 0x79, 0xb3, 0x35, 0xe3, 0x5e, 0xfe, 0x88,
    0x67, 0x2a, 0x8c, 0xe9, 0x35, 0xd9, 0x81, 0xa6, 0x89, 0x6b, 0x27, 0xff, 0xdf, 0x52, 0xa3, 0xb2,
];

const WORD: usize = 32;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvmLog {
    pub address: [u8; 20],
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePublished {
    pub sender: [u8; 20],
    pub sequence: u64,
    pub nonce: u32,
    pub payload: Vec<u8>,
    pub consistency_level: u8,
}

impl MessagePublished {
    /// The VAA body the guardians sign for this message.
    pub fn observation(&self, emitter_chain: Chain, timestamp: u32) -> Body<&RawMessage> {
        Body {
            timestamp,
            nonce: self.nonce,
            emitter_chain,
            emitter_address: Address::from_evm(self.sender),
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: RawMessage::new(&self.payload),
        }
    }
}

fn word(data: &[u8], index: usize) -> Result<&[u8], Error> {
    data.get(index * WORD..(index + 1) * WORD)
        .ok_or(Error::MalformedLog("log data truncated"))
}

/// Reads an ABI word that must fit in `N` bytes.
fn uint<const N: usize>(w: &[u8]) -> Result<[u8; N], Error> {
    let (high, low) = w.split_at(WORD - N);
    if high.iter().any(|b| *b != 0) {
        return Err(Error::MalformedLog("integer out of range"));
    }

    let mut out = [0u8; N];
    out.copy_from_slice(low);
    Ok(out)
}

fn usize_word(w: &[u8]) -> Result<usize, Error> {
    Ok(u64::from_be_bytes(uint::<8>(w)?) as usize)
}

/// Decodes a single `LogMessagePublished` event. Returns `Ok(None)` for any other event.
pub fn parse_message_published(log: &EvmLog) -> Result<Option<MessagePublished>, Error> {
    if log.topics.first() != Some(&LOG_MESSAGE_PUBLISHED_TOPIC) {
        return Ok(None);
    }

    let sender = log
        .topics
        .get(1)
        .ok_or(Error::MalformedLog("missing sender topic"))?;
    let sender = uint::<20>(sender)?;

    let data = &log.data;
    let sequence = u64::from_be_bytes(uint(word(data, 0)?)?);
    let nonce = u32::from_be_bytes(uint(word(data, 1)?)?);
    let offset = usize_word(word(data, 2)?)?;
    let consistency_level = uint::<1>(word(data, 3)?)?[0];

    let len_word = data
        .get(offset..)
        .and_then(|tail| tail.get(..WORD))
        .ok_or(Error::MalformedLog("payload offset out of range"))?;
    let len = usize_word(len_word)?;
    let payload = offset
        .checked_add(WORD)
        .and_then(|start| data.get(start..start.checked_add(len)?))
        .ok_or(Error::MalformedLog("payload truncated"))?;

    Ok(Some(MessagePublished {
        sender,
        sequence,
        nonce,
        payload: payload.to_vec(),
        consistency_level,
    }))
}

/// Serialized observations for every Wormhole message in a transaction's logs.
pub fn format_observations(
    logs: &[EvmLog],
    emitter_chain: Chain,
    timestamp: u32,
) -> Result<Vec<Vec<u8>>, Error> {
    let mut observations = Vec::new();
    for log in logs {
        if let Some(msg) = parse_message_published(log)? {
            observations.push(serde_wormhole::to_vec(
                &msg.observation(emitter_chain, timestamp),
            )?);
        }
    }

    if observations.is_empty() {
        return Err(Error::NoMessages);
    }

    Ok(observations)
}

#[cfg(test)]
mod test {
    use sha3::{Digest, Keccak256};

    use super::*;

    fn uint_word(v: u64) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&v.to_be_bytes());
        w
    }

    fn message_log(sender: [u8; 20], sequence: u64, payload: &[u8]) -> EvmLog {
        let mut data = Vec::new();
        data.extend_from_slice(&uint_word(sequence));
        data.extend_from_slice(&uint_word(42));
        data.extend_from_slice(&uint_word(4 * 32));
        data.extend_from_slice(&uint_word(200));
        data.extend_from_slice(&uint_word(payload.len() as u64));
        data.extend_from_slice(payload);
        data.resize(data.len() + (32 - payload.len() % 32) % 32, 0);

        EvmLog {
            address: [0xc0; 20],
            topics: vec![
                LOG_MESSAGE_PUBLISHED_TOPIC,
                Address::from_evm(sender).0,
            ],
            data,
        }
    }

    #[test]
    fn topic() {
        let expected: [u8; 32] =
            Keccak256::digest(LOG_MESSAGE_PUBLISHED_SIGNATURE.as_bytes()).into();
        assert_eq!(LOG_MESSAGE_PUBLISHED_TOPIC, expected);
    }

    #[test]
    fn parse_event() {
        let payload = b"\x01\x00\x05hello";
        let log = message_log([0xab; 20], 7, payload);

        let msg = parse_message_published(&log).unwrap().unwrap();
        assert_eq!(msg.sender, [0xab; 20]);
        assert_eq!(msg.sequence, 7);
        assert_eq!(msg.nonce, 42);
        assert_eq!(msg.consistency_level, 200);
        assert_eq!(msg.payload, payload);
    }

    #[test]
    fn other_events_are_skipped() {
        let mut log = message_log([0xab; 20], 7, b"x");
        log.topics[0] = [0x11; 32];
        assert_eq!(parse_message_published(&log).unwrap(), None);
    }

    #[test]
    fn truncated_data() {
        let mut log = message_log([0xab; 20], 7, b"hello");
        log.data.truncate(5 * 32 + 2);
        assert!(matches!(
            parse_message_published(&log),
            Err(Error::MalformedLog(_))
        ));
    }

    #[test]
    fn observation_layout() {
        let logs = [
            message_log([0xab; 20], 3, b"hi"),
            EvmLog::default(),
            message_log([0xcd; 20], 4, b""),
        ];

        let observations = format_observations(&logs, Chain::Ethereum, 1_700_000_000).unwrap();
        assert_eq!(observations.len(), 2);

        let first = &observations[0];
        assert_eq!(first.len(), 51 + 2);
        assert_eq!(&first[0..4], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&first[4..8], &42u32.to_be_bytes());
        assert_eq!(&first[8..10], &2u16.to_be_bytes());
        assert_eq!(&first[10..42], &Address::from_evm([0xab; 20]).0);
        assert_eq!(&first[42..50], &3u64.to_be_bytes());
        assert_eq!(first[50], 200);
        assert_eq!(&first[51..], b"hi");

        assert_eq!(observations[1].len(), 51);
    }

    #[test]
    fn no_messages() {
        assert!(matches!(
            format_observations(&[EvmLog::default()], Chain::Ethereum, 0),
            Err(Error::NoMessages)
        ));
    }
}
