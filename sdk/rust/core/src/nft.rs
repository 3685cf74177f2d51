//! Message and whitelist helpers for bridging NFTs by burning them.
//!
//! Every NFT in a collection is identified by a token id, taken from its metadata uri
//! (`https://metadata.url/<token_id>.json`). A collection may restrict which token ids can be
//! bridged with a bitmap whitelist holding one bit per token id, least significant bit first.

use crate::Error;

/// Bytes of whitelist bitmap that fit into a single `whitelist_bulk` transaction.
pub const WHITELIST_BULK_CHUNK_BYTES: usize = 990;

/// Emitted when an NFT is burned: `token_id u16 BE | evm_recipient [u8; 20]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BurnMessage {
    pub token_id: u16,
    pub evm_recipient: [u8; 20],
}

impl BurnMessage {
    pub const LEN: usize = 22;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.token_id.to_be_bytes());
        out.extend_from_slice(&self.evm_recipient);
        out
    }

    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() != Self::LEN {
            return Err(Error::PayloadLengthMismatch {
                declared: Self::LEN,
                actual: payload.len(),
            });
        }

        let mut evm_recipient = [0u8; 20];
        evm_recipient.copy_from_slice(&payload[2..]);
        Ok(BurnMessage {
            token_id: u16::from_be_bytes([payload[0], payload[1]]),
            evm_recipient,
        })
    }
}

/// Size of the whitelist bitmap for a collection of `whitelist_size` token ids.
pub fn whitelist_bytes(whitelist_size: u16) -> usize {
    (whitelist_size as usize + 7) / 8
}

pub fn check_token_id(whitelist_size: u16, token_id: u16) -> Result<(), Error> {
    if token_id >= whitelist_size {
        return Err(Error::TokenIdOutOfBounds(token_id));
    }
    Ok(())
}

pub fn is_whitelisted(whitelist: &[u8], whitelist_size: u16, token_id: u16) -> Result<bool, Error> {
    check_token_id(whitelist_size, token_id)?;
    let byte = whitelist
        .get(token_id as usize / 8)
        .ok_or(Error::TokenIdOutOfBounds(token_id))?;
    Ok(byte & (1u8 << (token_id % 8)) > 0)
}

/// Extracts the token id from a metadata uri. Metaplex pads uris with trailing NULs, so the id
/// ends at the first `.json` after the last `/`.
pub fn token_id_from_uri(uri: &str) -> Result<u16, Error> {
    let invalid = || Error::InvalidTokenUri(uri.trim_end_matches('\0').to_owned());

    let start = uri.rfind('/').map(|i| i + 1).unwrap_or(0);
    let tail = &uri[start..];
    let end = tail.find(".json").ok_or_else(invalid)?;
    tail[..end].parse().map_err(|_| invalid())
}

/// Packs one flag per token id into `whitelist_bulk` chunks of at most
/// [`WHITELIST_BULK_CHUNK_BYTES`] bytes. Each chunk carries the byte offset it is written at.
pub fn pack_whitelist(flags: &[bool]) -> Vec<(u16, Vec<u8>)> {
    flags
        .chunks(WHITELIST_BULK_CHUNK_BYTES * 8)
        .enumerate()
        .map(|(chunk, slice)| {
            let bytes = slice
                .chunks(8)
                .map(|bits| {
                    bits.iter()
                        .enumerate()
                        .fold(0u8, |acc, (bit, set)| acc | ((*set as u8) << bit))
                })
                .collect();
            ((chunk * WHITELIST_BULK_CHUNK_BYTES) as u16, bytes)
        })
        .collect()
}
