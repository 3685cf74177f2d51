//! VAA's represent a collection of signatures combined with a message and its metadata. A relayer
//! fetches the VAA for a message emitted on one chain and submits it to the contract on another
//! chain, which checks the signatures before acting on the payload.
//!
//! This module only handles the wire format and the digests. Checking the signatures against a
//! guardian set is left to the contracts the VAA is submitted to.

use std::io::Write;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_wormhole::RawMessage;
use sha3::Digest as Sha3Digest;

use crate::{Address, Chain, Error};

/// The only VAA version the guardians currently produce.
pub const VAA_VERSION: u8 = 1;

/// Signatures are typical ECDSA signatures prefixed with a Guardian position. These have the
/// following byte layout:
/// ```markdown
/// 0  .. 64: Signature   (ECDSA)
/// 64 .. 65: Recovery ID (ECDSA)
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    pub index: u8,
    #[serde(with = "crate::serde_array")]
    pub signature: [u8; 65],
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            index: 0,
            signature: [0; 65],
        }
    }
}

/// The core VAA itself. The generic parameter `P` represents the payload, which is usually
/// `&RawMessage` until the caller knows which application produced it.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vaa<P> {
    // `#[serde(flatten)]` would serialize as a map, which the wire format cannot express, so the
    // header and body fields are repeated here and converted with `From`.
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: P,
}

/// The header for a VAA.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Header {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
}

/// The body for a VAA. This is the part the guardians sign.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Body<P> {
    /// Seconds since UNIX epoch.
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: P,
}

/// Digest data for the Body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    /// Keccak256 of the serialized body. Contracts identify a VAA by this hash, and on Solana it
    /// seeds the posted VAA account.
    pub hash: [u8; 32],

    /// Keccak256 of `hash`. secp256k1 signers hash their input before signing, so this is the
    /// value guardians actually sign and the value `ecrecover` expects.
    pub secp256k_hash: [u8; 32],
}

/// Calculates the digest for an already serialized VAA body.
pub fn digest(body: &[u8]) -> anyhow::Result<Digest> {
    let hash: [u8; 32] = {
        let mut h = sha3::Keccak256::default();
        h.write_all(body).context("failed to hash body")?;
        h.finalize().into()
    };

    Ok(Digest {
        hash,
        secp256k_hash: sha3::Keccak256::digest(hash).into(),
    })
}

/// Parses a signed VAA, deferring the interpretation of the payload.
///
/// Only version 1 VAA's are accepted. The payload borrows everything after the body fields, so
/// truncated input is the only way for the wire format itself to be rejected.
pub fn parse(bytes: &[u8]) -> Result<Vaa<&RawMessage>, Error> {
    if let Some(version) = bytes.first() {
        if *version != VAA_VERSION {
            return Err(Error::InvalidVersion(*version));
        }
    }

    Ok(serde_wormhole::from_slice(bytes)?)
}

impl<P> From<Vaa<P>> for (Header, Body<P>) {
    fn from(v: Vaa<P>) -> Self {
        (
            Header {
                version: v.version,
                guardian_set_index: v.guardian_set_index,
                signatures: v.signatures,
            },
            Body {
                timestamp: v.timestamp,
                nonce: v.nonce,
                emitter_chain: v.emitter_chain,
                emitter_address: v.emitter_address,
                sequence: v.sequence,
                consistency_level: v.consistency_level,
                payload: v.payload,
            },
        )
    }
}

impl<P> From<(Header, Body<P>)> for Vaa<P> {
    fn from((hdr, body): (Header, Body<P>)) -> Self {
        Vaa {
            version: hdr.version,
            guardian_set_index: hdr.guardian_set_index,
            signatures: hdr.signatures,
            timestamp: body.timestamp,
            nonce: body.nonce,
            emitter_chain: body.emitter_chain,
            emitter_address: body.emitter_address,
            sequence: body.sequence,
            consistency_level: body.consistency_level,
            payload: body.payload,
        }
    }
}

impl<P> Vaa<P> {
    /// Borrows the signed part of the VAA.
    pub fn body(&self) -> Body<&P> {
        Body {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: &self.payload,
        }
    }
}

impl<P: Serialize> Vaa<P> {
    pub fn digest(&self) -> anyhow::Result<Digest> {
        self.body().digest()
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_wormhole::to_vec(self).context("failed to serialize VAA")
    }
}

impl<P> Body<P> {
    /// Replace the payload of the body.  Useful when parsing the payload needs to be delayed.
    pub fn with_payload<U>(self, p: U) -> Body<U> {
        Body {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: p,
        }
    }
}

impl<P: Serialize> Body<P> {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_wormhole::to_vec(self).context("failed to serialize body")
    }

    /// Hashes the body without an intermediate buffer.
    #[inline]
    pub fn digest(&self) -> anyhow::Result<Digest> {
        let hash: [u8; 32] = {
            let mut h = sha3::Keccak256::default();
            serde_wormhole::to_writer(&mut h, self).context("failed to serialize body")?;
            h.finalize().into()
        };

        Ok(Digest {
            hash,
            secp256k_hash: sha3::Keccak256::digest(hash).into(),
        })
    }
}
