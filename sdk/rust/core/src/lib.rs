//! The `core` crate provides the pure Rust primitives shared by the scaffolding example
//! applications.
//!
//! Nothing in here talks to a chain. It includes:
//!
//! - Wormhole addresses, amounts and chain ids.
//! - Parsers and serializers for VAA's and the HelloWorld / HelloToken payloads.
//! - Token bridge payloads and the amount arithmetic used when bridging tokens.
//! - Helpers for turning EVM logs and Sui events into Wormhole observations.

#![deny(unused_results)]

use std::{fmt, str::FromStr};

use primitive_types::U256;
use serde::{Deserialize, Serialize};

mod error;
pub mod evm;
pub mod hello_token;
pub mod hello_world;
pub mod nft;
mod serde_array;
pub mod sui;
pub mod token;
pub mod vaa;

pub use {
    error::Error,
    vaa::Vaa,
    wormhole_supported_chains::Chain,
};

/// Wormhole specifies addresses as 32 bytes. Addresses that are shorter, for example 20 byte
/// Ethereum addresses, are left zero padded to 32.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Left pads a 20 byte EVM address.
    pub fn from_evm(addr: [u8; 20]) -> Self {
        let mut buf = [0u8; 32];
        buf[12..].copy_from_slice(&addr);
        Address(buf)
    }

    /// Parses a hex string of at most 32 bytes, with or without a `0x` prefix. Shorter inputs
    /// are left padded the same way `from_evm` pads EVM addresses.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let s = if s.len() % 2 == 1 {
            format!("0{s}")
        } else {
            s.to_owned()
        };

        let bytes = hex::decode(&s).map_err(|_| Error::InvalidAddress(s.clone()))?;
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(Error::InvalidAddress(s));
        }

        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Address(buf))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Returns the trailing 20 bytes if the address is a padded EVM address.
    pub fn to_evm(&self) -> Option<[u8; 20]> {
        if self.0[..12].iter().any(|b| *b != 0) {
            return None;
        }

        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[12..]);
        Some(out)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }

        Ok(())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

/// Wormhole specifies an amount as a uint256 encoded in big-endian order.
#[derive(
    Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Amount(pub [u8; 32]);

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        Amount(buf)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        U256::from(value).into()
    }
}

impl From<Amount> for U256 {
    fn from(amount: Amount) -> Self {
        U256::from_big_endian(&amount.0)
    }
}
