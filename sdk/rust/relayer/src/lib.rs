//! Relays HelloWorld messages from one chain to another.
//!
//! The flow is the one every Wormhole integration follows: a contract emits a message, the
//! guardians observe and sign it, and a relayer carries the signed VAA to the target chain.
//! Contracts are reached through [`HelloWorldContract`] and signed VAAs through [`VaaSource`],
//! so the same [`relay`] runs against a local validator, the guardian REST API or the mocks.

pub mod config;
mod contract;
pub mod deploy;
mod guardian;
pub mod mock;
mod relay;
pub mod solana;

pub use {
    contract::HelloWorldContract,
    guardian::{
        GuardianClient,
        VaaSource,
    },
    relay::relay,
};
