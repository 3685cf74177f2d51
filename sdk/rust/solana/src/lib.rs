//! Solana side of the Wormhole scaffolding example applications.
//!
//! The programs themselves are Anchor programs. This crate only knows how to talk to them: it
//! derives the addresses of the accounts they and the Wormhole programs own, builds their
//! instructions and decodes their account data. It never sends a transaction.

mod accounts;
pub mod anchor;
mod error;
pub mod hello_token;
pub mod hello_world;
pub mod nft_burn_bridging;
pub mod token_bridge;
pub mod wormhole;

pub use {
    accounts::{
        associated_token_address,
        master_edition_address,
        metadata_address,
        token_record_address,
        Account,
        ASSOCIATED_TOKEN_PROGRAM_ID,
        METADATA_PROGRAM_ID,
        TOKEN_PROGRAM_ID,
    },
    error::Error,
};
