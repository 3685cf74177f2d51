//! The Wormhole core bridge as seen by the programs calling into it.

mod accounts;
mod instructions;

pub use {
    accounts::{
        BridgeConfig,
        BridgeData,
        Claim,
        ClaimSeeds,
        GuardianSet,
        MessageData,
        PostedKind,
        PostedMessage,
        SequenceTracker,
    },
    instructions::{
        post_vaa,
        post_vaa_instructions,
        verify_signatures,
        Instruction,
        PostVAAData,
        PostVaaInstructions,
        VerifySignaturesData,
        MAX_GUARDIANS,
        SIGNATURES_PER_TRANSACTION,
    },
};
use {
    crate::Error,
    solana_program::pubkey::Pubkey,
};

const SEQUENCE_LOG_PREFIX: &str = "Program log: Sequence: ";

/// Collects the message fees paid to the core bridge.
pub fn fee_collector(wormhole: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"fee_collector"], wormhole).0
}

/// The default emitter of a program, a PDA of the emitting program itself.
pub fn emitter(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"emitter"], program_id)
}

/// Reads the sequence the core bridge logs when it posts a message.
pub fn parse_sequence_from_logs<S: AsRef<str>>(logs: &[S]) -> Result<u64, Error> {
    logs.iter()
        .find_map(|line| line.as_ref().strip_prefix(SEQUENCE_LOG_PREFIX))
        .and_then(|sequence| sequence.trim().parse().ok())
        .ok_or(Error::SequenceNotFound)
}
