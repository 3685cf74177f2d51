use {
    solana_program::pubkey::Pubkey,
    thiserror::Error as ThisError,
};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("account data is not a {0} account")]
    InvalidDiscriminator(&'static str),

    #[error("failed to (de)serialize account or instruction data: {0}")]
    Serialization(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] scaffolding_core::Error),

    #[error("guardian {0} is not part of the guardian set")]
    UnknownGuardian(u8),

    #[error("guardian set {actual} does not match the VAA's guardian set {expected}")]
    GuardianSetMismatch { expected: u32, actual: u32 },

    #[error("no sequence found in transaction logs")]
    SequenceNotFound,

    #[error("invalid foreign emitter: {0}")]
    InvalidForeignEmitter(&'static str),

    #[error("invalid transfer: {0}")]
    InvalidTransfer(&'static str),

    #[error("transfer is not addressed to Solana (target chain {0})")]
    WrongTargetChain(u16),

    #[error("transfer of a token from chain {0} cannot be redeemed this way")]
    UnexpectedTokenChain(u16),

    #[error("mint {0} is not a wrapped token")]
    NotWrapped(Pubkey),

    #[error("collection mint cannot be the default pubkey")]
    ZeroCollectionMint,

    #[error("NFT burn bridging is paused")]
    Paused,

    #[error("NFT burn bridging already has paused = {0}")]
    AlreadyInState(bool),

    #[error("NFT with token id {0} is not yet whitelisted")]
    NotWhitelisted(u16),

    #[error("whitelist has {actual} entries but the instance expects {expected}")]
    WhitelistLengthMismatch { expected: usize, actual: usize },

    #[error("whitelisting is disabled for this collection")]
    WhitelistDisabled,
}
