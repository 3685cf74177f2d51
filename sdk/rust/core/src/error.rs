use thiserror::Error as ThisError;

/// Errors produced while parsing or building scaffolding payloads.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unsupported VAA version {0}")]
    InvalidVersion(u8),

    #[error("malformed VAA: {0}")]
    MalformedVaa(#[from] serde_wormhole::Error),

    #[error("payload too short: {0} bytes")]
    PayloadTooShort(usize),

    #[error("payload length mismatch: declared {declared}, found {actual}")]
    PayloadLengthMismatch { declared: usize, actual: usize },

    #[error("unknown payload id {0}")]
    UnknownPayloadId(u8),

    #[error(
        "message of {0} bytes exceeds the maximum of {max}",
        max = crate::hello_world::MESSAGE_MAX_LENGTH
    )]
    MessageTooLarge(usize),

    #[error("amount overflow")]
    AmountOverflow,

    #[error("relayer fee precision must be nonzero")]
    ZeroFeePrecision,

    #[error("relayer fee {fee} exceeds precision {precision}")]
    FeeExceedsPrecision { fee: u32, precision: u32 },

    #[error("no Wormhole messages found")]
    NoMessages,

    #[error("malformed EVM log: {0}")]
    MalformedLog(&'static str),

    #[error("malformed Sui event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("token id {0} is out of bounds")]
    TokenIdOutOfBounds(u16),

    #[error("invalid token uri: {0}")]
    InvalidTokenUri(String),
}
