use {
    crate::Error,
    solana_program::{
        pubkey,
        pubkey::Pubkey,
    },
};

/// SPL token program.
pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// SPL associated token account program.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Metaplex token metadata program.
pub const METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Account provides helpers for deriving keys and decoding the data of the accounts the scaffolding
/// programs and the Wormhole programs they call own.
pub trait Account: Sized {
    type Seeds;
    type Output;

    fn key(program_id: &Pubkey, seeds: Self::Seeds) -> Self::Output;
    fn get(data: &[u8]) -> Result<Self, Error>;
}

pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

/// Metaplex metadata account of a mint.
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"metadata", METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    )
    .0
}

pub fn master_edition_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            b"edition",
        ],
        &METADATA_PROGRAM_ID,
    )
    .0
}

/// Token record of a programmable NFT held in `token`.
pub fn token_record_address(mint: &Pubkey, token: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            b"token_record",
            token.as_ref(),
        ],
        &METADATA_PROGRAM_ID,
    )
    .0
}
