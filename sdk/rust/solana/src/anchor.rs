//! Wire conventions of programs built with Anchor.
//!
//! Anchor prefixes instruction data with `sha256("global:<instruction>")[..8]` and account data
//! with `sha256("account:<Type>")[..8]`. Everything after the prefix is borsh.

use {
    crate::Error,
    borsh::{
        BorshDeserialize,
        BorshSerialize,
    },
    solana_program::hash::hashv,
};

pub const DISCRIMINATOR_LEN: usize = 8;

fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = hashv(&[namespace.as_bytes(), b":", name.as_bytes()]).to_bytes();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

pub fn instruction_discriminator(instruction: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("global", instruction)
}

pub fn account_discriminator(account: &str) -> [u8; DISCRIMINATOR_LEN] {
    discriminator("account", account)
}

/// Builds the data of an Anchor instruction. `args` is serialized as the instruction's
/// arguments in declaration order, so a tuple or a struct with the same field order works.
pub fn instruction_data<T: BorshSerialize>(instruction: &str, args: &T) -> Result<Vec<u8>, Error> {
    let mut data = instruction_discriminator(instruction).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// Decodes an Anchor account. Accounts are often allocated with room to spare, so trailing bytes
/// are ignored.
pub fn deserialize_account<T: BorshDeserialize>(
    account: &'static str,
    data: &[u8],
) -> Result<T, Error> {
    if data.len() < DISCRIMINATOR_LEN || data[..DISCRIMINATOR_LEN] != account_discriminator(account)
    {
        return Err(Error::InvalidDiscriminator(account));
    }

    Ok(T::deserialize(&mut &data[DISCRIMINATOR_LEN..])?)
}

/// Inverse of [`deserialize_account`], used to fabricate account data.
pub fn serialize_account<T: BorshSerialize>(account: &str, value: &T) -> Result<Vec<u8>, Error> {
    let mut data = account_discriminator(account).to_vec();
    value.serialize(&mut data)?;
    Ok(data)
}
