//! Accounts of the Wormhole token bridge that HelloToken passes through when it sends or redeems
//! transfers with payload.

use {
    crate::{
        wormhole,
        Account,
        Error,
    },
    borsh::{
        BorshDeserialize,
        BorshSerialize,
    },
    scaffolding_core::{
        Address,
        Chain,
    },
    solana_program::pubkey::Pubkey,
};

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Config {
    pub wormhole_bridge: Pubkey,
}

impl Account for Config {
    type Seeds = ();
    type Output = Pubkey;

    fn key(token_bridge: &Pubkey, _: ()) -> Pubkey {
        Pubkey::find_program_address(&[b"config"], token_bridge).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

/// Origin of a wrapped mint.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct WrappedMeta {
    pub chain:             u16,
    pub token_address:     [u8; 32],
    pub original_decimals: u8,
}

impl Account for WrappedMeta {
    /// The wrapped mint.
    type Seeds = Pubkey;
    type Output = Pubkey;

    fn key(token_bridge: &Pubkey, mint: Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[b"meta", mint.as_ref()], token_bridge).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

/// A foreign token bridge the Solana token bridge accepts transfers from.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct EndpointRegistration {
    pub emitter_chain:   u16,
    pub emitter_address: [u8; 32],
}

impl Account for EndpointRegistration {
    type Seeds = (Chain, Address);
    type Output = Pubkey;

    fn key(token_bridge: &Pubkey, (chain, address): (Chain, Address)) -> Pubkey {
        Pubkey::find_program_address(
            &[&u16::from(chain).to_be_bytes(), address.0.as_ref()],
            token_bridge,
        )
        .0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

pub fn authority_signer(token_bridge: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"authority_signer"], token_bridge).0
}

pub fn custody_signer(token_bridge: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"custody_signer"], token_bridge).0
}

pub fn mint_authority(token_bridge: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"mint_signer"], token_bridge).0
}

/// Holds the native tokens locked by outbound transfers.
pub fn custody_token_account(token_bridge: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[mint.as_ref()], token_bridge).0
}

pub fn wrapped_mint(token_bridge: &Pubkey, token_chain: Chain, token_address: &Address) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"wrapped",
            &u16::from(token_chain).to_be_bytes(),
            token_address.0.as_ref(),
        ],
        token_bridge,
    )
    .0
}

pub fn emitter(token_bridge: &Pubkey) -> Pubkey {
    wormhole::emitter(token_bridge).0
}

/// Signs transfers with payload on behalf of an integrating program. The token bridge uses it as
/// the sender address of the transfer.
pub fn sender(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"sender"], program_id).0
}

/// Must sign the redemption of transfers with payload addressed to an integrating program.
pub fn redeemer(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"redeemer"], program_id).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_mints_are_keyed_by_origin() {
        let token_bridge = Pubkey::new_unique();
        let weth = Address::from_evm([0xc0; 20]);

        let mint = wrapped_mint(&token_bridge, Chain::Ethereum, &weth);
        assert_eq!(mint, wrapped_mint(&token_bridge, Chain::Ethereum, &weth));
        assert_ne!(mint, wrapped_mint(&token_bridge, Chain::Avalanche, &weth));
        assert_ne!(
            WrappedMeta::key(&token_bridge, mint),
            custody_token_account(&token_bridge, &mint)
        );
    }

    #[test]
    fn endpoint_seeds() {
        let token_bridge = Pubkey::new_unique();
        let address = Address([9; 32]);

        assert_eq!(
            EndpointRegistration::key(&token_bridge, (Chain::Ethereum, address)),
            Pubkey::find_program_address(&[&[0u8, 2], &[9u8; 32]], &token_bridge).0
        );
    }

    #[test]
    fn decoders() {
        let meta = WrappedMeta {
            chain:             2,
            token_address:     [1; 32],
            original_decimals: 18,
        };
        let data = borsh::to_vec(&meta).unwrap();
        assert_eq!(data.len(), 35);
        assert_eq!(WrappedMeta::get(&data).unwrap(), meta);

        let config = Config {
            wormhole_bridge: Pubkey::new_unique(),
        };
        assert_eq!(
            Config::get(&borsh::to_vec(&config).unwrap()).unwrap(),
            config
        );

        assert!(EndpointRegistration::get(&[2, 0]).is_err());
    }

    #[test]
    fn program_signers() {
        let program = Pubkey::new_unique();
        assert_ne!(sender(&program), redeemer(&program));
        assert_eq!(
            emitter(&program),
            Pubkey::find_program_address(&[b"emitter"], &program).0
        );
    }
}
