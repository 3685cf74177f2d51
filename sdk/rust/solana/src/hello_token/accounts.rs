use {
    crate::{
        anchor,
        Account,
        Error,
    },
    borsh::{
        BorshDeserialize,
        BorshSerialize,
    },
    scaffolding_core::{
        token::compute_relayer_fee,
        Chain,
    },
    solana_program::pubkey::Pubkey,
};

/// Token bridge accounts used when sending tokens, cached so callers do not have to derive them.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct OutboundTokenBridgeAddresses {
    pub config:                 Pubkey,
    pub authority_signer:       Pubkey,
    pub custody_signer:         Pubkey,
    pub emitter:                Pubkey,
    pub sequence:               Pubkey,
    pub wormhole_bridge:        Pubkey,
    pub wormhole_fee_collector: Pubkey,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct SenderConfig {
    /// Program's owner, the only one allowed to register foreign contracts.
    pub owner:        Pubkey,
    pub bump:         u8,
    pub token_bridge: OutboundTokenBridgeAddresses,
    pub finality:     u8,
}

impl Account for SenderConfig {
    type Seeds = ();
    type Output = Pubkey;

    /// Also the sender of every transfer the program makes.
    fn key(program_id: &Pubkey, _: ()) -> Pubkey {
        crate::token_bridge::sender(program_id)
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("SenderConfig", data)
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct InboundTokenBridgeAddresses {
    pub config:         Pubkey,
    pub custody_signer: Pubkey,
    pub mint_authority: Pubkey,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct RedeemerConfig {
    pub owner:                 Pubkey,
    pub bump:                  u8,
    pub token_bridge:          InboundTokenBridgeAddresses,
    /// Share of each redeemed amount paid to the relayer, `relayer_fee / relayer_fee_precision`.
    pub relayer_fee:           u32,
    pub relayer_fee_precision: u32,
}

impl RedeemerConfig {
    /// Relayer's cut of a redeemed `amount`.
    pub fn compute_relayer_amount(&self, amount: u64) -> Result<u64, Error> {
        Ok(compute_relayer_fee(
            amount,
            self.relayer_fee,
            self.relayer_fee_precision,
        )?)
    }
}

impl Account for RedeemerConfig {
    type Seeds = ();
    type Output = Pubkey;

    /// Also the redeemer the token bridge requires to sign transfers addressed to the program.
    fn key(program_id: &Pubkey, _: ()) -> Pubkey {
        crate::token_bridge::redeemer(program_id)
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("RedeemerConfig", data)
    }
}

/// A HelloToken contract on another chain, together with the token bridge endpoint that
/// transfers from it arrive through.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct ForeignContract {
    pub chain:                         u16,
    pub address:                       [u8; 32],
    pub token_bridge_foreign_endpoint: Pubkey,
}

impl Account for ForeignContract {
    type Seeds = Chain;
    type Output = Pubkey;

    fn key(program_id: &Pubkey, chain: Chain) -> Pubkey {
        Pubkey::find_program_address(
            &[b"foreign_contract", &u16::from(chain).to_le_bytes()],
            program_id,
        )
        .0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("ForeignContract", data)
    }
}

/// Holds tokens between the payer and the token bridge while a transfer is in flight.
pub fn tmp_token_account(program_id: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"tmp", mint.as_ref()], program_id).0
}

/// Account the core bridge writes the token bridge message with `sequence` to.
pub fn wormhole_message(program_id: &Pubkey, sequence: u64) -> Pubkey {
    Pubkey::find_program_address(&[b"bridged", &sequence.to_le_bytes()], program_id).0
}
