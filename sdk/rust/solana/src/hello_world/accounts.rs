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
        Address,
        Chain,
    },
    solana_program::pubkey::Pubkey,
};

/// Core bridge accounts the program posts its messages with.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct WormholeAddresses {
    pub bridge:        Pubkey,
    pub fee_collector: Pubkey,
    pub sequence:      Pubkey,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Config {
    /// Program's owner, the only one allowed to register foreign emitters.
    pub owner:    Pubkey,
    pub wormhole: WormholeAddresses,
    /// AKA nonce. Only relevant for batch VAAs.
    pub batch_id: u32,
    /// Consistency level requested for outbound messages.
    pub finality: u8,
}

impl Account for Config {
    type Seeds = ();
    type Output = Pubkey;

    fn key(program_id: &Pubkey, _: ()) -> Pubkey {
        Pubkey::find_program_address(&[b"config"], program_id).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("Config", data)
    }
}

/// The HelloWorld contract on another chain that this program accepts messages from.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct ForeignEmitter {
    pub chain:   u16,
    pub address: [u8; 32],
}

impl ForeignEmitter {
    pub fn verify(&self, address: &Address) -> bool {
        address.0 == self.address
    }
}

impl Account for ForeignEmitter {
    type Seeds = Chain;
    type Output = Pubkey;

    fn key(program_id: &Pubkey, chain: Chain) -> Pubkey {
        Pubkey::find_program_address(
            &[b"foreign_emitter", &u16::from(chain).to_le_bytes()],
            program_id,
        )
        .0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("ForeignEmitter", data)
    }
}

/// Created for every message the program receives, which also keeps a VAA from being replayed.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Received {
    pub batch_id:              u32,
    pub wormhole_message_hash: [u8; 32],
    pub message:               Vec<u8>,
}

impl Account for Received {
    /// Emitter chain and sequence of the received VAA.
    type Seeds = (Chain, u64);
    type Output = Pubkey;

    fn key(program_id: &Pubkey, (chain, sequence): (Chain, u64)) -> Pubkey {
        Pubkey::find_program_address(
            &[
                b"received",
                &u16::from(chain).to_le_bytes(),
                &sequence.to_le_bytes(),
            ],
            program_id,
        )
        .0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("Received", data)
    }
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct WormholeEmitter {
    pub bump: u8,
}

impl Account for WormholeEmitter {
    type Seeds = ();
    type Output = Pubkey;

    fn key(program_id: &Pubkey, _: ()) -> Pubkey {
        crate::wormhole::emitter(program_id).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("WormholeEmitter", data)
    }
}

/// Account the core bridge writes the program's message with `sequence` to.
pub fn wormhole_message(program_id: &Pubkey, sequence: u64) -> Pubkey {
    Pubkey::find_program_address(&[b"sent", &sequence.to_le_bytes()], program_id).0
}
