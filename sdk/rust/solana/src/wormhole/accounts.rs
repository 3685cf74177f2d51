//! Accounts owned by the Wormhole core bridge. None of them carry an Anchor discriminator.

use {
    crate::{
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
pub struct BridgeConfig {
    /// Period for how long a guardian set is valid after it has been replaced by a new one.
    pub guardian_set_expiration_time: u32,
    /// Amount of lamports that needs to be paid to the protocol to post a message.
    pub fee:                          u64,
}

/// The `["Bridge"]` account.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct BridgeData {
    /// The current guardian set index, used to decide which signature sets to accept.
    pub guardian_set_index: u32,
    /// Lamports in the fee collector the last time a fee was collected.
    pub last_lamports:      u64,
    pub config:             BridgeConfig,
}

impl Account for BridgeData {
    type Seeds = ();
    type Output = Pubkey;

    fn key(wormhole: &Pubkey, _: ()) -> Pubkey {
        Pubkey::find_program_address(&[b"Bridge"], wormhole).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct GuardianSet {
    /// Index representing an incrementing version number for this guardian set.
    pub index:           u32,
    /// ETH style public keys.
    pub keys:            Vec<[u8; 20]>,
    pub creation_time:   u32,
    /// Expiration time when VAAs issued by this set are no longer valid.
    pub expiration_time: u32,
}

impl Account for GuardianSet {
    type Seeds = u32;
    type Output = Pubkey;

    fn key(wormhole: &Pubkey, index: u32) -> Pubkey {
        Pubkey::find_program_address(&[b"GuardianSet", &index.to_be_bytes()], wormhole).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

/// Counts the messages an emitter has posted.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct SequenceTracker {
    pub sequence: u64,
}

impl SequenceTracker {
    /// Sequence the emitter's next message will be posted with.
    pub fn next_value(&self) -> u64 {
        self.sequence + 1
    }
}

impl Account for SequenceTracker {
    type Seeds = Pubkey;
    type Output = Pubkey;

    fn key(wormhole: &Pubkey, emitter: Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[b"Sequence", emitter.as_ref()], wormhole).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}

/// Body shared by posted messages and posted VAAs. The field order differs from the VAA wire
/// format, and signatures are replaced by the key of the signature set that verified them.
#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct MessageData {
    pub vaa_version:       u8,
    pub consistency_level: u8,
    pub vaa_time:          u32,
    pub vaa_signature_account: Pubkey,
    pub submission_time:   u32,
    pub nonce:             u32,
    pub sequence:          u64,
    pub emitter_chain:     u16,
    pub emitter_address:   [u8; 32],
    pub payload:           Vec<u8>,
}

impl MessageData {
    pub fn emitter_chain(&self) -> Chain {
        Chain::from(self.emitter_chain)
    }

    pub fn emitter_address(&self) -> Address {
        Address(self.emitter_address)
    }
}

/// The account prefix tells posted VAAs apart from the messages an emitter posted.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PostedKind {
    Vaa,
    Message,
    UnreliableMessage,
}

impl PostedKind {
    fn magic(self) -> &'static [u8; 3] {
        match self {
            PostedKind::Vaa => b"vaa",
            PostedKind::Message => b"msg",
            PostedKind::UnreliableMessage => b"msu",
        }
    }

    fn from_magic(magic: &[u8]) -> Option<Self> {
        [
            PostedKind::Vaa,
            PostedKind::Message,
            PostedKind::UnreliableMessage,
        ]
        .into_iter()
        .find(|kind| kind.magic() == magic)
    }
}

/// A message posted by an emitter, or a VAA posted after its signatures were verified.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PostedMessage {
    pub kind:    PostedKind,
    pub message: MessageData,
}

impl PostedMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut data = self.kind.magic().to_vec();
        self.message.serialize(&mut data)?;
        Ok(data)
    }
}

impl Account for PostedMessage {
    /// Hash of the VAA body.
    type Seeds = [u8; 32];
    type Output = Pubkey;

    /// Key of a posted VAA. Messages are posted to accounts chosen by the emitter.
    fn key(wormhole: &Pubkey, vaa_hash: [u8; 32]) -> Pubkey {
        Pubkey::find_program_address(&[b"PostedVAA", &vaa_hash], wormhole).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        let kind = data
            .get(..3)
            .and_then(PostedKind::from_magic)
            .ok_or(Error::InvalidDiscriminator("PostedMessage"))?;

        Ok(PostedMessage {
            kind,
            message: MessageData::deserialize(&mut &data[3..])?,
        })
    }
}

/// Marks a VAA as redeemed by the program it was addressed to.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Claim {
    pub claimed: bool,
}

pub struct ClaimSeeds {
    pub emitter_address: Address,
    pub emitter_chain:   Chain,
    pub sequence:        u64,
}

impl Account for Claim {
    type Seeds = ClaimSeeds;
    type Output = Pubkey;

    /// Claims live on the program redeeming the VAA, not on the core bridge.
    fn key(program_id: &Pubkey, seeds: ClaimSeeds) -> Pubkey {
        Pubkey::find_program_address(
            &[
                seeds.emitter_address.0.as_ref(),
                &u16::from(seeds.emitter_chain).to_be_bytes(),
                &seeds.sequence.to_be_bytes(),
            ],
            program_id,
        )
        .0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::deserialize(&mut &data[..])?)
    }
}
