//! Instructions for posting a signed VAA to the core bridge.
//!
//! Solana transactions are too small to verify a full guardian quorum at once. Signatures are
//! checked by the secp256k1 native program in batches of [`SIGNATURES_PER_TRANSACTION`], each
//! batch followed by a `verify_signatures` instruction recording the result in a signature set
//! account. Once the signature set holds a quorum, `post_vaa` creates the posted VAA account.

use {
    super::accounts::{
        BridgeData,
        GuardianSet,
        PostedMessage,
    },
    crate::{
        Account,
        Error,
    },
    borsh::{
        BorshDeserialize,
        BorshSerialize,
    },
    byteorder::{
        BigEndian,
        LittleEndian,
        WriteBytesExt,
    },
    scaffolding_core::vaa,
    serde_wormhole::RawMessage,
    solana_program::{
        instruction::{
            AccountMeta,
            Instruction as SolanaInstruction,
        },
        keccak,
        pubkey::Pubkey,
        secp256k1_program,
        sysvar,
    },
    solana_sdk_ids::system_program,
    std::io::Write,
};

pub const SIGNATURES_PER_TRANSACTION: usize = 7;

/// Signer slots of a signature set, one per guardian.
pub const MAX_GUARDIANS: usize = 19;

const SIGNATURE_OFFSETS_LEN: usize = 11;
const SIGNATURE_AND_KEY_LEN: usize = 65 + 20;

/// Instruction ids of the core bridge. Only `PostVAA` and `VerifySignatures` are built here, the
/// rest keep the numbering intact.
#[repr(u8)]
#[derive(Debug, Clone, Copy, BorshSerialize, BorshDeserialize)]
pub enum Instruction {
    Initialize,
    PostMessage,
    PostVAA,
    SetFees,
    TransferFees,
    UpgradeContract,
    UpgradeGuardianSet,
    VerifySignatures,
    PostMessageUnreliable,
}

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct PostVAAData {
    // Header part
    pub version:            u8,
    pub guardian_set_index: u32,

    // Body part
    pub timestamp:         u32,
    pub nonce:             u32,
    pub emitter_chain:     u16,
    pub emitter_address:   [u8; 32],
    pub sequence:          u64,
    pub consistency_level: u8,
    pub payload:           Vec<u8>,
}

impl PostVAAData {
    /// Keccak256 of the VAA body, the seed of the posted VAA account.
    pub fn hash(&self) -> Result<[u8; 32], Error> {
        let mut body = Vec::with_capacity(51 + self.payload.len());
        body.write_u32::<BigEndian>(self.timestamp)?;
        body.write_u32::<BigEndian>(self.nonce)?;
        body.write_u16::<BigEndian>(self.emitter_chain)?;
        body.write_all(&self.emitter_address)?;
        body.write_u64::<BigEndian>(self.sequence)?;
        body.write_u8(self.consistency_level)?;
        body.write_all(&self.payload)?;

        Ok(keccak::hash(&body).to_bytes())
    }
}

impl From<&vaa::Vaa<&RawMessage>> for PostVAAData {
    fn from(vaa: &vaa::Vaa<&RawMessage>) -> Self {
        PostVAAData {
            version:            vaa.version,
            guardian_set_index: vaa.guardian_set_index,
            timestamp:          vaa.timestamp,
            nonce:              vaa.nonce,
            emitter_chain:      vaa.emitter_chain.into(),
            emitter_address:    vaa.emitter_address.0,
            sequence:           vaa.sequence,
            consistency_level:  vaa.consistency_level,
            payload:            vaa.payload.to_vec(),
        }
    }
}

pub fn post_vaa(
    wormhole: Pubkey,
    payer: Pubkey,
    signature_set: Pubkey,
    post_vaa_data: PostVAAData,
) -> Result<SolanaInstruction, Error> {
    let bridge = BridgeData::key(&wormhole, ());
    let guardian_set = GuardianSet::key(&wormhole, post_vaa_data.guardian_set_index);
    let vaa = PostedMessage::key(&wormhole, post_vaa_data.hash()?);

    Ok(SolanaInstruction {
        program_id: wormhole,
        accounts:   vec![
            AccountMeta::new_readonly(guardian_set, false),
            AccountMeta::new_readonly(bridge, false),
            AccountMeta::new_readonly(signature_set, false),
            AccountMeta::new(vaa, false),
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       borsh::to_vec(&(Instruction::PostVAA, post_vaa_data))?,
    })
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct VerifySignaturesData {
    /// Position of each guardian's signature in the preceding secp256k1 instruction, -1 for
    /// guardians that did not sign in this batch.
    pub signers: [i8; MAX_GUARDIANS],
}

pub fn verify_signatures(
    wormhole: Pubkey,
    payer: Pubkey,
    guardian_set_index: u32,
    signature_set: Pubkey,
    data: VerifySignaturesData,
) -> Result<SolanaInstruction, Error> {
    let guardian_set = GuardianSet::key(&wormhole, guardian_set_index);

    Ok(SolanaInstruction {
        program_id: wormhole,
        accounts:   vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(guardian_set, false),
            AccountMeta::new(signature_set, true),
            AccountMeta::new_readonly(sysvar::instructions::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       borsh::to_vec(&(Instruction::VerifySignatures, data))?,
    })
}

struct SignatureItem<'a> {
    signature: &'a [u8; 65],
    key:       &'a [u8; 20],
    index:     u8,
}

/// Builds the secp256k1 program instruction checking one batch of signatures over `hash`.
///
/// Layout: signature count, an 11 byte offsets record per signature, then `signature | eth
/// address` pairs and finally the signed hash, which every record points at.
fn secp256k1_instruction(
    items: &[SignatureItem],
    hash: &[u8; 32],
) -> Result<SolanaInstruction, Error> {
    let data_offset = 1 + items.len() * SIGNATURE_OFFSETS_LEN;
    let message_offset = data_offset + items.len() * SIGNATURE_AND_KEY_LEN;

    let mut data = Vec::with_capacity(message_offset + hash.len());
    data.write_u8(items.len() as u8)?;

    for i in 0..items.len() {
        let signature_offset = data_offset + SIGNATURE_AND_KEY_LEN * i;
        data.write_u16::<LittleEndian>(signature_offset as u16)?;
        data.write_u8(0)?;
        data.write_u16::<LittleEndian>((signature_offset + 65) as u16)?;
        data.write_u8(0)?;
        data.write_u16::<LittleEndian>(message_offset as u16)?;
        data.write_u16::<LittleEndian>(hash.len() as u16)?;
        data.write_u8(0)?;
    }

    for item in items {
        data.write_all(item.signature)?;
        data.write_all(item.key)?;
    }
    data.write_all(hash)?;

    Ok(SolanaInstruction {
        program_id: secp256k1_program::id(),
        accounts:   vec![],
        data,
    })
}

/// Everything needed to post a signed VAA: each entry of `verify` is sent as its own
/// transaction, followed by a transaction holding `post_vaa`.
#[derive(Debug, Clone)]
pub struct PostVaaInstructions {
    pub verify:   Vec<Vec<SolanaInstruction>>,
    pub post_vaa: SolanaInstruction,
    /// Hash of the VAA body, the seed of the posted VAA account.
    pub hash:     [u8; 32],
}

pub fn post_vaa_instructions(
    wormhole: Pubkey,
    payer: Pubkey,
    signature_set: Pubkey,
    signed_vaa: &[u8],
    guardian_set: &GuardianSet,
) -> Result<PostVaaInstructions, Error> {
    let vaa = vaa::parse(signed_vaa)?;
    if vaa.guardian_set_index != guardian_set.index {
        return Err(Error::GuardianSetMismatch {
            expected: vaa.guardian_set_index,
            actual:   guardian_set.index,
        });
    }

    let items = vaa
        .signatures
        .iter()
        .map(|s| {
            let key = guardian_set
                .keys
                .get(s.index as usize)
                .filter(|_| (s.index as usize) < MAX_GUARDIANS)
                .ok_or(Error::UnknownGuardian(s.index))?;
            Ok(SignatureItem {
                signature: &s.signature,
                key,
                index: s.index,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let post_vaa_data = PostVAAData::from(&vaa);
    let hash = post_vaa_data.hash()?;

    let mut verify = Vec::new();
    for chunk in items.chunks(SIGNATURES_PER_TRANSACTION) {
        let mut signers = [-1i8; MAX_GUARDIANS];
        for (i, item) in chunk.iter().enumerate() {
            signers[item.index as usize] = i as i8;
        }

        verify.push(vec![
            secp256k1_instruction(chunk, &hash)?,
            verify_signatures(
                wormhole,
                payer,
                vaa.guardian_set_index,
                signature_set,
                VerifySignaturesData { signers },
            )?,
        ]);
    }

    log::debug!(
        "posting VAA {} with {} signatures in {} batches",
        hex::encode(hash),
        items.len(),
        verify.len()
    );

    Ok(PostVaaInstructions {
        verify,
        post_vaa: post_vaa(wormhole, payer, signature_set, post_vaa_data)?,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        scaffolding_core::{
            vaa::{
                Signature,
                Vaa,
            },
            Address,
            Chain,
        },
    };

    fn signed_vaa(signers: u8) -> Vec<u8> {
        Vaa {
            version:            1,
            guardian_set_index: 0,
            signatures:         (0..signers)
                .map(|index| Signature {
                    index,
                    signature: [index; 65],
                })
                .collect(),
            timestamp:          1,
            nonce:              2,
            emitter_chain:      Chain::Ethereum,
            emitter_address:    Address([3; 32]),
            sequence:           4,
            consistency_level:  1,
            payload:            RawMessage::new(b"\x01\x00\x02hi"),
        }
        .to_bytes()
        .unwrap()
    }

    fn guardian_set(n: u8) -> GuardianSet {
        GuardianSet {
            index:           0,
            keys:            (0..n).map(|i| [i; 20]).collect(),
            creation_time:   0,
            expiration_time: 0,
        }
    }

    #[test]
    fn hash_matches_vaa_digest() {
        let bytes = signed_vaa(1);
        let vaa = vaa::parse(&bytes).unwrap();

        let data = PostVAAData::from(&vaa);
        assert_eq!(data.hash().unwrap(), vaa.digest().unwrap().hash);
    }

    #[test]
    fn single_batch() {
        let wormhole = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let signature_set = Pubkey::new_unique();

        let ixs =
            post_vaa_instructions(wormhole, payer, signature_set, &signed_vaa(1), &guardian_set(1))
                .unwrap();
        assert_eq!(ixs.verify.len(), 1);

        let secp = &ixs.verify[0][0];
        assert_eq!(secp.program_id, secp256k1_program::id());
        assert_eq!(secp.data.len(), 1 + 11 + 85 + 32);
        assert_eq!(secp.data[0], 1);
        // signature, eth address and message offsets
        assert_eq!(&secp.data[1..3], &12u16.to_le_bytes());
        assert_eq!(&secp.data[4..6], &77u16.to_le_bytes());
        assert_eq!(&secp.data[7..9], &97u16.to_le_bytes());
        assert_eq!(&secp.data[9..11], &32u16.to_le_bytes());
        assert_eq!(&secp.data[12..77], &[0u8; 65]);
        assert_eq!(&secp.data[97..], &ixs.hash);

        let verify = &ixs.verify[0][1];
        assert_eq!(verify.program_id, wormhole);
        assert_eq!(verify.data[0], Instruction::VerifySignatures as u8);
        assert_eq!(verify.data[1], 0);
        assert!(verify.data[2..].iter().all(|b| *b == 0xff));
        assert_eq!(verify.accounts[2].pubkey, signature_set);
        assert!(verify.accounts[2].is_signer);

        let post = &ixs.post_vaa;
        assert_eq!(post.data[0], Instruction::PostVAA as u8);
        assert_eq!(
            post.accounts[3].pubkey,
            PostedMessage::key(&wormhole, ixs.hash)
        );
        assert_eq!(post.accounts[0].pubkey, GuardianSet::key(&wormhole, 0));
    }

    #[test]
    fn signatures_are_batched() {
        let ixs = post_vaa_instructions(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            &signed_vaa(13),
            &guardian_set(19),
        )
        .unwrap();
        assert_eq!(ixs.verify.len(), 2);
        assert_eq!(ixs.verify[0][0].data[0], 7);
        assert_eq!(ixs.verify[1][0].data[0], 6);

        let signers = VerifySignaturesData::deserialize(&mut &ixs.verify[1][1].data[1..]).unwrap();
        assert_eq!(signers.signers[6], -1);
        assert_eq!(signers.signers[7], 0);
        assert_eq!(signers.signers[12], 5);
        assert_eq!(signers.signers[13], -1);
    }

    #[test]
    fn unknown_guardian() {
        assert!(matches!(
            post_vaa_instructions(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                &signed_vaa(3),
                &guardian_set(2),
            ),
            Err(Error::UnknownGuardian(2))
        ));
    }

    #[test]
    fn guardian_set_mismatch() {
        let mut set = guardian_set(1);
        set.index = 1;

        assert!(matches!(
            post_vaa_instructions(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                &signed_vaa(1),
                &set,
            ),
            Err(Error::GuardianSetMismatch {
                expected: 0,
                actual:   1,
            })
        ));
    }
}
