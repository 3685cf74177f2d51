//! Client side of the NFT burn bridging program. Holders of an NFT from a verified Metaplex
//! collection burn it on Solana and the program emits a Wormhole message naming the token id
//! and the EVM wallet that should receive the NFT on the other side.
//!
//! Each collection gets its own [`Instance`], which also acts as the Wormhole emitter for the
//! collection's messages.

use {
    crate::{
        anchor,
        master_edition_address,
        metadata_address,
        token_record_address,
        wormhole::{
            self,
            BridgeData,
            SequenceTracker,
        },
        Account,
        Error,
        METADATA_PROGRAM_ID,
        TOKEN_PROGRAM_ID,
    },
    borsh::{
        BorshDeserialize,
        BorshSerialize,
    },
    scaffolding_core::nft::{
        self,
        pack_whitelist,
        whitelist_bytes,
    },
    solana_program::{
        instruction::{
            AccountMeta,
            Instruction,
        },
        pubkey::Pubkey,
        sysvar,
    },
    solana_sdk_ids::system_program,
};

#[derive(Debug, Default, Clone, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Instance {
    pub bump:             u8,
    /// Update authority of the collection, the instance's admin.
    pub update_authority: Pubkey,
    pub collection_mint:  Pubkey,
    pub collection_meta:  Pubkey,
    /// May pause the instance and edit the whitelist on behalf of the update authority.
    pub delegate:         Option<Pubkey>,
    pub is_paused:        bool,
    /// Number of token ids in the collection. 0 disables the whitelist.
    pub whitelist_size:   u16,
    pub whitelist:        Vec<u8>,
}

impl Instance {
    pub fn whitelist_enabled(&self) -> bool {
        self.whitelist_size > 0
    }

    pub fn is_whitelisted(&self, token_id: u16) -> Result<bool, Error> {
        Ok(nft::is_whitelisted(
            &self.whitelist,
            self.whitelist_size,
            token_id,
        )?)
    }

    /// Whether the NFT with `token_id` may currently be burned and sent.
    pub fn check_bridgeable(&self, token_id: u16) -> Result<(), Error> {
        if self.is_paused {
            return Err(Error::Paused);
        }
        if self.whitelist_enabled() && !self.is_whitelisted(token_id)? {
            return Err(Error::NotWhitelisted(token_id));
        }
        Ok(())
    }

    /// Signers the program accepts for pausing and whitelisting.
    pub fn is_authority(&self, authority: &Pubkey) -> bool {
        *authority == self.update_authority || self.delegate.as_ref() == Some(authority)
    }
}

impl Account for Instance {
    /// The collection mint.
    type Seeds = Pubkey;
    type Output = Pubkey;

    fn key(program_id: &Pubkey, collection_mint: Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[b"instance", collection_mint.as_ref()], program_id).0
    }

    fn get(data: &[u8]) -> Result<Self, Error> {
        anchor::deserialize_account("Instance", data)
    }
}

/// An NFT about to be burned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nft {
    pub owner:        Pubkey,
    /// Token account holding the NFT.
    pub token:        Pubkey,
    pub mint:         Pubkey,
    /// Metadata uri, `.../<token_id>.json`.
    pub uri:          String,
    /// Programmable NFTs are burned together with their token record.
    pub programmable: bool,
}

/// Builds the instructions of one NFT burn bridging instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftBurnBridging {
    pub program_id:      Pubkey,
    pub collection_mint: Pubkey,
    pub wormhole:        Pubkey,
}

impl NftBurnBridging {
    pub fn new(
        program_id: Pubkey,
        collection_mint: Pubkey,
        wormhole: Pubkey,
    ) -> Result<Self, Error> {
        if collection_mint == Pubkey::default() {
            return Err(Error::ZeroCollectionMint);
        }

        Ok(NftBurnBridging {
            program_id,
            collection_mint,
            wormhole,
        })
    }

    pub fn instance_address(&self) -> Pubkey {
        Instance::key(&self.program_id, self.collection_mint)
    }

    /// Account the core bridge writes the message for burning `nft_mint` to. Every NFT can only
    /// be burned once, so the mint is a unique seed.
    pub fn message_address(&self, nft_mint: &Pubkey) -> Pubkey {
        Pubkey::find_program_address(&[b"message", nft_mint.as_ref()], &self.program_id).0
    }

    /// Sequence tracker of the instance, which is the emitter of its messages.
    pub fn sequence_address(&self) -> Pubkey {
        SequenceTracker::key(&self.wormhole, self.instance_address())
    }

    /// Must also be signed by the collection's update authority.
    pub fn initialize(
        &self,
        payer: Pubkey,
        update_authority: Pubkey,
        whitelist_size: u16,
    ) -> Result<Instruction, Error> {
        Ok(Instruction {
            program_id: self.program_id,
            accounts:   vec![
                AccountMeta::new(self.instance_address(), false),
                AccountMeta::new(payer, true),
                AccountMeta::new(update_authority, true),
                AccountMeta::new_readonly(self.collection_mint, false),
                AccountMeta::new_readonly(metadata_address(&self.collection_mint), false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data:       anchor::instruction_data("initialize", &whitelist_size)?,
        })
    }

    /// Signed by the update authority. `None` removes the delegate.
    pub fn set_delegate(
        &self,
        instance: &Instance,
        delegate: Option<Pubkey>,
    ) -> Result<Instruction, Error> {
        Ok(Instruction {
            program_id: self.program_id,
            accounts:   vec![
                AccountMeta::new(self.instance_address(), false),
                AccountMeta::new_readonly(instance.update_authority, true),
            ],
            data:       anchor::instruction_data("set_delegate", &delegate)?,
        })
    }

    pub fn set_paused(
        &self,
        instance: &Instance,
        authority: Pubkey,
        pause: bool,
    ) -> Result<Instruction, Error> {
        if instance.is_paused == pause {
            return Err(Error::AlreadyInState(pause));
        }

        self.admin_instruction(authority, "set_paused", &pause)
    }

    /// Adds `token_ids` to the whitelist.
    pub fn whitelist(
        &self,
        instance: &Instance,
        authority: Pubkey,
        token_ids: &[u16],
    ) -> Result<Instruction, Error> {
        if !instance.whitelist_enabled() {
            return Err(Error::WhitelistDisabled);
        }
        for id in token_ids {
            nft::check_token_id(instance.whitelist_size, *id)?;
        }

        self.admin_instruction(authority, "whitelist", &token_ids.to_vec())
    }

    /// Overwrites the whole whitelist with one flag per token id. The bitmap is split over as
    /// many instructions as needed to keep each one within a transaction.
    pub fn whitelist_bulk_instructions(
        &self,
        instance: &Instance,
        authority: Pubkey,
        flags: &[bool],
    ) -> Result<Vec<Instruction>, Error> {
        if !instance.whitelist_enabled() {
            return Err(Error::WhitelistDisabled);
        }
        if flags.len() != instance.whitelist_size as usize {
            return Err(Error::WhitelistLengthMismatch {
                expected: instance.whitelist_size as usize,
                actual:   flags.len(),
            });
        }

        let chunks = pack_whitelist(flags);
        log::debug!(
            "whitelisting {} token ids ({} bytes) in {} instructions",
            flags.len(),
            whitelist_bytes(instance.whitelist_size),
            chunks.len()
        );
        chunks
            .into_iter()
            .map(|chunk| self.admin_instruction(authority, "whitelist_bulk", &chunk))
            .collect()
    }

    fn admin_instruction<T: BorshSerialize>(
        &self,
        authority: Pubkey,
        name: &str,
        args: &T,
    ) -> Result<Instruction, Error> {
        Ok(Instruction {
            program_id: self.program_id,
            accounts:   vec![
                AccountMeta::new(self.instance_address(), false),
                AccountMeta::new_readonly(authority, true),
            ],
            data:       anchor::instruction_data(name, args)?,
        })
    }

    /// Burns `nft` and emits a message for `evm_recipient`. Must also be signed by the NFT's owner.
    pub fn burn_and_send(
        &self,
        instance: &Instance,
        payer: Pubkey,
        nft: &Nft,
        evm_recipient: [u8; 20],
    ) -> Result<Instruction, Error> {
        let token_id = nft::token_id_from_uri(&nft.uri)?;
        instance.check_bridgeable(token_id)?;

        // The program ignores the token record of non-programmable NFTs, but it must be writable.
        let token_record = if nft.programmable {
            token_record_address(&nft.mint, &nft.token)
        } else {
            nft.token
        };

        Ok(Instruction {
            program_id: self.program_id,
            accounts:   vec![
                AccountMeta::new(self.instance_address(), false),
                AccountMeta::new(payer, true),
                AccountMeta::new(nft.owner, true),
                AccountMeta::new(nft.token, false),
                AccountMeta::new(nft.mint, false),
                AccountMeta::new(metadata_address(&nft.mint), false),
                AccountMeta::new(master_edition_address(&nft.mint), false),
                AccountMeta::new(metadata_address(&self.collection_mint), false),
                AccountMeta::new(token_record, false),
                AccountMeta::new(self.message_address(&nft.mint), false),
                AccountMeta::new(BridgeData::key(&self.wormhole, ()), false),
                AccountMeta::new(wormhole::fee_collector(&self.wormhole), false),
                AccountMeta::new(self.sequence_address(), false),
                AccountMeta::new_readonly(self.wormhole, false),
                AccountMeta::new_readonly(METADATA_PROGRAM_ID, false),
                AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
                AccountMeta::new_readonly(system_program::id(), false),
                AccountMeta::new_readonly(sysvar::instructions::id(), false),
                AccountMeta::new_readonly(sysvar::clock::id(), false),
                AccountMeta::new_readonly(sysvar::rent::id(), false),
            ],
            data:       anchor::instruction_data("burn_and_send", &evm_recipient)?,
        })
    }
}
