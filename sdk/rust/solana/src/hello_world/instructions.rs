use {
    super::accounts::{
        wormhole_message,
        Config,
        ForeignEmitter,
        Received,
        WormholeEmitter,
    },
    crate::{
        anchor,
        wormhole::{
            self,
            BridgeData,
            PostVAAData,
            PostedMessage,
            SequenceTracker,
        },
        Account,
        Error,
    },
    scaffolding_core::{
        hello_world::MESSAGE_MAX_LENGTH,
        vaa::Vaa,
        Address,
        Chain,
    },
    serde_wormhole::RawMessage,
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

/// Creates the program's config and posts the first message, which creates the emitter's
/// sequence tracker.
pub fn initialize(
    program_id: Pubkey,
    wormhole: Pubkey,
    owner: Pubkey,
) -> Result<Instruction, Error> {
    let emitter = WormholeEmitter::key(&program_id, ());

    Ok(Instruction {
        program_id,
        accounts:   vec![
            AccountMeta::new(owner, true),
            AccountMeta::new(Config::key(&program_id, ()), false),
            AccountMeta::new_readonly(wormhole, false),
            AccountMeta::new(BridgeData::key(&wormhole, ()), false),
            AccountMeta::new(wormhole::fee_collector(&wormhole), false),
            AccountMeta::new(emitter, false),
            AccountMeta::new(SequenceTracker::key(&wormhole, emitter), false),
            AccountMeta::new(wormhole_message(&program_id, 1), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       anchor::instruction_data("initialize", &())?,
    })
}

/// Registers the HelloWorld contract on `chain`. Only the config's owner may sign this.
pub fn register_emitter(
    program_id: Pubkey,
    owner: Pubkey,
    chain: Chain,
    address: Address,
) -> Result<Instruction, Error> {
    match chain {
        Chain::Any => return Err(Error::InvalidForeignEmitter("chain id 0 is reserved")),
        Chain::Solana => {
            return Err(Error::InvalidForeignEmitter(
                "Solana emitters cannot be registered",
            ))
        }
        _ => {}
    }
    if address.is_zero() {
        return Err(Error::InvalidForeignEmitter("emitter address is zero"));
    }

    Ok(Instruction {
        program_id,
        accounts:   vec![
            AccountMeta::new(owner, true),
            AccountMeta::new_readonly(Config::key(&program_id, ()), false),
            AccountMeta::new(ForeignEmitter::key(&program_id, chain), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       anchor::instruction_data("register_emitter", &(u16::from(chain), address.0))?,
    })
}

/// Posts `message` through the core bridge. `sequence` is the sequence the message will be posted
/// with, the emitter's [`SequenceTracker::next_value`].
pub fn send_message(
    program_id: Pubkey,
    wormhole: Pubkey,
    payer: Pubkey,
    batch_id: u32,
    message: &[u8],
    sequence: u64,
) -> Result<Instruction, Error> {
    if message.len() > MESSAGE_MAX_LENGTH {
        return Err(scaffolding_core::Error::MessageTooLarge(message.len()).into());
    }

    let emitter = WormholeEmitter::key(&program_id, ());

    Ok(Instruction {
        program_id,
        accounts:   vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(Config::key(&program_id, ()), false),
            AccountMeta::new_readonly(wormhole, false),
            AccountMeta::new(BridgeData::key(&wormhole, ()), false),
            AccountMeta::new(wormhole::fee_collector(&wormhole), false),
            AccountMeta::new_readonly(emitter, false),
            AccountMeta::new(SequenceTracker::key(&wormhole, emitter), false),
            AccountMeta::new(wormhole_message(&program_id, sequence), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data:       anchor::instruction_data("send_message", &(batch_id, message.to_vec()))?,
    })
}

/// Consumes a VAA that has already been posted to the core bridge.
pub fn receive_message(
    program_id: Pubkey,
    wormhole: Pubkey,
    payer: Pubkey,
    vaa: &Vaa<&RawMessage>,
) -> Result<Instruction, Error> {
    let hash = PostVAAData::from(vaa).hash()?;

    Ok(Instruction {
        program_id,
        accounts:   vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(Config::key(&program_id, ()), false),
            AccountMeta::new_readonly(wormhole, false),
            AccountMeta::new_readonly(PostedMessage::key(&wormhole, hash), false),
            AccountMeta::new_readonly(ForeignEmitter::key(&program_id, vaa.emitter_chain), false),
            AccountMeta::new(
                Received::key(&program_id, (vaa.emitter_chain, vaa.sequence)),
                false,
            ),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       anchor::instruction_data("receive_message", &hash)?,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        scaffolding_core::hello_world::HelloWorldMessage,
    };

    fn ids() -> (Pubkey, Pubkey, Pubkey) {
        (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique())
    }

    #[test]
    fn initialize_posts_the_first_message() {
        let (program, wormhole, owner) = ids();
        let ix = initialize(program, wormhole, owner).unwrap();

        assert_eq!(ix.data, anchor::instruction_discriminator("initialize"));
        assert_eq!(ix.accounts.len(), 11);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, Config::key(&program, ()));
        assert_eq!(ix.accounts[7].pubkey, wormhole_message(&program, 1));
        assert_eq!(ix.accounts[10].pubkey, Pubkey::default());
    }

    #[test]
    fn register_emitter_data() {
        let (program, _, owner) = ids();
        let ix = register_emitter(program, owner, Chain::Ethereum, Address([5; 32])).unwrap();

        assert_eq!(&ix.data[8..10], &[2, 0]);
        assert_eq!(&ix.data[10..], &[5; 32]);
        assert_eq!(
            ix.accounts[2].pubkey,
            ForeignEmitter::key(&program, Chain::Ethereum)
        );
    }

    #[test]
    fn register_emitter_rejects_invalid_emitters() {
        let (program, _, owner) = ids();

        for (chain, address) in [
            (Chain::Solana, Address([5; 32])),
            (Chain::Any, Address([5; 32])),
            (Chain::Ethereum, Address::default()),
        ] {
            assert!(matches!(
                register_emitter(program, owner, chain, address),
                Err(Error::InvalidForeignEmitter(_))
            ));
        }
    }

    #[test]
    fn send_message_uses_the_next_sequence() {
        let (program, wormhole, payer) = ids();
        let ix = send_message(program, wormhole, payer, 0, b"Hello World!", 2).unwrap();

        assert_eq!(ix.accounts[7].pubkey, wormhole_message(&program, 2));
        assert_eq!(&ix.data[8..12], &[0, 0, 0, 0]);
        assert_eq!(&ix.data[12..16], &12u32.to_le_bytes());
        assert_eq!(&ix.data[16..], b"Hello World!");

        assert!(send_message(program, wormhole, payer, 0, &[0; 1025], 2).is_err());
    }

    #[test]
    fn receive_message_accounts() {
        let (program, wormhole, payer) = ids();
        let payload = HelloWorldMessage::hello("gm").encode().unwrap();
        let vaa = Vaa {
            version:            1,
            guardian_set_index: 0,
            signatures:         Vec::new(),
            timestamp:          0,
            nonce:              0,
            emitter_chain:      Chain::Ethereum,
            emitter_address:    Address([1; 32]),
            sequence:           9,
            consistency_level:  1,
            payload:            RawMessage::new(&payload),
        };
        let hash = vaa.digest().unwrap().hash;

        let ix = receive_message(program, wormhole, payer, &vaa).unwrap();
        assert_eq!(&ix.data[8..], &hash);
        assert_eq!(ix.accounts[3].pubkey, PostedMessage::key(&wormhole, hash));
        assert_eq!(
            ix.accounts[5].pubkey,
            Received::key(&program, (Chain::Ethereum, 9))
        );
    }
}
