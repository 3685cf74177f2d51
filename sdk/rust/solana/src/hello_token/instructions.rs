use {
    super::accounts::{
        tmp_token_account,
        wormhole_message,
        ForeignContract,
        RedeemerConfig,
        SenderConfig,
    },
    crate::{
        anchor,
        associated_token_address,
        token_bridge::{
            self,
            EndpointRegistration,
            WrappedMeta,
        },
        wormhole::{
            self,
            BridgeData,
            Claim,
            ClaimSeeds,
            PostVAAData,
            PostedMessage,
            SequenceTracker,
        },
        Account,
        Error,
        ASSOCIATED_TOKEN_PROGRAM_ID,
        TOKEN_PROGRAM_ID,
    },
    scaffolding_core::{
        hello_token::HelloTokenMessage,
        token::{
            self,
            parse_transfer_with_payload,
        },
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

/// Program ids every HelloToken instruction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramIds {
    pub hello_token:  Pubkey,
    pub wormhole:     Pubkey,
    pub token_bridge: Pubkey,
}

impl ProgramIds {
    fn token_bridge_emitter(&self) -> Pubkey {
        token_bridge::emitter(&self.token_bridge)
    }

    fn token_bridge_sequence(&self) -> Pubkey {
        SequenceTracker::key(&self.wormhole, self.token_bridge_emitter())
    }
}

/// Arguments shared by both outbound transfer instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTokens {
    pub batch_id:        u32,
    pub amount:          u64,
    /// Wallet on the target chain that receives the tokens.
    pub recipient:       Address,
    pub recipient_chain: Chain,
}

impl SendTokens {
    fn check(&self) -> Result<(), Error> {
        if self.amount == 0 {
            return Err(Error::InvalidTransfer("amount is zero"));
        }
        if self.recipient.is_zero() {
            return Err(Error::InvalidTransfer("recipient is the zero address"));
        }
        match self.recipient_chain {
            Chain::Any | Chain::Solana => Err(Error::InvalidTransfer(
                "recipient chain must be a foreign chain",
            )),
            _ => Ok(()),
        }
    }

    fn data(&self, instruction: &str) -> Result<Vec<u8>, Error> {
        anchor::instruction_data(
            instruction,
            &(
                self.batch_id,
                self.amount,
                self.recipient.0,
                u16::from(self.recipient_chain),
            ),
        )
    }
}

/// Creates the sender and redeemer configs.
pub fn initialize(
    ids: ProgramIds,
    owner: Pubkey,
    relayer_fee: u32,
    relayer_fee_precision: u32,
) -> Result<Instruction, Error> {
    check_relayer_fee(relayer_fee, relayer_fee_precision)?;

    let tb = &ids.token_bridge;
    Ok(Instruction {
        program_id: ids.hello_token,
        accounts:   vec![
            AccountMeta::new(owner, true),
            AccountMeta::new(SenderConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new(RedeemerConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new_readonly(ids.wormhole, false),
            AccountMeta::new_readonly(*tb, false),
            AccountMeta::new_readonly(token_bridge::Config::key(tb, ()), false),
            AccountMeta::new_readonly(token_bridge::authority_signer(tb), false),
            AccountMeta::new_readonly(token_bridge::custody_signer(tb), false),
            AccountMeta::new_readonly(token_bridge::mint_authority(tb), false),
            AccountMeta::new_readonly(BridgeData::key(&ids.wormhole, ()), false),
            AccountMeta::new_readonly(ids.token_bridge_emitter(), false),
            AccountMeta::new_readonly(wormhole::fee_collector(&ids.wormhole), false),
            AccountMeta::new_readonly(ids.token_bridge_sequence(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       anchor::instruction_data(
            "initialize",
            &(relayer_fee, relayer_fee_precision),
        )?,
    })
}

/// Registers the HelloToken contract on `chain`. `token_bridge_address` is the emitter of the
/// token bridge on that chain, which must already be registered with the Solana token bridge.
pub fn register_foreign_contract(
    ids: ProgramIds,
    owner: Pubkey,
    chain: Chain,
    address: Address,
    token_bridge_address: Address,
) -> Result<Instruction, Error> {
    match chain {
        Chain::Any => return Err(Error::InvalidForeignEmitter("chain id 0 is reserved")),
        Chain::Solana => {
            return Err(Error::InvalidForeignEmitter(
                "Solana contracts cannot be registered",
            ))
        }
        _ => {}
    }
    if address.is_zero() {
        return Err(Error::InvalidForeignEmitter("contract address is zero"));
    }

    Ok(Instruction {
        program_id: ids.hello_token,
        accounts:   vec![
            AccountMeta::new(owner, true),
            AccountMeta::new_readonly(SenderConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new(ForeignContract::key(&ids.hello_token, chain), false),
            AccountMeta::new_readonly(
                EndpointRegistration::key(&ids.token_bridge, (chain, token_bridge_address)),
                false,
            ),
            AccountMeta::new_readonly(ids.token_bridge, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data:       anchor::instruction_data(
            "register_foreign_contract",
            &(u16::from(chain), address.0),
        )?,
    })
}

pub fn update_relayer_fee(
    ids: ProgramIds,
    owner: Pubkey,
    relayer_fee: u32,
    relayer_fee_precision: u32,
) -> Result<Instruction, Error> {
    check_relayer_fee(relayer_fee, relayer_fee_precision)?;

    Ok(Instruction {
        program_id: ids.hello_token,
        accounts:   vec![
            AccountMeta::new(owner, true),
            AccountMeta::new(RedeemerConfig::key(&ids.hello_token, ()), false),
        ],
        data:       anchor::instruction_data(
            "update_relayer_fee",
            &(relayer_fee, relayer_fee_precision),
        )?,
    })
}

fn check_relayer_fee(fee: u32, precision: u32) -> Result<(), Error> {
    token::compute_relayer_fee(0, fee, precision)?;
    Ok(())
}

/// Locks `mint` tokens native to Solana in the token bridge custody. `sequence` is the sequence
/// the token bridge will post the transfer with, the token bridge emitter's
/// [`SequenceTracker::next_value`].
pub fn send_native_tokens_with_payload(
    ids: ProgramIds,
    payer: Pubkey,
    mint: Pubkey,
    args: SendTokens,
    sequence: u64,
) -> Result<Instruction, Error> {
    args.check()?;

    let tb = &ids.token_bridge;
    Ok(Instruction {
        program_id: ids.hello_token,
        accounts:   vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(SenderConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new_readonly(
                ForeignContract::key(&ids.hello_token, args.recipient_chain),
                false,
            ),
            AccountMeta::new(mint, false),
            AccountMeta::new(associated_token_address(&payer, &mint), false),
            AccountMeta::new(tmp_token_account(&ids.hello_token, &mint), false),
            AccountMeta::new_readonly(ids.wormhole, false),
            AccountMeta::new_readonly(*tb, false),
            AccountMeta::new_readonly(token_bridge::Config::key(tb, ()), false),
            AccountMeta::new(token_bridge::custody_token_account(tb, &mint), false),
            AccountMeta::new_readonly(token_bridge::authority_signer(tb), false),
            AccountMeta::new_readonly(token_bridge::custody_signer(tb), false),
            AccountMeta::new(BridgeData::key(&ids.wormhole, ()), false),
            AccountMeta::new(wormhole_message(&ids.hello_token, sequence), false),
            AccountMeta::new_readonly(ids.token_bridge_emitter(), false),
            AccountMeta::new(ids.token_bridge_sequence(), false),
            AccountMeta::new(wormhole::fee_collector(&ids.wormhole), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data:       args.data("send_native_tokens_with_payload")?,
    })
}

/// Burns token bridge wrapped `mint` tokens to send them back to their origin.
pub fn send_wrapped_tokens_with_payload(
    ids: ProgramIds,
    payer: Pubkey,
    mint: Pubkey,
    args: SendTokens,
    sequence: u64,
) -> Result<Instruction, Error> {
    args.check()?;

    let tb = &ids.token_bridge;
    Ok(Instruction {
        program_id: ids.hello_token,
        accounts:   vec![
            AccountMeta::new(payer, true),
            AccountMeta::new_readonly(SenderConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new_readonly(
                ForeignContract::key(&ids.hello_token, args.recipient_chain),
                false,
            ),
            AccountMeta::new(mint, false),
            AccountMeta::new(associated_token_address(&payer, &mint), false),
            AccountMeta::new(tmp_token_account(&ids.hello_token, &mint), false),
            AccountMeta::new_readonly(ids.wormhole, false),
            AccountMeta::new_readonly(*tb, false),
            AccountMeta::new_readonly(WrappedMeta::key(tb, mint), false),
            AccountMeta::new_readonly(token_bridge::Config::key(tb, ()), false),
            AccountMeta::new_readonly(token_bridge::authority_signer(tb), false),
            AccountMeta::new(BridgeData::key(&ids.wormhole, ()), false),
            AccountMeta::new(wormhole_message(&ids.hello_token, sequence), false),
            AccountMeta::new_readonly(ids.token_bridge_emitter(), false),
            AccountMeta::new(ids.token_bridge_sequence(), false),
            AccountMeta::new(wormhole::fee_collector(&ids.wormhole), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data:       args.data("send_wrapped_tokens_with_payload")?,
    })
}

/// What a redeem instruction needs to know about a posted transfer VAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// Hash of the posted VAA, also the instruction's only argument.
    pub hash:          [u8; 32],
    pub emitter_chain: Chain,
    pub emitter:       Address,
    pub sequence:      u64,
    pub token_chain:   Chain,
    pub token_address: Address,
    /// Wallet named in the HelloToken payload.
    pub recipient:     Pubkey,
}

impl Redemption {
    /// Parses a token bridge transfer with a HelloToken payload addressed to `hello_token`.
    pub fn parse(hello_token: &Pubkey, vaa: &Vaa<&RawMessage>) -> Result<Self, Error> {
        let payload: &[u8] = vaa.payload;
        let (transfer, app_payload) = parse_transfer_with_payload(payload)?;
        let token::Message::TransferWithPayload {
            token_address,
            token_chain,
            recipient,
            recipient_chain,
            ..
        } = transfer
        else {
            return Err(Error::InvalidTransfer("not a transfer with payload"));
        };

        if recipient_chain != Chain::Solana {
            return Err(Error::WrongTargetChain(recipient_chain.into()));
        }
        if recipient.0 != RedeemerConfig::key(hello_token, ()).to_bytes() {
            return Err(Error::InvalidTransfer("transfer is not addressed to this program"));
        }

        let message = HelloTokenMessage::decode(app_payload)?;
        Ok(Redemption {
            hash: PostVAAData::from(vaa).hash()?,
            emitter_chain: vaa.emitter_chain,
            emitter: vaa.emitter_address,
            sequence: vaa.sequence,
            token_chain,
            token_address,
            recipient: Pubkey::new_from_array(message.recipient().0),
        })
    }

    /// Mint that receives the tokens on Solana.
    pub fn mint(&self, token_bridge: &Pubkey) -> Pubkey {
        match self.token_chain {
            Chain::Solana => Pubkey::new_from_array(self.token_address.0),
            chain => token_bridge::wrapped_mint(token_bridge, chain, &self.token_address),
        }
    }

    /// Accounts both redeem instructions start with, up to the token bridge program.
    fn leading_accounts(&self, ids: &ProgramIds, payer: Pubkey, mint: Pubkey) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(associated_token_address(&payer, &mint), false),
            AccountMeta::new_readonly(RedeemerConfig::key(&ids.hello_token, ()), false),
            AccountMeta::new_readonly(
                ForeignContract::key(&ids.hello_token, self.emitter_chain),
                false,
            ),
            AccountMeta::new(mint, false),
            AccountMeta::new(associated_token_address(&self.recipient, &mint), false),
            AccountMeta::new(self.recipient, false),
            AccountMeta::new(tmp_token_account(&ids.hello_token, &mint), false),
            AccountMeta::new_readonly(ids.wormhole, false),
            AccountMeta::new_readonly(ids.token_bridge, false),
        ]
    }

    /// Token bridge accounts that prove the VAA and prevent it from being redeemed twice.
    fn vaa_accounts(&self, ids: &ProgramIds) -> Vec<AccountMeta> {
        let tb = &ids.token_bridge;
        vec![
            AccountMeta::new_readonly(token_bridge::Config::key(tb, ()), false),
            AccountMeta::new_readonly(PostedMessage::key(&ids.wormhole, self.hash), false),
            AccountMeta::new(
                Claim::key(
                    tb,
                    ClaimSeeds {
                        emitter_address: self.emitter,
                        emitter_chain:   self.emitter_chain,
                        sequence:        self.sequence,
                    },
                ),
                false,
            ),
            AccountMeta::new_readonly(
                EndpointRegistration::key(tb, (self.emitter_chain, self.emitter)),
                false,
            ),
        ]
    }
}

/// Releases tokens native to Solana from the token bridge custody to the recipient. The payer
/// relaying the transfer is paid the relayer fee.
pub fn redeem_native_transfer_with_payload(
    ids: ProgramIds,
    payer: Pubkey,
    vaa: &Vaa<&RawMessage>,
) -> Result<Instruction, Error> {
    let redemption = Redemption::parse(&ids.hello_token, vaa)?;
    if redemption.token_chain != Chain::Solana {
        return Err(Error::UnexpectedTokenChain(redemption.token_chain.into()));
    }

    let tb = &ids.token_bridge;
    let mint = redemption.mint(tb);
    let mut accounts = redemption.leading_accounts(&ids, payer, mint);
    accounts.extend(redemption.vaa_accounts(&ids));
    accounts.extend([
        AccountMeta::new(token_bridge::custody_token_account(tb, &mint), false),
        AccountMeta::new_readonly(token_bridge::custody_signer(tb), false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ]);

    Ok(Instruction {
        program_id: ids.hello_token,
        accounts,
        data:       anchor::instruction_data(
            "redeem_native_transfer_with_payload",
            &redemption.hash,
        )?,
    })
}

/// Mints token bridge wrapped tokens to the recipient.
pub fn redeem_wrapped_transfer_with_payload(
    ids: ProgramIds,
    payer: Pubkey,
    vaa: &Vaa<&RawMessage>,
) -> Result<Instruction, Error> {
    let redemption = Redemption::parse(&ids.hello_token, vaa)?;
    if redemption.token_chain == Chain::Solana {
        return Err(Error::UnexpectedTokenChain(redemption.token_chain.into()));
    }

    let tb = &ids.token_bridge;
    let mint = redemption.mint(tb);
    let mut accounts = redemption.leading_accounts(&ids, payer, mint);
    accounts.push(AccountMeta::new_readonly(WrappedMeta::key(tb, mint), false));
    accounts.extend(redemption.vaa_accounts(&ids));
    accounts.extend([
        AccountMeta::new_readonly(token_bridge::mint_authority(tb), false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(sysvar::rent::id(), false),
    ]);

    Ok(Instruction {
        program_id: ids.hello_token,
        accounts,
        data:       anchor::instruction_data(
            "redeem_wrapped_transfer_with_payload",
            &redemption.hash,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        scaffolding_core::{
            token::encode_transfer_with_payload,
            Amount,
        },
    };

    fn ids() -> ProgramIds {
        ProgramIds {
            hello_token:  Pubkey::new_unique(),
            wormhole:     Pubkey::new_unique(),
            token_bridge: Pubkey::new_unique(),
        }
    }

    fn transfer(ids: &ProgramIds, token_chain: Chain, recipient: Pubkey) -> Vec<u8> {
        let message = token::Message::TransferWithPayload {
            amount: Amount::from(1_000u64),
            token_address: Address([0xaa; 32]),
            token_chain,
            recipient: Address(RedeemerConfig::key(&ids.hello_token, ()).to_bytes()),
            recipient_chain: Chain::Solana,
            sender_address: Address([0xbb; 32]),
        };
        let hello = HelloTokenMessage::Hello {
            recipient: Address(recipient.to_bytes()),
        };
        encode_transfer_with_payload(&message, &hello.encode().unwrap()).unwrap()
    }

    fn vaa(payload: &[u8]) -> Vaa<&RawMessage> {
        Vaa {
            version:            1,
            guardian_set_index: 0,
            signatures:         Vec::new(),
            timestamp:          1,
            nonce:              0,
            emitter_chain:      Chain::Ethereum,
            emitter_address:    Address([0xee; 32]),
            sequence:           42,
            consistency_level:  1,
            payload:            RawMessage::new(payload),
        }
    }

    fn send_args() -> SendTokens {
        SendTokens {
            batch_id:        0,
            amount:          100,
            recipient:       Address::from_evm([1; 20]),
            recipient_chain: Chain::Ethereum,
        }
    }

    #[test]
    fn initialize_checks_fee() {
        let ids = ids();
        let owner = Pubkey::new_unique();

        let ix = initialize(ids, owner, 1, 100).unwrap();
        assert_eq!(ix.accounts.len(), 14);
        assert_eq!(&ix.data[8..], &[1, 0, 0, 0, 100, 0, 0, 0]);

        assert!(initialize(ids, owner, 1, 0).is_err());
        assert!(update_relayer_fee(ids, owner, 101, 100).is_err());
        assert!(update_relayer_fee(ids, owner, 100, 100).is_ok());
    }

    #[test]
    fn register_foreign_contract_derives_endpoint() {
        let ids = ids();
        let tb_emitter = Address([4; 32]);
        let ix = register_foreign_contract(
            ids,
            Pubkey::new_unique(),
            Chain::Ethereum,
            Address([5; 32]),
            tb_emitter,
        )
        .unwrap();

        assert_eq!(
            ix.accounts[3].pubkey,
            EndpointRegistration::key(&ids.token_bridge, (Chain::Ethereum, tb_emitter))
        );
        assert!(register_foreign_contract(
            ids,
            Pubkey::new_unique(),
            Chain::Solana,
            Address([5; 32]),
            tb_emitter,
        )
        .is_err());
    }

    #[test]
    fn send_native_accounts_and_data() {
        let ids = ids();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let ix = send_native_tokens_with_payload(ids, payer, mint, send_args(), 7).unwrap();
        assert_eq!(ix.accounts.len(), 22);
        assert_eq!(ix.accounts[4].pubkey, associated_token_address(&payer, &mint));
        assert_eq!(
            ix.accounts[9].pubkey,
            token_bridge::custody_token_account(&ids.token_bridge, &mint)
        );
        assert_eq!(ix.accounts[13].pubkey, wormhole_message(&ids.hello_token, 7));

        // batch id, amount, recipient, recipient chain
        assert_eq!(ix.data.len(), 8 + 4 + 8 + 32 + 2);
        assert_eq!(&ix.data[12..20], &100u64.to_le_bytes());
        assert_eq!(&ix.data[52..], &[2, 0]);
    }

    #[test]
    fn send_rejects_bad_arguments() {
        let ids = ids();
        let (payer, mint) = (Pubkey::new_unique(), Pubkey::new_unique());

        let zero = SendTokens {
            amount: 0,
            ..send_args()
        };
        let to_solana = SendTokens {
            recipient_chain: Chain::Solana,
            ..send_args()
        };
        assert!(send_native_tokens_with_payload(ids, payer, mint, zero, 1).is_err());
        assert!(send_wrapped_tokens_with_payload(ids, payer, mint, to_solana, 1).is_err());

        let ix = send_wrapped_tokens_with_payload(ids, payer, mint, send_args(), 1).unwrap();
        assert_eq!(ix.accounts.len(), 21);
        assert_eq!(ix.accounts[8].pubkey, WrappedMeta::key(&ids.token_bridge, mint));
    }

    #[test]
    fn redeem_native_derives_accounts_from_the_vaa() {
        let ids = ids();
        let payer = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let payload = transfer(&ids, Chain::Solana, recipient);
        let vaa = vaa(&payload);

        let ix = redeem_native_transfer_with_payload(ids, payer, &vaa).unwrap();
        let mint = Pubkey::new_from_array([0xaa; 32]);
        let hash = PostVAAData::from(&vaa).hash().unwrap();

        assert_eq!(ix.accounts.len(), 20);
        assert_eq!(ix.accounts[4].pubkey, mint);
        assert_eq!(ix.accounts[5].pubkey, associated_token_address(&recipient, &mint));
        assert_eq!(ix.accounts[6].pubkey, recipient);
        assert_eq!(ix.accounts[11].pubkey, PostedMessage::key(&ids.wormhole, hash));
        assert_eq!(
            ix.accounts[12].pubkey,
            Claim::key(
                &ids.token_bridge,
                ClaimSeeds {
                    emitter_address: Address([0xee; 32]),
                    emitter_chain:   Chain::Ethereum,
                    sequence:        42,
                }
            )
        );
        assert_eq!(&ix.data[8..], &hash);

        assert!(matches!(
            redeem_wrapped_transfer_with_payload(ids, payer, &vaa),
            Err(Error::UnexpectedTokenChain(1))
        ));
    }

    #[test]
    fn redeem_wrapped_uses_the_wrapped_mint() {
        let ids = ids();
        let payload = transfer(&ids, Chain::Ethereum, Pubkey::new_unique());
        let vaa = vaa(&payload);

        let ix = redeem_wrapped_transfer_with_payload(ids, Pubkey::new_unique(), &vaa).unwrap();
        let mint =
            token_bridge::wrapped_mint(&ids.token_bridge, Chain::Ethereum, &Address([0xaa; 32]));

        assert_eq!(ix.accounts.len(), 20);
        assert_eq!(ix.accounts[4].pubkey, mint);
        assert_eq!(ix.accounts[10].pubkey, WrappedMeta::key(&ids.token_bridge, mint));
        assert_eq!(ix.accounts[15].pubkey, token_bridge::mint_authority(&ids.token_bridge));
    }

    #[test]
    fn redeem_rejects_transfers_for_other_programs() {
        let ids = ids();
        let other = ProgramIds {
            hello_token: Pubkey::new_unique(),
            ..ids
        };
        let payload = transfer(&other, Chain::Solana, Pubkey::new_unique());

        assert!(matches!(
            Redemption::parse(&ids.hello_token, &vaa(&payload)),
            Err(Error::InvalidTransfer(_))
        ));
    }
}
