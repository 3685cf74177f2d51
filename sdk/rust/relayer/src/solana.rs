//! The HelloWorld program on Solana.

use {
    crate::contract::HelloWorldContract,
    anyhow::{
        bail,
        Context,
    },
    log::{
        debug,
        info,
    },
    scaffolding_core::{
        vaa,
        Address,
        Chain,
    },
    scaffolding_solana::{
        hello_world::{
            self,
            Config,
            ForeignEmitter,
            Received,
            WormholeEmitter,
        },
        wormhole::{
            self,
            GuardianSet,
            PostVAAData,
            PostedMessage,
            SequenceTracker,
        },
        Account,
    },
    solana_client::{
        nonblocking::rpc_client::RpcClient,
        rpc_config::RpcTransactionConfig,
    },
    solana_sdk::{
        commitment_config::CommitmentConfig,
        instruction::Instruction,
        pubkey::Pubkey,
        signature::{
            Keypair,
            Signer,
        },
        transaction::Transaction,
    },
    solana_transaction_status::{
        option_serializer::OptionSerializer,
        UiTransactionEncoding,
    },
    std::time::Duration,
};

/// The few RPC calls the relayer makes.
#[allow(async_fn_in_trait)]
pub trait SolanaRpc {
    /// Pays for and signs every transaction.
    fn payer(&self) -> Pubkey;

    /// Data of the account at `key`, `None` if it does not exist.
    async fn account_data(&self, key: &Pubkey) -> anyhow::Result<Option<Vec<u8>>>;

    /// Sends `instructions` in one transaction, also signed by `signers`, and waits for it to be
    /// confirmed. Returns the transaction's log messages.
    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> anyhow::Result<Vec<String>>;
}

/// [`SolanaRpc`] over the nonblocking `solana-client` RPC client.
pub struct RpcClientAdapter {
    client: RpcClient,
    payer:  Keypair,
}

impl RpcClientAdapter {
    pub fn new(rpc_url: String, payer: Keypair) -> Self {
        RpcClientAdapter {
            client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            payer,
        }
    }

    /// Funds the payer on a local validator.
    pub async fn airdrop(&self, lamports: u64) -> anyhow::Result<()> {
        let signature = self
            .client
            .request_airdrop(&self.payer.pubkey(), lamports)
            .await?;

        for _ in 0..30 {
            if self.client.confirm_transaction(&signature).await? {
                debug!("airdropped {lamports} lamports to {}", self.payer.pubkey());
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        bail!("airdrop {signature} was not confirmed")
    }
}

impl SolanaRpc for RpcClientAdapter {
    fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    async fn account_data(&self, key: &Pubkey) -> anyhow::Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(key, self.client.commitment())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn send_transaction(
        &self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> anyhow::Result<Vec<String>> {
        let mut keypairs = vec![&self.payer];
        keypairs.extend_from_slice(signers);

        let blockhash = self.client.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            keypairs.as_slice(),
            blockhash,
        );
        let signature = self.client.send_and_confirm_transaction(&tx).await?;
        debug!("confirmed transaction {signature}");

        let confirmed = self
            .client
            .get_transaction_with_config(
                &signature,
                RpcTransactionConfig {
                    encoding:                          Some(UiTransactionEncoding::Json),
                    commitment:                        Some(self.client.commitment()),
                    max_supported_transaction_version: Some(0),
                },
            )
            .await?;

        let logs = match confirmed.transaction.meta.map(|meta| meta.log_messages) {
            Some(OptionSerializer::Some(logs)) => logs,
            _ => Vec::new(),
        };
        Ok(logs)
    }
}

/// The HelloWorld program as a [`HelloWorldContract`].
pub struct SolanaHelloWorld<R> {
    rpc:        R,
    program_id: Pubkey,
    wormhole:   Pubkey,
}

impl<R: SolanaRpc> SolanaHelloWorld<R> {
    pub fn new(rpc: R, program_id: Pubkey, wormhole: Pubkey) -> Self {
        SolanaHelloWorld {
            rpc,
            program_id,
            wormhole,
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn emitter(&self) -> Pubkey {
        WormholeEmitter::key(&self.program_id, ())
    }

    async fn account<A: Account>(&self, key: &Pubkey) -> anyhow::Result<Option<A>> {
        match self.rpc.account_data(key).await? {
            Some(data) => Ok(Some(A::get(&data)?)),
            None => Ok(None),
        }
    }

    /// Posts a signed VAA to the core bridge unless it already is. Returns the VAA hash.
    async fn post_vaa(&self, signed_vaa: &[u8]) -> anyhow::Result<[u8; 32]> {
        let vaa = vaa::parse(signed_vaa)?;
        let hash = PostVAAData::from(&vaa).hash()?;

        let posted = PostedMessage::key(&self.wormhole, hash);
        if self.rpc.account_data(&posted).await?.is_some() {
            debug!("VAA {} already posted", hex::encode(hash));
            return Ok(hash);
        }

        let guardian_set: GuardianSet = self
            .account(&GuardianSet::key(&self.wormhole, vaa.guardian_set_index))
            .await?
            .with_context(|| format!("guardian set {} not found", vaa.guardian_set_index))?;

        let signature_set = Keypair::new();
        let instructions = wormhole::post_vaa_instructions(
            self.wormhole,
            self.rpc.payer(),
            signature_set.pubkey(),
            signed_vaa,
            &guardian_set,
        )?;

        for batch in &instructions.verify {
            self.rpc.send_transaction(batch, &[&signature_set]).await?;
        }
        self.rpc
            .send_transaction(&[instructions.post_vaa], &[])
            .await?;
        info!("Posted VAA {}", hex::encode(hash));

        Ok(hash)
    }
}

impl<R: SolanaRpc> HelloWorldContract for SolanaHelloWorld<R> {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn deploy(&mut self) -> anyhow::Result<Address> {
        let emitter = Address(self.emitter().to_bytes());

        let config = Config::key(&self.program_id, ());
        if self.rpc.account_data(&config).await?.is_some() {
            info!("HelloWorld {} already initialized", self.program_id);
            return Ok(emitter);
        }

        let ix = hello_world::initialize(self.program_id, self.wormhole, self.rpc.payer())?;
        self.rpc.send_transaction(&[ix], &[]).await?;
        info!("Initialized HelloWorld {}", self.program_id);

        Ok(emitter)
    }

    async fn register_emitter(&mut self, chain: Chain, address: Address) -> anyhow::Result<()> {
        let key = ForeignEmitter::key(&self.program_id, chain);
        if let Some(existing) = self.account::<ForeignEmitter>(&key).await? {
            if existing.verify(&address) {
                info!("Already registered {address} for chain {chain}");
                return Ok(());
            }
        }

        let ix = hello_world::register_emitter(self.program_id, self.rpc.payer(), chain, address)?;
        self.rpc.send_transaction(&[ix], &[]).await?;
        info!("Registered {address} for chain {chain}");
        Ok(())
    }

    async fn send(&mut self, message: &[u8]) -> anyhow::Result<u64> {
        let tracker: SequenceTracker = self
            .account(&SequenceTracker::key(&self.wormhole, self.emitter()))
            .await?
            .context("HelloWorld has not posted its first message, deploy it first")?;

        let ix = hello_world::send_message(
            self.program_id,
            self.wormhole,
            self.rpc.payer(),
            0,
            message,
            tracker.next_value(),
        )?;
        let logs = self.rpc.send_transaction(&[ix], &[]).await?;
        Ok(wormhole::parse_sequence_from_logs(&logs)?)
    }

    async fn receive(&mut self, signed_vaa: &[u8]) -> anyhow::Result<Vec<u8>> {
        let vaa = vaa::parse(signed_vaa)?;
        let received_key = Received::key(&self.program_id, (vaa.emitter_chain, vaa.sequence));

        if self.rpc.account_data(&received_key).await?.is_none() {
            self.post_vaa(signed_vaa).await?;
            let ix = hello_world::receive_message(
                self.program_id,
                self.wormhole,
                self.rpc.payer(),
                &vaa,
            )?;
            self.rpc.send_transaction(&[ix], &[]).await?;
        } else {
            info!(
                "VAA {}/{} already received",
                vaa.emitter_chain, vaa.sequence
            );
        }

        let received: Received = self
            .account(&received_key)
            .await?
            .context("Received account missing after redeeming the VAA")?;
        Ok(received.message)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock::{
            MockEmitter,
            MockGuardians,
        },
        scaffolding_solana::anchor,
        std::{
            collections::HashMap,
            sync::Mutex,
        },
    };

    /// Accounts live in a map; sending records the instructions and returns fixed logs.
    #[derive(Default)]
    struct FakeRpc {
        payer:    Pubkey,
        accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
        sent:     Mutex<Vec<Vec<Instruction>>>,
        logs:     Vec<String>,
    }

    impl FakeRpc {
        fn set(&self, key: Pubkey, data: Vec<u8>) {
            self.accounts.lock().unwrap().insert(key, data);
        }

        fn sent(&self) -> Vec<Vec<Instruction>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SolanaRpc for FakeRpc {
        fn payer(&self) -> Pubkey {
            self.payer
        }

        async fn account_data(&self, key: &Pubkey) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(self.accounts.lock().unwrap().get(key).cloned())
        }

        async fn send_transaction(
            &self,
            instructions: &[Instruction],
            _signers: &[&Keypair],
        ) -> anyhow::Result<Vec<String>> {
            self.sent.lock().unwrap().push(instructions.to_vec());
            Ok(self.logs.clone())
        }
    }

    fn program(rpc: FakeRpc) -> SolanaHelloWorld<FakeRpc> {
        SolanaHelloWorld::new(rpc, Pubkey::new_unique(), Pubkey::new_unique())
    }

    #[tokio::test]
    async fn deploy_is_idempotent() {
        let mut hello = program(FakeRpc::default());

        let emitter = hello.deploy().await.unwrap();
        assert_eq!(emitter.0, hello.emitter().to_bytes());
        assert_eq!(hello.rpc().sent().len(), 1);

        let config = Config::key(&hello.program_id, ());
        hello.rpc().set(config, vec![0; 8]);
        hello.deploy().await.unwrap();
        assert_eq!(hello.rpc().sent().len(), 1);
    }

    #[tokio::test]
    async fn register_skips_known_emitters() {
        let mut hello = program(FakeRpc::default());
        let address = Address([7; 32]);

        let registered = ForeignEmitter {
            chain:   2,
            address: address.0,
        };
        hello.rpc().set(
            ForeignEmitter::key(&hello.program_id, Chain::Ethereum),
            anchor::serialize_account("ForeignEmitter", &registered).unwrap(),
        );

        hello
            .register_emitter(Chain::Ethereum, address)
            .await
            .unwrap();
        assert!(hello.rpc().sent().is_empty());

        hello
            .register_emitter(Chain::Ethereum, Address([8; 32]))
            .await
            .unwrap();
        assert_eq!(hello.rpc().sent().len(), 1);
    }

    #[tokio::test]
    async fn send_reads_the_sequence_from_logs() {
        let rpc = FakeRpc {
            logs: vec![
                "Program log: Instruction: SendMessage".to_owned(),
                "Program log: Sequence: 5".to_owned(),
            ],
            ..Default::default()
        };
        let mut hello = program(rpc);
        assert!(hello.send(b"gm").await.is_err());

        let tracker = SequenceTracker::key(&hello.wormhole, hello.emitter());
        hello
            .rpc()
            .set(tracker, borsh::to_vec(&SequenceTracker { sequence: 5 }).unwrap());

        assert_eq!(hello.send(b"gm").await.unwrap(), 5);
        let sent = hello.rpc().sent();
        assert_eq!(
            sent[0][0].accounts[7].pubkey,
            hello_world::wormhole_message(&hello.program_id, 6)
        );
    }

    #[tokio::test]
    async fn receive_posts_then_redeems() {
        let guardians = MockGuardians::devnet().unwrap();
        let mut source = MockEmitter::new(Chain::Ethereum, Address([9; 32]), guardians.clone());
        let (sequence, signed) = source.publish_hello(b"Hello World!").unwrap();

        let mut hello = program(FakeRpc::default());
        let guardian_set = GuardianSet {
            index:           0,
            keys:            guardians.addresses(),
            creation_time:   0,
            expiration_time: 0,
        };
        hello.rpc().set(
            GuardianSet::key(&hello.wormhole, 0),
            borsh::to_vec(&guardian_set).unwrap(),
        );

        // the program's side effect, stored up front since the fake does not execute anything
        let received = Received {
            batch_id:              0,
            wormhole_message_hash: [0; 32],
            message:               b"Hello World!".to_vec(),
        };
        let received_key = Received::key(&hello.program_id, (Chain::Ethereum, sequence));

        let vaa = vaa::parse(&signed).unwrap();
        let posted = PostedMessage::key(&hello.wormhole, vaa.digest().unwrap().hash);
        assert!(hello.rpc().account_data(&posted).await.unwrap().is_none());

        // receive fails because the fake never creates the Received account
        assert!(hello.receive(&signed).await.is_err());
        let sent = hello.rpc().sent();
        // verify batch, post_vaa, receive_message
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].len(), 2);
        assert_eq!(sent[2][0].program_id, hello.program_id);

        hello.rpc().set(
            received_key,
            anchor::serialize_account("Received", &received).unwrap(),
        );
        assert_eq!(hello.receive(&signed).await.unwrap(), b"Hello World!");
        assert_eq!(hello.rpc().sent().len(), 3);
    }
}
