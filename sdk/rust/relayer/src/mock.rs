//! Stand-ins for the guardian network and for HelloWorld contracts, for running the relayer
//! without a guardian node.
//!
//! [`MockGuardians`] sign observations with local keys. A Solana validator running the devnet
//! core bridge accepts VAAs signed by [`MockGuardians::devnet`], since the devnet guardian set is
//! the single key below.

use {
    crate::{
        contract::HelloWorldContract,
        guardian::VaaSource,
    },
    anyhow::{
        anyhow,
        bail,
        Context,
    },
    libsecp256k1::{
        Message,
        PublicKey,
        SecretKey,
    },
    scaffolding_core::{
        hello_world::HelloWorldMessage,
        vaa::{
            self,
            Body,
            Header,
            Signature,
            Vaa,
            VAA_VERSION,
        },
        Address,
        Chain,
    },
    serde::Serialize,
    serde_wormhole::RawMessage,
    sha3::{
        Digest,
        Keccak256,
    },
    std::{
        collections::HashMap,
        sync::{
            Arc,
            Mutex,
        },
        time::{
            SystemTime,
            UNIX_EPOCH,
        },
    },
};

/// Private key of the only guardian of the devnet guardian set.
pub const DEVNET_GUARDIAN_KEY: &str =
    "cfb12303a19cde580bb4dd771639b0d26bc68353645571a8cff516ab2ee113a0";

type Observations = HashMap<(Chain, Address, u64), Vec<u8>>;

/// Ethereum style address of the guardian holding `key`.
pub fn guardian_address(key: &SecretKey) -> [u8; 20] {
    let public = PublicKey::from_secret_key(key).serialize();
    let hash = Keccak256::digest(&public[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// A guardian set made of local keys. Clones share the VAAs signed so far.
#[derive(Clone)]
pub struct MockGuardians {
    guardian_set_index: u32,
    keys:               Vec<SecretKey>,
    observations:       Arc<Mutex<Observations>>,
}

impl MockGuardians {
    pub fn new(guardian_set_index: u32, keys: Vec<SecretKey>) -> Self {
        MockGuardians {
            guardian_set_index,
            keys,
            observations: Arc::default(),
        }
    }

    pub fn devnet() -> anyhow::Result<Self> {
        let mut key = [0u8; 32];
        hex::decode_to_slice(DEVNET_GUARDIAN_KEY, &mut key)?;
        let key = SecretKey::parse(&key).map_err(|e| anyhow!("invalid guardian key: {e:?}"))?;
        Ok(Self::new(0, vec![key]))
    }

    pub fn guardian_set_index(&self) -> u32 {
        self.guardian_set_index
    }

    pub fn addresses(&self) -> Vec<[u8; 20]> {
        self.keys.iter().map(guardian_address).collect()
    }

    /// Signs `body` with every guardian and returns the serialized VAA. Signatures are
    /// `r | s | recovery id` over the double keccak digest of the body.
    pub fn sign<P: Serialize>(&self, body: Body<P>) -> anyhow::Result<Vec<u8>> {
        let digest = body.digest()?;
        let message = Message::parse(&digest.secp256k_hash);

        let signatures = self
            .keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let (sig, recovery_id) = libsecp256k1::sign(&message, key);
                let mut signature = [0u8; 65];
                signature[..64].copy_from_slice(&sig.serialize());
                signature[64] = recovery_id.serialize();
                Signature {
                    index: index as u8,
                    signature,
                }
            })
            .collect();

        let header = Header {
            version: VAA_VERSION,
            guardian_set_index: self.guardian_set_index,
            signatures,
        };
        Vaa::from((header, body)).to_bytes()
    }

    /// Makes a signed VAA available to [`VaaSource::fetch_vaa`].
    pub fn observe(&self, signed_vaa: Vec<u8>) -> anyhow::Result<()> {
        let vaa = vaa::parse(&signed_vaa)?;
        let key = (vaa.emitter_chain, vaa.emitter_address, vaa.sequence);
        self.observations
            .lock()
            .map_err(|_| anyhow!("observation store poisoned"))?
            .insert(key, signed_vaa);
        Ok(())
    }
}

impl VaaSource for MockGuardians {
    async fn fetch_vaa(
        &self,
        chain: Chain,
        emitter: Address,
        sequence: u64,
    ) -> anyhow::Result<Vec<u8>> {
        self.observations
            .lock()
            .map_err(|_| anyhow!("observation store poisoned"))?
            .get(&(chain, emitter, sequence))
            .cloned()
            .with_context(|| format!("no VAA observed for {chain}/{emitter}/{sequence}"))
    }
}

/// Publishes messages from a fixed emitter, signed by `guardians`.
#[derive(Clone)]
pub struct MockEmitter {
    pub chain:   Chain,
    pub address: Address,
    sequence:    u64,
    guardians:   MockGuardians,
}

impl MockEmitter {
    pub fn new(chain: Chain, address: Address, guardians: MockGuardians) -> Self {
        MockEmitter {
            chain,
            address,
            sequence: 0,
            guardians,
        }
    }

    /// Sequence of the next published message.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Emits `payload` with nonce 0 and consistency level 1. Returns its sequence and the signed
    /// VAA, which the guardians also keep for [`VaaSource::fetch_vaa`].
    pub fn publish(&mut self, payload: &[u8]) -> anyhow::Result<(u64, Vec<u8>)> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as u32;
        let sequence = self.sequence;

        let signed_vaa = self.guardians.sign(Body {
            timestamp,
            nonce: 0,
            emitter_chain: self.chain,
            emitter_address: self.address,
            sequence,
            consistency_level: 1,
            payload: RawMessage::new(payload),
        })?;
        self.guardians.observe(signed_vaa.clone())?;

        self.sequence += 1;
        Ok((sequence, signed_vaa))
    }

    pub fn publish_hello(&mut self, message: &[u8]) -> anyhow::Result<(u64, Vec<u8>)> {
        let payload = HelloWorldMessage::hello(message).encode()?;
        self.publish(&payload)
    }
}

/// In-memory HelloWorld contract. It checks what the on-chain programs check about a VAA's
/// emitter and replays, but trusts the signatures.
pub struct MockHelloWorld {
    emitter:          MockEmitter,
    deployed:         bool,
    foreign_emitters: HashMap<Chain, Address>,
    received:         HashMap<(Chain, u64), Vec<u8>>,
}

impl MockHelloWorld {
    pub fn new(emitter: MockEmitter) -> Self {
        MockHelloWorld {
            emitter,
            deployed: false,
            foreign_emitters: HashMap::new(),
            received: HashMap::new(),
        }
    }

    pub fn foreign_emitter(&self, chain: Chain) -> Option<Address> {
        self.foreign_emitters.get(&chain).copied()
    }

    fn ensure_deployed(&self) -> anyhow::Result<()> {
        if !self.deployed {
            bail!("HelloWorld is not deployed on {}", self.emitter.chain);
        }
        Ok(())
    }
}

impl HelloWorldContract for MockHelloWorld {
    fn chain(&self) -> Chain {
        self.emitter.chain
    }

    async fn deploy(&mut self) -> anyhow::Result<Address> {
        self.deployed = true;
        Ok(self.emitter.address)
    }

    async fn register_emitter(&mut self, chain: Chain, address: Address) -> anyhow::Result<()> {
        self.ensure_deployed()?;
        if chain == Chain::Any {
            bail!("chain id 0 is reserved");
        }
        if chain == self.emitter.chain {
            bail!("cannot register an emitter on the contract's own chain");
        }
        if address.is_zero() {
            bail!("emitter address is zero");
        }

        self.foreign_emitters.insert(chain, address);
        Ok(())
    }

    async fn send(&mut self, message: &[u8]) -> anyhow::Result<u64> {
        self.ensure_deployed()?;
        let (sequence, _) = self.emitter.publish_hello(message)?;
        Ok(sequence)
    }

    async fn receive(&mut self, signed_vaa: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.ensure_deployed()?;
        let vaa = vaa::parse(signed_vaa)?;

        match self.foreign_emitters.get(&vaa.emitter_chain) {
            Some(address) if *address == vaa.emitter_address => {}
            _ => bail!(
                "unknown emitter {} on {}",
                vaa.emitter_address,
                vaa.emitter_chain
            ),
        }

        let key = (vaa.emitter_chain, vaa.sequence);
        if self.received.contains_key(&key) {
            bail!("VAA {}/{} already received", vaa.emitter_chain, vaa.sequence);
        }

        let message = HelloWorldMessage::decode(vaa.payload)?.message().to_vec();
        self.received.insert(key, message.clone());
        Ok(message)
    }
}
