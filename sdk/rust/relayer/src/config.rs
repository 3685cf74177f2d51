//! Relayer configuration, read from a YAML file. Solana addresses are written as base58 strings.

use {
    serde::{
        de::Error,
        Deserialize,
        Deserializer,
        Serialize,
        Serializer,
    },
    solana_sdk::{
        pubkey,
        pubkey::Pubkey,
    },
    std::{
        path::Path,
        str::FromStr,
        time::Duration,
    },
};

pub const HELLO_WORLD_PROGRAM_ID: Pubkey = pubkey!("3v6vnffes8BPB3tuYcMfQEp15FPjGobYaqDJn96qSb2Q");

/// Core bridge of the local validator.
pub const WORMHOLE_PROGRAM_ID: Pubkey = pubkey!("worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth");

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub solana:   SolanaConfig,
    pub guardian: GuardianConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolanaConfig {
    pub rpc_url:     String,
    /// Keypair file paying for transactions. `~` is expanded.
    pub payer:       String,
    #[serde(
        deserialize_with = "pubkey_string_de",
        serialize_with = "pubkey_string_ser"
    )]
    pub hello_world: Pubkey,
    #[serde(
        deserialize_with = "pubkey_string_de",
        serialize_with = "pubkey_string_ser"
    )]
    pub wormhole:    Pubkey,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        SolanaConfig {
            rpc_url:     "http://localhost:8899".to_owned(),
            payer:       "~/.config/solana/id.json".to_owned(),
            hello_world: HELLO_WORLD_PROGRAM_ID,
            wormhole:    WORMHOLE_PROGRAM_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Guardian REST endpoints, tried in turn.
    pub hosts:             Vec<String>,
    pub retry_interval_ms: u64,
    pub max_attempts:      usize,
}

impl GuardianConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for GuardianConfig {
    fn default() -> Self {
        GuardianConfig {
            hosts:             vec!["http://localhost:7070".to_owned()],
            retry_interval_ms: 1000,
            max_attempts:      60,
        }
    }
}

fn pubkey_string_ser<S>(k: &Pubkey, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.serialize_str(&k.to_string())
}

fn pubkey_string_de<'de, D>(de: D) -> Result<Pubkey, D::Error>
where
    D: Deserializer<'de>,
{
    let pubkey_string = String::deserialize(de)?;
    Pubkey::from_str(&pubkey_string).map_err(D::Error::custom)
}
