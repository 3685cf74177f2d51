//! CLI options

use {
    clap::{
        Parser,
        Subcommand,
    },
    scaffolding_core::Address,
    solana_sdk::pubkey::Pubkey,
};

#[derive(Parser)]
#[command(
    about = "Relays HelloWorld messages through Wormhole",
    author = "Wormhole Contributors"
)]
pub struct Cli {
    /// Logging level, where 0..=1 RUST_LOG=error and 5.. is RUST_LOG=trace
    #[arg(short, long, default_value = "3")]
    pub log_level: u32,
    /// YAML config file. Flags below override its values.
    #[arg(short, long, env = "HELLO_RELAYER_CONFIG")]
    pub config: Option<String>,
    /// Identity JSON file for the entity meant to cover transaction costs
    #[arg(long)]
    pub payer: Option<String>,
    #[arg(long)]
    pub rpc_url: Option<String>,
    /// HelloWorld program id
    #[arg(long)]
    pub hello_world: Option<Pubkey>,
    /// Core bridge program id
    #[arg(long)]
    pub wormhole: Option<Pubkey>,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    /// Send a message from a mock Ethereum contract to HelloWorld on Solana, with VAAs signed by
    /// the devnet guardian key
    Relay {
        #[arg(long, default_value = "Hello World!")]
        message: String,
        /// Ethereum address the mock contract emits from
        #[arg(long, default_value = "0x00000000000000000000000000000000deadbeef")]
        emitter: Address,
        /// Airdrop this many lamports to the payer first
        #[arg(long)]
        airdrop: Option<u64>,
    },
    /// Send a message from HelloWorld on Solana and wait for the guardians to sign it
    Send {
        #[arg(long, default_value = "Hello World!")]
        message: String,
    },
    /// Fetch a signed VAA from the guardians and print it as hex
    FetchVaa {
        #[arg(long)]
        chain: u16,
        #[arg(long)]
        emitter: Address,
        #[arg(long)]
        sequence: u64,
    },
    /// Build a Sui Move package and print its modules as JSON, ready to be published
    SuiBuild {
        /// path/to/move/package
        #[arg(short, long)]
        package_path: String,
        /// Move.toml to build with in place of the package's own
        #[arg(short, long)]
        move_toml: Option<String>,
        #[arg(long, default_value = "sui")]
        sui: String,
    },
    /// Print the address of a contract deployed by a forge script
    EvmAddress {
        /// Directory holding forge's `broadcast/`
        #[arg(long, default_value = ".")]
        root: String,
        #[arg(long, default_value = "deploy_01_hello_world.sol")]
        script: String,
        #[arg(long)]
        chain_id: u64,
    },
}

