mod cli;

use {
    anyhow::Context,
    clap::Parser,
    cli::{
        Action,
        Cli,
    },
    log::{
        info,
        LevelFilter,
    },
    scaffolding_core::Chain,
    scaffolding_relayer::{
        config::Config,
        deploy::{
            self,
            SuiBuild,
        },
        mock::{
            MockEmitter,
            MockGuardians,
            MockHelloWorld,
        },
        relay,
        solana::{
            RpcClientAdapter,
            SolanaHelloWorld,
        },
        GuardianClient,
        HelloWorldContract,
        VaaSource,
    },
    solana_sdk::signature::read_keypair_file,
    std::path::Path,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("failed to load {path}"))?,
        None => Config::default(),
    };
    if let Some(payer) = cli.payer {
        config.solana.payer = payer;
    }
    if let Some(rpc_url) = cli.rpc_url {
        config.solana.rpc_url = rpc_url;
    }
    if let Some(hello_world) = cli.hello_world {
        config.solana.hello_world = hello_world;
    }
    if let Some(wormhole) = cli.wormhole {
        config.solana.wormhole = wormhole;
    }

    let guardians = GuardianClient::new(
        config.guardian.hosts.clone(),
        config.guardian.retry_interval(),
        config.guardian.max_attempts,
    );

    match cli.action {
        Action::Relay {
            message,
            emitter,
            airdrop,
        } => {
            let rpc = solana_rpc(&config)?;
            if let Some(lamports) = airdrop {
                rpc.airdrop(lamports).await?;
            }
            let mut target =
                SolanaHelloWorld::new(rpc, config.solana.hello_world, config.solana.wormhole);

            let mock_guardians = MockGuardians::devnet()?;
            let mut source = MockHelloWorld::new(MockEmitter::new(
                Chain::Ethereum,
                emitter,
                mock_guardians.clone(),
            ));

            let received =
                relay(&mut source, &mut target, &mock_guardians, message.as_bytes()).await?;
            println!("{}", String::from_utf8_lossy(&received));
        }
        Action::Send { message } => {
            let mut hello_world = SolanaHelloWorld::new(
                solana_rpc(&config)?,
                config.solana.hello_world,
                config.solana.wormhole,
            );
            let emitter = hello_world.deploy().await?;
            let sequence = hello_world.send(message.as_bytes()).await?;
            info!("Sent message with sequence {sequence}, waiting for the guardians");

            let vaa = guardians
                .fetch_vaa(Chain::Solana, emitter, sequence)
                .await?;
            println!("{}", hex::encode(vaa));
        }
        Action::FetchVaa {
            chain,
            emitter,
            sequence,
        } => {
            let vaa = guardians
                .fetch_vaa(Chain::from(chain), emitter, sequence)
                .await?;
            println!("{}", hex::encode(vaa));
        }
        Action::SuiBuild {
            package_path,
            move_toml,
            sui,
        } => {
            let mut build =
                SuiBuild::new(shellexpand::tilde(&package_path).into_owned()).sui_binary(sui);
            if let Some(move_toml) = move_toml {
                build = build.move_toml(shellexpand::tilde(&move_toml).into_owned());
            }
            let package = build.run()?;
            info!("Built {} modules from {package_path}", package.modules.len());
            println!("{}", serde_json::to_string(&package)?);
        }
        Action::EvmAddress {
            root,
            script,
            chain_id,
        } => {
            let address = deploy::read_deployed_address(Path::new(&root), &script, chain_id)?;
            println!("0x{}", hex::encode(&address.0[12..]));
        }
    }

    Ok(())
}

fn solana_rpc(config: &Config) -> anyhow::Result<RpcClientAdapter> {
    let path = shellexpand::tilde(&config.solana.payer);
    let payer = read_keypair_file(&*path)
        .map_err(|e| anyhow::anyhow!("failed to read payer keypair {path}: {e}"))?;
    Ok(RpcClientAdapter::new(config.solana.rpc_url.clone(), payer))
}

fn init_logging(verbosity: u32) {
    use LevelFilter::*;
    let filter = match verbosity {
        0..=1 => Error,
        2 => Warn,
        3 => Info,
        4 => Debug,
        _other => Trace,
    };

    env_logger::builder().filter_level(filter).init();
}
