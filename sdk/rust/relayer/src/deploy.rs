//! Glue around the toolchains that deploy the example contracts: `sui move build` for the Move
//! packages and the broadcast files forge leaves behind after running a deploy script.

use {
    anyhow::{
        bail,
        Context,
    },
    log::{
        debug,
        warn,
    },
    scaffolding_core::Address,
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs,
        path::{
            Path,
            PathBuf,
        },
        process::Command,
        time::{
            SystemTime,
            UNIX_EPOCH,
        },
    },
};

/// Forge scripts deploying the EVM contracts.
pub const HELLO_WORLD_SCRIPT: &str = "deploy_01_hello_world.sol";
pub const HELLO_TOKEN_SCRIPT: &str = "deploy_02_hello_token.sol";
pub const WORM_USD_SCRIPT: &str = "deploy_wormUSD.sol";

/// Base64 encoded bytecode of a built Move package, ready to be published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPackage {
    pub modules:      Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BuildOutput {
    Package(CompiledPackage),
    /// Older `sui` releases print the bare list of modules.
    Modules(Vec<String>),
}

/// Parses the stdout of `sui move build --dump-bytecode-as-base64`.
pub fn parse_build_output(stdout: &str) -> anyhow::Result<CompiledPackage> {
    let output: BuildOutput =
        serde_json::from_str(stdout.trim()).context("unexpected sui move build output")?;

    let package = match output {
        BuildOutput::Package(package) => package,
        BuildOutput::Modules(modules) => CompiledPackage {
            modules,
            dependencies: Vec::new(),
        },
    };
    if package.modules.is_empty() {
        bail!("sui move build produced no modules");
    }

    Ok(package)
}

/// Puts another Move.toml in place of a package's own for the length of a build. The original is
/// moved back when this is dropped, whether the build succeeded or not.
struct MoveTomlSwap {
    original: PathBuf,
    backup:   PathBuf,
}

impl MoveTomlSwap {
    fn new(package: &Path, build_toml: &Path) -> anyhow::Result<Option<Self>> {
        let original = package.join("Move.toml");
        if fs::canonicalize(&original)? == fs::canonicalize(build_toml)? {
            return Ok(None);
        }

        let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let backup = package.join(format!(".tmp.{stamp}.Move.toml"));
        if backup.exists() {
            bail!("{} already exists, try again", backup.display());
        }

        fs::copy(&original, &backup)
            .with_context(|| format!("failed to back up {}", original.display()))?;
        let swap = MoveTomlSwap { original, backup };
        fs::copy(build_toml, &swap.original)
            .with_context(|| format!("failed to copy {}", build_toml.display()))?;

        debug!(
            "Building {} with {}",
            package.display(),
            build_toml.display()
        );
        Ok(Some(swap))
    }
}

impl Drop for MoveTomlSwap {
    fn drop(&mut self) {
        if let Err(e) = fs::rename(&self.backup, &self.original) {
            warn!(
                "failed to restore {} from {}: {e}",
                self.original.display(),
                self.backup.display()
            );
        }
    }
}

/// Builds a Move package with the `sui` CLI.
#[derive(Debug, Clone)]
pub struct SuiBuild {
    sui:       PathBuf,
    package:   PathBuf,
    move_toml: Option<PathBuf>,
}

impl SuiBuild {
    pub fn new(package: impl Into<PathBuf>) -> Self {
        SuiBuild {
            sui:       PathBuf::from("sui"),
            package:   package.into(),
            move_toml: None,
        }
    }

    /// Path to the `sui` binary, `sui` from `PATH` by default.
    pub fn sui_binary(mut self, sui: impl Into<PathBuf>) -> Self {
        self.sui = sui.into();
        self
    }

    /// Builds with this Move.toml instead of the package's own, for example one pointing the
    /// Wormhole dependency at a local checkout.
    pub fn move_toml(mut self, move_toml: impl Into<PathBuf>) -> Self {
        self.move_toml = Some(move_toml.into());
        self
    }

    pub fn run(&self) -> anyhow::Result<CompiledPackage> {
        if !self.package.is_dir() {
            bail!("invalid package path {}", self.package.display());
        }

        let build_toml = self
            .move_toml
            .clone()
            .unwrap_or_else(|| self.package.join("Move.toml"));
        if build_toml.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            bail!("{} is not a TOML file", build_toml.display());
        }
        if !build_toml.is_file() {
            bail!("{} does not exist", build_toml.display());
        }

        let _swap = MoveTomlSwap::new(&self.package, &build_toml)?;

        let output = Command::new(&self.sui)
            .args(["move", "build", "--dump-bytecode-as-base64", "--path"])
            .arg(&self.package)
            .output()
            .with_context(|| format!("failed to execute {} move build", self.sui.display()))?;

        if !output.status.success() {
            bail!(
                "sui move build failed:\nstderr: {}\nstdout: {}",
                String::from_utf8_lossy(&output.stderr),
                String::from_utf8_lossy(&output.stdout)
            );
        }

        parse_build_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Deserialize)]
struct BroadcastRun {
    transactions: Vec<BroadcastTransaction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastTransaction {
    contract_address: Option<String>,
}

/// Where forge records the latest run of `script` against `chain_id`.
pub fn broadcast_path(root: &Path, script: &str, chain_id: u64) -> PathBuf {
    root.join("broadcast")
        .join(script)
        .join(chain_id.to_string())
        .join("run-latest.json")
}

/// Address of the contract created by the first transaction of a broadcast.
pub fn parse_deployed_address(run_latest: &str) -> anyhow::Result<Address> {
    let run: BroadcastRun = serde_json::from_str(run_latest)?;
    let address = run
        .transactions
        .first()
        .and_then(|tx| tx.contract_address.as_deref())
        .context("broadcast does not start with a contract deployment")?;

    let address = Address::from_hex(address)?;
    if address.to_evm().is_none() {
        bail!("{address} is not an EVM address");
    }
    Ok(address)
}

pub fn read_deployed_address(root: &Path, script: &str, chain_id: u64) -> anyhow::Result<Address> {
    let path = broadcast_path(root, script, chain_id);
    let run_latest = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_deployed_address(&run_latest).with_context(|| format!("malformed {}", path.display()))
}
