use crate::commands;
use crate::config::{Config, TimingFlags};
use crate::registry::NetworkRegistry;
use crate::rpc::RpcConnector;
use crate::tracker::{TraceMode, Tracker};
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "retryable-tracker",
    version,
    about = "Trace Arbitrum cross-chain messages from a transaction hash"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Endpoint override as CHAIN_ID=URL; may be repeated.
    #[arg(long = "rpc", global = true, value_name = "CHAIN_ID=URL")]
    pub rpc: Vec<String>,

    /// How long to wait for a ticket to show up on L2.
    #[arg(long, global = true)]
    pub status_wait_ms: Option<u64>,

    #[arg(long, global = true)]
    pub request_timeout_ms: Option<u64>,

    /// L1 block time used for challenge period estimates.
    #[arg(long, global = true)]
    pub seconds_per_block: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub async fn run(self, mut config: Config) -> Result<()> {
        config.apply_rpc_flags(&self.rpc)?;
        let timing = config.timing(TimingFlags {
            status_wait_ms: self.status_wait_ms,
            request_timeout_ms: self.request_timeout_ms,
            seconds_per_block: self.seconds_per_block,
        });
        let registry = Arc::new(NetworkRegistry::from_config(&config)?);
        tracing::debug!(
            networks = registry.all().len(),
            config = %config.path.display(),
            "registry loaded"
        );
        let connector = Arc::new(RpcConnector {
            rpc_timeout: timing.rpc_timeout,
        });
        let tracker = Tracker::new(registry, connector, timing.into());

        match self.command {
            Command::L1(args) => commands::trace::run(args, &tracker, TraceMode::L1ToL2).await,
            Command::L2(args) => commands::trace::run(args, &tracker, TraceMode::L2ToL1).await,
            Command::Trace(args) => commands::trace::run(args, &tracker, TraceMode::Auto).await,
            Command::Watch(args) => commands::watch::run(args, tracker).await,
            Command::Networks(args) => {
                commands::networks::run(args, tracker.registry(), timing.rpc_timeout).await
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Trace the L1 to L2 messages created by an L1 transaction.
    L1(TraceArgs),
    /// Trace the L2 to L1 messages created by an L2 transaction.
    L2(TraceArgs),
    /// Look the hash up on L1 first, then on L2.
    Trace(TraceArgs),
    /// Read hashes from stdin; each new line replaces the running query.
    Watch(WatchArgs),
    /// List the configured networks.
    Networks(NetworksArgs),
}

#[derive(Args, Debug)]
pub struct TraceArgs {
    pub tx_hash: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionArg {
    L1,
    L2,
    Auto,
}

impl From<DirectionArg> for TraceMode {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::L1 => TraceMode::L1ToL2,
            DirectionArg::L2 => TraceMode::L2ToL1,
            DirectionArg::Auto => TraceMode::Auto,
        }
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[arg(long, value_enum, default_value_t = DirectionArg::Auto)]
    pub direction: DirectionArg,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct NetworksArgs {
    /// Ask every endpoint for its chain id.
    #[arg(long)]
    pub probe: bool,

    #[arg(long)]
    pub json: bool,
}
