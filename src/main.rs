use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use statelink::rpc::Network;
use statelink::{Config, LocalState, RemoteState, RpcError, State};

#[derive(Parser)]
#[command(name = "statelink")]
#[command(about = "Expose or query a process's state fields over bounded-latency RPC")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Target {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address family: tcp or unix
    #[arg(short, long)]
    network: Option<String>,

    /// host:port for tcp, socket path for unix
    #[arg(short, long)]
    address: Option<String>,

    /// Per-call timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve a local state until interrupted
    Serve {
        #[command(flatten)]
        target: Target,

        /// Data directory reported to callers
        #[arg(long)]
        data_dir: Option<String>,

        /// Role reported to callers
        #[arg(long)]
        role: Option<String>,

        /// Database role reported to callers
        #[arg(long)]
        db_role: Option<String>,
    },

    /// Read one field from a remote state
    Get {
        #[command(flatten)]
        target: Target,

        #[arg(value_enum)]
        field: Field,
    },

    /// Set the synced flag of a remote state
    SetSynced {
        #[command(flatten)]
        target: Target,

        #[arg(action = clap::ArgAction::Set)]
        synced: bool,
    },

    /// Block until the remote state answers a probe
    WaitReady {
        #[command(flatten)]
        target: Target,

        /// Give up after this many milliseconds instead of waiting forever
        #[arg(long)]
        within_ms: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Field {
    DataDir,
    Role,
    DbRole,
    Synced,
}

impl Target {
    fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(network) = &self.network {
            config.network = network.parse::<Network>()?;
        }
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        Ok(config)
    }

    fn remote(&self) -> Result<RemoteState> {
        let config = self.resolve()?;
        Ok(RemoteState::new(config.network, &config.address, config.timeout())
            .with_ready_interval(config.ready_interval()))
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            target,
            data_dir,
            role,
            db_role,
        } => {
            let mut config = target.resolve()?;
            if let Some(data_dir) = data_dir {
                config.state.data_dir = data_dir;
            }
            if let Some(role) = role {
                config.state.role = role;
            }
            if let Some(db_role) = db_role {
                config.state.db_role = db_role;
            }

            let state = LocalState::from_record(config.state.record());
            let endpoint = state
                .expose(config.network, &config.address)
                .await
                .with_context(|| format!("exposing state on {}://{}", config.network, config.address))?;
            info!("Serving state at {}://{}", endpoint.network(), endpoint.local_addr());

            tokio::signal::ctrl_c().await?;
            info!("Interrupted, shutting down");
            endpoint.close();
        }
        Command::Get { target, field } => {
            let remote = target.remote()?;
            let value = match field {
                Field::DataDir => remote.data_dir().await?,
                Field::Role => remote.role().await?,
                Field::DbRole => remote.db_role().await?,
                Field::Synced => remote.has_synced().await?.to_string(),
            };
            println!("{value}");
        }
        Command::SetSynced { target, synced } => {
            let remote = target.remote()?;
            remote.set_synced(synced).await?;
        }
        Command::WaitReady { target, within_ms } => {
            let remote = target.remote()?;
            match within_ms {
                Some(ms) => remote
                    .ready_within(Duration::from_millis(ms))
                    .await
                    .map_err(|e: RpcError| anyhow::anyhow!("{} not ready: {e}", remote.location()))?,
                None => remote.ready().await,
            }
        }
    }

    Ok(())
}
