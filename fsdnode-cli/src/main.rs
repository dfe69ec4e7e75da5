//! FSD Node CLI - daemon driver
//!
//! Boots the node from a config file and drives the controller loop until
//! interrupted:
//!
//! ```text
//! fsdnode /etc/fsd/fsd.conf
//! ```
//!
//! Exit codes: 0 on clean shutdown (SIGINT), 1 on unrecoverable boot
//! failure (missing config, unwritable log directory).

mod error;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use error::CliError;
use fsdnode::config::ConfigManager;
use fsdnode::controller::Node;
use fsdnode::logging::{self, LoggingGuard};
use fsdnode::protocol::NullLink;
use fsdnode::time::SystemClock;

/// Supervisor cadence. The controller itself rate-limits duties to one
/// pass per wall-clock second; polling faster only bounds the latency of
/// sub-process pumping.
const TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "fsdnode")]
#[command(version = fsdnode::VERSION)]
#[command(about = "Flight Simulation Daemon federation node", long_about = None)]
struct Cli {
    /// Path to the daemon configuration file
    config: PathBuf,

    /// Base directory for logs (defaults to the install root, i.e. the
    /// parent of the directory containing this executable)
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (_guard, mut node) = match boot(&cli) {
        Ok(booted) => booted,
        Err(e) => e.exit(),
    };

    info!("FSD node v{} up, ident {}", fsdnode::VERSION, node.my_ident());

    let mut ticker = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => node.run(),
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
        }
    }
}

fn boot(cli: &Cli) -> Result<(LoggingGuard, Node), CliError> {
    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => logging::default_base_dir().map_err(|e| CliError::LoggingInit(e.to_string()))?,
    };
    let guard =
        logging::init_logging(&base_dir).map_err(|e| CliError::LoggingInit(e.to_string()))?;

    info!("Booting server");
    let config = ConfigManager::load(&cli.config).map_err(fsdnode::controller::BootError::from)?;
    let node = Node::new(config, Box::new(NullLink), Box::new(SystemClock))?;
    info!("We are up");

    Ok((guard, node))
}
