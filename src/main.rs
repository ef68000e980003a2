use std::path::PathBuf;

use clap::Parser;

use status_monitor::lifecycle::{signals, startup, StartupError};
use status_monitor::observability::logging;
use status_monitor::Shutdown;

#[derive(Parser)]
#[command(name = "status-monitor")]
#[command(about = "Host liveness monitor with an event trail", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load(args.config.as_deref(), args.bind)?;
    logging::init_logging(&config.observability).map_err(StartupError::Logging)?;

    tracing::info!("status-monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    startup::start(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
