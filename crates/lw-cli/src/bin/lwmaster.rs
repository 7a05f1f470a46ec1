use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use lw_discovery::{discover_master, DEFAULT_TIMEOUT};

#[derive(Parser, Debug)]
#[command(
    name = "lwmaster",
    about = "Print the IPv4 address of the LiveWire master node (0.0.0.0 if none is heard)"
)]
struct Args {
    /// Listening budget in milliseconds before concluding no master is present
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // A timeout is a successful run: the sentinel address prints and the
    // exit status stays zero. Only setup/capture failures are fatal.
    let outcome = match discover_master(Duration::from_millis(args.timeout_ms)) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "discovery failed");
            return Err(e).context("lwmaster: discovery failed");
        }
    };
    println!("{}", outcome.address());
    Ok(())
}
