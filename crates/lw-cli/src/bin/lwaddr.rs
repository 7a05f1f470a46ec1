use std::process;

use clap::Parser;

use lw_protocol::address::parse_token;

#[derive(Parser, Debug)]
#[command(
    name = "lwaddr",
    about = "Translate between LiveWire source numbers, multicast addresses, MACs and stream IDs"
)]
struct Args {
    /// Source number, 8-hex-digit stream ID, MAC address or dotted-quad IPv4
    token: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match parse_token(&args.token) {
        Ok(found) => {
            for interpretation in &found {
                println!("{interpretation}");
            }
        }
        Err(e) => {
            eprintln!("lwaddr: {e}");
            process::exit(1);
        }
    }
}
