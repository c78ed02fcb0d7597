//! Signaling server binary entry point
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port (9010), any origin admitted
//! cargo run --bin signaling-server
//!
//! # Production: fixed port and origin allow-list
//! cargo run --bin signaling-server -- \
//!   --port 9010 \
//!   --allowed-origins http://localhost:5500,https://operator.example.com
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use teleop_signaling::{SignalingConfig, SignalingServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Teleop Signaling Server
///
/// Rendezvous relay for one robot/frontend peer pair: brokers the
/// offer/answer/candidate handshake over WebSocket, then gets out of the
/// way of the direct peer-to-peer channel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0", env = "SIGNALING_BIND_ADDRESS")]
    bind_address: String,

    /// Listening port
    #[arg(short, long, default_value_t = 9010, env = "PORT")]
    port: u16,

    /// Admitted browser origins (comma-separated; empty admits any origin)
    #[arg(long, value_delimiter = ',', env = "SIGNALING_ALLOWED_ORIGINS")]
    allowed_origins: Vec<String>,

    /// Per-connection outbound event queue capacity
    #[arg(long, default_value_t = 128, env = "SIGNALING_CHANNEL_CAPACITY")]
    channel_capacity: usize,
}

fn build_config_from_args(args: &Args) -> SignalingConfig {
    SignalingConfig {
        bind_address: args.bind_address.clone(),
        port: args.port,
        allowed_origins: args.allowed_origins.clone(),
        channel_capacity: args.channel_capacity,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Ctrl+C flips the flag; a second press forces immediate exit.
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_handler = Arc::clone(&shutdown_flag);
    ctrlc::set_handler(move || {
        let was_already_set = shutdown_flag_handler.swap(true, Ordering::SeqCst);
        if was_already_set {
            eprintln!("Shutdown already in progress, forcing immediate exit");
            std::process::exit(0);
        }
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("signaling-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, shutdown_flag))
}

async fn async_main(
    args: Args,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = build_config_from_args(&args);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address,
        port = config.port,
        allowed_origins = ?config.allowed_origins,
        "Signaling server starting"
    );

    let server = SignalingServer::new(config)?;
    let handle = server.start().await?;

    info!("Server running. Press Ctrl+C to shutdown.");
    while !shutdown_flag.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    info!("Shutdown signal received, stopping server...");
    handle.shutdown().await;
    info!("Signaling server shut down gracefully");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
