use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use wsclient::Shutdown;
use wsclient::driver::{self, DriverConfig};
use wsclient::shutdown::spawn_interrupt_listener;

#[derive(Parser, Debug)]
#[command(name = "wsclient", about = "Connect to a WebSocket server, send one message, print what comes back")]
struct Cli {
    #[arg(long, env = "WS_URL", default_value = driver::DEFAULT_ENDPOINT)]
    url: String,

    #[arg(long, env = "WS_MESSAGE", default_value = driver::DEFAULT_MESSAGE)]
    message: String,

    #[arg(long, env = "WS_SEND_DELAY_MS", default_value_t = driver::DEFAULT_SEND_DELAY_MS)]
    send_delay_ms: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = DriverConfig {
        endpoint: cli.url,
        message: cli.message,
        send_delay: Duration::from_millis(cli.send_delay_ms),
    };

    let shutdown = Shutdown::new();
    let _interrupt = spawn_interrupt_listener(shutdown.clone());

    match driver::run(&config, &shutdown).await {
        Ok(summary) => {
            tracing::info!(exit = ?summary.exit, received = summary.received.len(), "client finished");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %error, endpoint = %config.endpoint, "connection error");
            ExitCode::FAILURE
        }
    }
}
