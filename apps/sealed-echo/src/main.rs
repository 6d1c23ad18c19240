//! Sealed Echo
//!
//! `sealed-echo -l <port>` runs the encrypted echo server.
//! `sealed-echo <port> <message>` sends one message and prints the echo.

mod cli;

use clap::Parser;
use net_transport::{Client, KeyPair, SecureConfig, Server};
use tracing::{info, info_span};

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the echoed reply
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("sealed_echo=info,net_transport=info")
            }),
        )
        .init();

    let args = Args::parse();
    let config = args.secure_config()?;

    match args.listen {
        Some(port) => run_server(port, config).await,
        None => run_client(&args, config).await,
    }
}

async fn run_server(port: u16, config: SecureConfig) -> anyhow::Result<()> {
    info!("Starting Sealed Echo server");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    let server = Server::new(KeyPair::generate()?, config)
        .with_span(info_span!("sealed_echo", role = "server", port));

    tokio::select! {
        result = server.serve(listener) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}

async fn run_client(args: &Args, config: SecureConfig) -> anyhow::Result<()> {
    let (port, message) = args.client_target()?;

    let client = Client::new(KeyPair::generate()?, config)
        .with_span(info_span!("sealed_echo", role = "client", host = %args.host, port));
    let mut conn = client.connect((args.host.as_str(), port)).await?;
    conn.write(message.as_bytes()).await?;
    let reply = conn.read_message().await?;
    conn.close().await?;

    println!("{}", String::from_utf8_lossy(&reply));
    Ok(())
}
