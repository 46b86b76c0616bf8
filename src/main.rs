//! Demo binary for `bleframe`.
//!
//! Connects an initiator and an acceptor over an in-memory link pair and
//! echoes messages between them.

mod cli;

use std::{process::ExitCode, time::Duration};

use bleframe::{
    Acceptor,
    ConnectOutcome,
    Initiator,
    LinkConfig,
    MemoryDiscovery,
    MemoryLink,
    Peer,
    PeerError,
    Result,
};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();

    #[cfg(feature = "metrics")]
    let exporter = if cli.metrics {
        match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(error = %err, "failed to install metrics recorder");
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    let outcome = match build_config(&cli) {
        Ok(config) => run(config, &cli.message, cli.count).await,
        Err(err) => Err(err),
    };

    #[cfg(feature = "metrics")]
    if let Some(handle) = exporter {
        handle.run_upkeep();
        println!("{}", handle.render());
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "echo session failed");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &cli::Cli) -> Result<LinkConfig> {
    let config = LinkConfig::default()
        .with_mtu(cli.mtu)?
        .with_queue_capacity(cli.queue_capacity)?
        .with_max_message_size(cli.max_message_size)
        .with_discovery_timeout(Duration::from_secs(cli.discovery_timeout));
    Ok(config)
}

async fn run(config: LinkConfig, text: &str, count: u32) -> Result<()> {
    let (central_link, peripheral_link) = MemoryLink::pair(config.mtu);

    let (mut acceptor, handle) = Acceptor::new(config);
    let ConnectOutcome::Accepted(connection) = handle.on_connect(peripheral_link).await? else {
        return Err(PeerError::Closed);
    };
    let peripheral = acceptor.accept().await.ok_or(PeerError::Closed)?;
    let echo = tokio::spawn(echo(peripheral));

    let central = Initiator::new(config)
        .connect(MemoryDiscovery::new(central_link))
        .await?;

    for i in 1..=count {
        let message = format!("{text} #{i}");
        central.write(message.as_bytes()).await?;
        let reply = central.read().await?;
        println!("{}", String::from_utf8_lossy(&reply));
    }

    handle.on_disconnect(connection);
    match echo.await {
        Ok(result) => result,
        Err(err) => {
            error!(error = %err, "echo task failed");
            Err(PeerError::Closed)
        }
    }
}

async fn echo(peer: Peer<MemoryLink>) -> Result<()> {
    loop {
        match peer.read().await {
            Ok(message) => {
                info!(len = message.len(), "acceptor received message");
                peer.write(&message).await?;
            }
            Err(PeerError::Closed) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}
