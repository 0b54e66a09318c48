use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use postsig_lib::config::{Cli, Config, Signaling};
use postsig_lib::logger::{configure_tracing, LogTrackSurface, OutputLog};
use postsig_lib::peer::RtcConnector;
use postsig_lib::transport::{HttpTransport, SignalTransport, StdioTransport};
use postsig_lib::SignalingClient;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    configure_tracing();

    let args = Cli::parse();
    debug!(?args);
    let config = Config::try_from(args)?;

    let log = if config.echo_log {
        OutputLog::console()
    } else {
        OutputLog::quiet()
    };

    let transport: Arc<dyn SignalTransport> = match &config.signaling {
        Signaling::Http { endpoint } => Arc::new(HttpTransport::new(endpoint)?),
        Signaling::Manual => Arc::new(StdioTransport::stdio()),
    };

    let connector = RtcConnector::new(config.ice_servers.clone(), config.gather);
    let mut client = SignalingClient::connect(
        &connector,
        transport,
        log.clone(),
        Arc::new(LogTrackSurface::new(log)),
    )
    .await
    .context("creating peer connection")?;

    client.connect_once().await.context("signaling exchange")?;
    info!("Answer applied, waiting for media; Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    client.close().await?;
    Ok(())
}
