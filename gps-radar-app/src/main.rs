mod config;
mod logging;
mod permission;
mod source;
mod ui;

use std::{path::PathBuf, result::Result as StdResult, sync::Arc};

use anyhow::Context;
use clap::Parser;
use gps_radar_logic::{PermissionPrompt, Radar};
use log::info;
use tokio::sync::mpsc;

use crate::{
    config::{Overrides, RadarConfig},
    permission::{PreGranted, TerminalPrompt},
    source::LocationSource,
    ui::TerminalUpdateSender,
};

type Result<T = (), E = anyhow::Error> = StdResult<T, E>;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// JSON config file, any flags given override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the permission prompt and allow location access
    #[arg(long)]
    grant_location: bool,

    /// Where to write logs, defaults to gps-radar.log in the temp directory
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RadarConfig::load(path).await?,
        None => RadarConfig::default(),
    };
    config.apply(cli.overrides);

    let log_file = cli.log_file.unwrap_or_else(logging::default_log_path);
    logging::init(config.level_filter()?, &log_file)?;

    info!("Starting gps-radar {}", env!("CARGO_PKG_VERSION"));

    let source = LocationSource::from_config(&config).await?;

    let permission = if cli.grant_location {
        PreGranted.request_location().await
    } else {
        TerminalPrompt.request_location().await
    };

    let (update_tx, update_rx) = mpsc::channel(1);
    let radar = Arc::new(Radar::new(
        Arc::new(source),
        config.location_request(),
        TerminalUpdateSender::new(update_tx),
    ));

    let main_loop = tokio::spawn({
        let radar = radar.clone();
        async move {
            radar.main_loop().await;
        }
    });

    radar.resolve_permission(permission).await;

    let res = ui::run(radar.clone(), update_rx).await;

    radar.quit();
    main_loop.await.context("Radar loop panicked")?;

    res
}
