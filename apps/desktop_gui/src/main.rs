use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use client_core::config::load_settings;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{ReservationApp, StartupConfig};

#[derive(Parser, Debug)]
struct Args {
    /// Item id, or an `/item/{id}` route.
    #[arg(long)]
    item: Option<String>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let settings =
        load_settings(args.config.as_deref())?.with_server_url_override(args.server_url);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings.clone());

    let startup = StartupConfig {
        route: args.item,
        settings,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Item Reservation")
            .with_inner_size([560.0, 760.0])
            .with_min_inner_size([420.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Item Reservation",
        options,
        Box::new(|_cc| Ok(Box::new(ReservationApp::bootstrap(cmd_tx, ui_rx, startup)))),
    )
    .map_err(|err| anyhow!("failed to run reservation window: {err}"))
}
