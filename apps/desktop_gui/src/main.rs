use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use ticket_core::{load_settings, resolve_database_url};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{AppViewState, TicketApp};

#[derive(Debug, Parser)]
#[command(name = "conf-ticket", about = "Conference ticket generator")]
struct Args {
    /// Settings file; defaults to ./ticket.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured database location.
    #[arg(long)]
    database_url: Option<String>,
    /// Directory for the default database when no url is configured.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Open straight onto the stored ticket.
    #[arg(long)]
    show_ticket: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;
    let database_url = resolve_database_url(
        args.database_url.as_deref(),
        &settings,
        args.data_dir.as_deref(),
    )?;
    tracing::info!(database_url = %database_url, "starting conf ticket");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, database_url, settings.event.clone());

    let initial_view = if args.show_ticket {
        AppViewState::Confirmation
    } else {
        AppViewState::Form
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Conf Ticket")
            .with_inner_size([720.0, 860.0])
            .with_min_inner_size([420.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Conf Ticket",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(TicketApp::new(
                cmd_tx,
                ui_rx,
                settings,
                initial_view,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("gui exited with error: {err}"))
}
