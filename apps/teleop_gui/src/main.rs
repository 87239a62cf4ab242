use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod gamepad;
mod ui;

use anyhow::anyhow;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use teleop_core::{load_settings, GamepadSource};
use tracing_subscriber::EnvFilter;

use crate::{
    backend_bridge::BridgeEvent,
    gamepad::{GilrsGamepad, NoGamepad},
    ui::TeleopApp,
};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `teleop.toml` in the working directory is read when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }

    let (ui_tx, ui_rx) = bounded::<BridgeEvent>(256);
    let commands = backend_bridge::launch(&settings, ui_tx)?;

    let gamepad: Box<dyn GamepadSource> = match GilrsGamepad::new() {
        Some(gamepad) => Box::new(gamepad),
        None => Box::new(NoGamepad),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Vehicle Teleop")
            .with_inner_size([560.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Vehicle Teleop",
        options,
        Box::new(move |_cc| Ok(Box::new(TeleopApp::new(&settings, commands, ui_rx, gamepad)))),
    )
    .map_err(|err| anyhow!("teleop window failed: {err}"))
}
