use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use shared::{
    domain::{GainParameters, GridCell},
    protocol::ClientCommand,
};
use teleop_core::{
    input::compute_keyboard_command, load_settings, transport::wait_for_connection, DriveKey,
    InputState, Settings, TeleopChannel,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "teleop-cli", about = "Send a single command to the vehicle")]
struct Cli {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 5000)]
    connect_timeout_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Brake,
    Auton {
        #[arg(long, action = ArgAction::Set)]
        enabled: bool,
    },
    Pid {
        #[arg(allow_negative_numbers = true)]
        kp: f64,
        #[arg(allow_negative_numbers = true)]
        ki: f64,
        #[arg(allow_negative_numbers = true)]
        kd: f64,
    },
    Ota,
    Goal {
        col: u32,
        row: u32,
    },
    ClearGoal,
    /// Held keys as letters from wasdqe; any uppercase letter engages turbo.
    Drive {
        keys: String,
        #[arg(long)]
        speed: Option<f64>,
    },
}

fn build_command(command: &Command, settings: &Settings) -> Result<ClientCommand> {
    let built = match command {
        Command::Brake => ClientCommand::Brake {},
        Command::Auton { enabled } => ClientCommand::Auton { enabled: *enabled },
        Command::Pid { kp, ki, kd } => ClientCommand::Pid(GainParameters {
            kp: *kp,
            ki: *ki,
            kd: *kd,
        }),
        Command::Ota => ClientCommand::Ota {},
        Command::Goal { col, row } => {
            let mut grid = settings.goal_grid();
            let Some(target) = grid.select(GridCell::new(*col, *row)) else {
                bail!(
                    "cell ({col}, {row}) is outside the {}x{} goal grid",
                    grid.width(),
                    grid.height()
                );
            };
            ClientCommand::Goal(target)
        }
        Command::ClearGoal => ClientCommand::Goal(settings.goal_grid().clear()),
        Command::Drive { keys, speed } => {
            let mut input = InputState::new(speed.unwrap_or(settings.default_speed));
            for c in keys.chars() {
                let Some(key) = DriveKey::from_char(c) else {
                    bail!("'{c}' is not a drive key; use w, a, s, d, q or e");
                };
                input.press(key);
                if c.is_ascii_uppercase() {
                    input.set_turbo(true);
                }
            }
            ClientCommand::Axes(compute_keyboard_command(&input))
        }
    };
    Ok(built)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    let command = build_command(&cli.command, &settings)?;
    if let ClientCommand::Pid(gains) = &command {
        if gains.has_invalid() {
            warn!(?gains, "sending non-finite gains");
        }
    }

    let (channel, mut events) = TeleopChannel::spawn(&settings)?;
    wait_for_connection(
        &mut events,
        channel.url(),
        Duration::from_millis(cli.connect_timeout_ms),
    )
    .await
    .with_context(|| format!("could not reach {}", channel.url()))?;

    let payload = command.encode()?;
    channel
        .sender()
        .send(command)
        .context("channel stopped before the command was queued")?;
    info!(url = %channel.url(), "command queued");
    channel.close().await;

    // Handed to the channel task; it is discarded if the link dropped first.
    println!("queued {payload}");
    Ok(())
}
