//! Operator events to outbound commands, plus the state the panel reflects.

use shared::{
    domain::{GainParameters, GridCell},
    protocol::ClientCommand,
};
use tracing::{info, warn};

use crate::{
    grid::GoalGrid,
    input::{
        compute_gamepad_command, compute_keyboard_command, DriveKey, GamepadSnapshot, InputState,
    },
};

pub const REBOOT_NOTICE: &str =
    "Reboot is not wired up: it needs a privileged endpoint on the vehicle.";

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorEvent {
    KeyDown(DriveKey),
    KeyUp(DriveKey),
    TurboChanged(bool),
    SpeedChanged(f64),
    Stop,
    ToggleAutonomy,
    ApplyGains { kp: String, ki: String, kd: String },
    TriggerOta,
    Reboot,
    SelectGoal(GridCell),
    ClearGoal,
    /// One gamepad poll; `None` when no gamepad is connected.
    GamepadTick(Option<GamepadSnapshot>),
    ChannelConnected,
    ChannelDisconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeleopState {
    input: InputState,
    autonomy: bool,
    grid: GoalGrid,
    connected: bool,
    notice: Option<String>,
}

impl TeleopState {
    pub fn new(input: InputState, grid: GoalGrid) -> Self {
        Self {
            input,
            autonomy: false,
            grid,
            connected: false,
            notice: None,
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn autonomy_enabled(&self) -> bool {
        self.autonomy
    }

    pub fn autonomy_label(&self) -> &'static str {
        if self.autonomy {
            "ON"
        } else {
            "OFF"
        }
    }

    pub fn grid(&self) -> &GoalGrid {
        &self.grid
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn drive_command(&self) -> Option<ClientCommand> {
        if self.autonomy {
            return None;
        }
        Some(ClientCommand::Axes(compute_keyboard_command(&self.input)))
    }
}

/// Applies one operator event and returns the message it should emit, if any.
pub fn handle(state: &mut TeleopState, event: OperatorEvent) -> Option<ClientCommand> {
    match event {
        OperatorEvent::KeyDown(key) => {
            state.input.press(key);
            state.drive_command()
        }
        OperatorEvent::KeyUp(key) => {
            state.input.release(key);
            state.drive_command()
        }
        OperatorEvent::TurboChanged(active) => {
            state.input.set_turbo(active);
            state.drive_command()
        }
        OperatorEvent::SpeedChanged(speed) => {
            state.input.set_speed(speed);
            state.drive_command()
        }
        OperatorEvent::GamepadTick(snapshot) => {
            if state.autonomy {
                return None;
            }
            let snapshot = snapshot?;
            Some(ClientCommand::Axes(compute_gamepad_command(
                &snapshot,
                state.input.speed(),
            )))
        }
        OperatorEvent::Stop => Some(ClientCommand::Brake {}),
        OperatorEvent::ToggleAutonomy => {
            state.autonomy = !state.autonomy;
            info!(autonomy = state.autonomy_label(), "autonomy toggled");
            Some(ClientCommand::Auton {
                enabled: state.autonomy,
            })
        }
        OperatorEvent::ApplyGains { kp, ki, kd } => {
            let gains = GainParameters {
                kp: parse_float_lenient(&kp),
                ki: parse_float_lenient(&ki),
                kd: parse_float_lenient(&kd),
            };
            if gains.has_invalid() {
                warn!(%kp, %ki, %kd, "sending gains with unparseable fields");
            }
            Some(ClientCommand::Pid(gains))
        }
        OperatorEvent::TriggerOta => Some(ClientCommand::Ota {}),
        OperatorEvent::Reboot => {
            state.notice = Some(REBOOT_NOTICE.to_string());
            None
        }
        OperatorEvent::SelectGoal(cell) => match state.grid.select(cell) {
            Some(goal) => Some(ClientCommand::Goal(goal)),
            None => {
                warn!(col = cell.col, row = cell.row, "ignoring goal outside grid");
                None
            }
        },
        OperatorEvent::ClearGoal => Some(ClientCommand::Goal(state.grid.clear())),
        OperatorEvent::ChannelConnected => {
            state.connected = true;
            None
        }
        OperatorEvent::ChannelDisconnected => {
            state.connected = false;
            None
        }
    }
}

/// Parses the longest numeric prefix after leading whitespace, like a browser `parseFloat`.
/// Anything without a numeric prefix yields NaN.
pub fn parse_float_lenient(raw: &str) -> f64 {
    let trimmed = raw.trim_start();

    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") && trimmed.len() - unsigned.len() <= 1 {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let candidate_len = trimmed
        .find(|c: char| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .unwrap_or(trimmed.len());
    let candidate = &trimmed[..candidate_len];

    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}
