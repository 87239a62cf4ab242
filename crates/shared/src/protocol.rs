use serde::{Deserialize, Serialize};

use crate::{
    domain::{GainParameters, GoalTarget},
    error::ProtocolError,
};

/// Normalized motion intent. `rotation` travels as `rot` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub ax: f64,
    pub ay: f64,
    #[serde(rename = "rot")]
    pub rotation: f64,
    pub turbo: bool,
    pub speed: f64,
}

impl MotionCommand {
    /// Explicit neutral command used to cancel motion below the gamepad deadzone.
    pub const NEUTRAL: MotionCommand = MotionCommand {
        ax: 0.0,
        ay: 0.0,
        rotation: 0.0,
        turbo: false,
        speed: 1.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    Axes(MotionCommand),
    Brake {},
    Auton { enabled: bool },
    Pid(GainParameters),
    Ota {},
    Goal(GoalTarget),
}

impl ClientCommand {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientCommand::Axes(_) => "axes",
            ClientCommand::Brake {} => "brake",
            ClientCommand::Auton { .. } => "auton",
            ClientCommand::Pid(_) => "pid",
            ClientCommand::Ota {} => "ota",
            ClientCommand::Goal(_) => "goal",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    PidAck { ok: bool },
    OtaResponse { log: String },
}

impl ServerEvent {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
