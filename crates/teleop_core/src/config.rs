use std::{fs, io, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::GainParameters;
use tracing::warn;

use crate::{
    error::{Result, TeleopError},
    grid::GoalGrid,
};

pub const DEFAULT_CONFIG_FILE: &str = "teleop.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub reconnect_delay_ms: u64,
    pub gamepad_poll_ms: u64,
    pub default_speed: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub grid_width: u32,
    pub grid_height: u32,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:5000/ws".into(),
            reconnect_delay_ms: 1000,
            gamepad_poll_ms: 50,
            default_speed: 1.0,
            speed_min: 0.0,
            speed_max: 1.0,
            grid_width: 16,
            grid_height: 10,
            kp: 0.35,
            ki: 0.0,
            kd: 0.015,
        }
    }
}

impl Settings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn gamepad_poll_period(&self) -> Duration {
        Duration::from_millis(self.gamepad_poll_ms)
    }

    pub fn default_gains(&self) -> GainParameters {
        GainParameters {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
        }
    }

    pub fn goal_grid(&self) -> GoalGrid {
        GoalGrid::new(self.grid_width, self.grid_height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(TeleopError::Config("server_url must not be empty".into()));
        }
        if self.gamepad_poll_ms == 0 {
            return Err(TeleopError::Config("gamepad_poll_ms must be positive".into()));
        }
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(TeleopError::Config(format!(
                "goal grid must have cells, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if !(0.0 <= self.speed_min
            && self.speed_min <= self.default_speed
            && self.default_speed <= self.speed_max)
        {
            return Err(TeleopError::Config(format!(
                "need 0 <= speed_min <= default_speed <= speed_max, got {} <= {} <= {}",
                self.speed_min, self.default_speed, self.speed_max
            )));
        }
        Ok(())
    }
}

/// Loads settings from defaults, then the config file, then `TELEOP__*` environment variables.
///
/// Without an explicit path a missing `teleop.toml` is not an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => parse_settings(&raw)
            .map_err(|err| TeleopError::Config(format!("{}: {err}", path.display())))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Settings::default(),
        Err(err) => {
            return Err(TeleopError::Config(format!(
                "failed to read '{}': {err}",
                path.display()
            )))
        }
    };

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

fn parse_settings(raw: &str) -> std::result::Result<Settings, toml::de::Error> {
    toml::from_str(raw)
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TELEOP__SERVER_URL") {
        settings.server_url = v;
    }
    override_parsed(&lookup, "TELEOP__RECONNECT_DELAY_MS", &mut settings.reconnect_delay_ms);
    override_parsed(&lookup, "TELEOP__GAMEPAD_POLL_MS", &mut settings.gamepad_poll_ms);
    override_parsed(&lookup, "TELEOP__DEFAULT_SPEED", &mut settings.default_speed);
    override_parsed(&lookup, "TELEOP__SPEED_MIN", &mut settings.speed_min);
    override_parsed(&lookup, "TELEOP__SPEED_MAX", &mut settings.speed_max);
    override_parsed(&lookup, "TELEOP__GRID_WIDTH", &mut settings.grid_width);
    override_parsed(&lookup, "TELEOP__GRID_HEIGHT", &mut settings.grid_height);
    override_parsed(&lookup, "TELEOP__KP", &mut settings.kp);
    override_parsed(&lookup, "TELEOP__KI", &mut settings.ki);
    override_parsed(&lookup, "TELEOP__KD", &mut settings.kd);
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => warn!(variable = name, value = %raw, "ignoring unparseable override"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
