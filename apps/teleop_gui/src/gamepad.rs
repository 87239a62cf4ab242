use gilrs::{Axis, Button, Gilrs};
use teleop_core::{GamepadSnapshot, GamepadSource};
use tracing::{info, warn};

pub struct GilrsGamepad {
    gilrs: Gilrs,
}

impl GilrsGamepad {
    /// Returns `None` when the platform has no gamepad backend; the panel then runs keyboard-only.
    pub fn new() -> Option<Self> {
        match Gilrs::new() {
            Ok(gilrs) => {
                info!("gamepad backend ready");
                Some(Self { gilrs })
            }
            Err(err) => {
                warn!(%err, "gamepad support unavailable; keyboard only");
                None
            }
        }
    }
}

impl GamepadSource for GilrsGamepad {
    fn first_connected(&mut self) -> Option<GamepadSnapshot> {
        while self.gilrs.next_event().is_some() {}

        let (_, gamepad) = self
            .gilrs
            .gamepads()
            .find(|(_, gamepad)| gamepad.is_connected())?;
        Some(snapshot_from(
            |axis| gamepad.value(axis),
            |button| gamepad.is_pressed(button),
        ))
    }
}

pub struct NoGamepad;

impl GamepadSource for NoGamepad {
    fn first_connected(&mut self) -> Option<GamepadSnapshot> {
        None
    }
}

/// gilrs reports stick Y as up-positive; the snapshot uses down-positive.
fn snapshot_from(value: impl Fn(Axis) -> f32, pressed: impl Fn(Button) -> bool) -> GamepadSnapshot {
    GamepadSnapshot {
        axes: vec![
            f64::from(value(Axis::LeftStickX)),
            -f64::from(value(Axis::LeftStickY)),
            f64::from(value(Axis::RightStickX)),
            -f64::from(value(Axis::RightStickY)),
        ],
        buttons: [Button::South, Button::East, Button::West, Button::North]
            .into_iter()
            .map(pressed)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_stick_up_reads_as_negative_y() {
        let snapshot = snapshot_from(
            |axis| match axis {
                Axis::LeftStickX => 0.25,
                Axis::LeftStickY => 1.0,
                Axis::RightStickX => -0.5,
                _ => 0.0,
            },
            |button| button == Button::South,
        );
        assert_eq!(snapshot.axis(0), 0.25);
        assert_eq!(snapshot.axis(1), -1.0);
        assert_eq!(snapshot.axis(2), -0.5);
        assert!(snapshot.button(0));
        assert!(!snapshot.button(1));
    }
}
