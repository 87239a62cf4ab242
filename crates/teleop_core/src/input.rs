//! Keyboard and gamepad translation into [`MotionCommand`]s.

use std::collections::HashSet;

use shared::protocol::MotionCommand;

/// Analog magnitude at or below which a gamepad is treated as centered.
pub const GAMEPAD_DEADZONE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveKey {
    Forward,
    Back,
    Left,
    Right,
    RotateLeft,
    RotateRight,
}

impl DriveKey {
    pub const ALL: [DriveKey; 6] = [
        DriveKey::Forward,
        DriveKey::Back,
        DriveKey::Left,
        DriveKey::Right,
        DriveKey::RotateLeft,
        DriveKey::RotateRight,
    ];

    /// `w`/`s`/`a`/`d` translate, `q`/`e` rotate. Case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(DriveKey::Forward),
            's' => Some(DriveKey::Back),
            'a' => Some(DriveKey::Left),
            'd' => Some(DriveKey::Right),
            'q' => Some(DriveKey::RotateLeft),
            'e' => Some(DriveKey::RotateRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    held: HashSet<DriveKey>,
    turbo: bool,
    speed: f64,
}

impl InputState {
    pub fn new(speed: f64) -> Self {
        Self {
            held: HashSet::new(),
            turbo: false,
            speed,
        }
    }

    pub fn press(&mut self, key: DriveKey) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: DriveKey) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: DriveKey) -> bool {
        self.held.contains(&key)
    }

    pub fn set_turbo(&mut self, active: bool) {
        self.turbo = active;
    }

    pub fn turbo(&self) -> bool {
        self.turbo
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    fn level(&self, key: DriveKey) -> f64 {
        if self.is_held(key) {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Translation is scaled down by its L1 norm so diagonals never exceed unit length.
/// Rotation passes through untouched.
pub fn compute_keyboard_command(state: &InputState) -> MotionCommand {
    let ax = state.level(DriveKey::Right) - state.level(DriveKey::Left);
    let ay = state.level(DriveKey::Back) - state.level(DriveKey::Forward);
    let rotation = state.level(DriveKey::RotateRight) - state.level(DriveKey::RotateLeft);
    let norm = (ax.abs() + ay.abs()).max(1.0);

    MotionCommand {
        ax: ax / norm,
        ay: ay / norm,
        rotation,
        turbo: state.turbo(),
        speed: state.speed(),
    }
}

/// Raw gamepad reading in standard browser-gamepad order.
///
/// Axis 0/1 are the left stick (Y grows downward), axis 2 is the right stick X,
/// button 0 is the bottom face button.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub axes: Vec<f64>,
    pub buttons: Vec<bool>,
}

impl GamepadSnapshot {
    pub fn axis(&self, index: usize) -> f64 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

pub trait GamepadSource {
    /// Current state of the first connected gamepad, if any.
    fn first_connected(&mut self) -> Option<GamepadSnapshot>;
}

/// Inside the deadzone this returns [`MotionCommand::NEUTRAL`], which always carries speed 1.0
/// regardless of the slider.
pub fn compute_gamepad_command(snapshot: &GamepadSnapshot, speed: f64) -> MotionCommand {
    let ax = snapshot.axis(0);
    let ay = snapshot.axis(1);
    let rotation = snapshot.axis(2);
    let magnitude = (ax * ax + ay * ay + rotation * rotation).sqrt();

    if magnitude > GAMEPAD_DEADZONE {
        MotionCommand {
            ax,
            ay,
            rotation,
            turbo: snapshot.button(0),
            speed,
        }
    } else {
        MotionCommand::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[DriveKey]) -> InputState {
        let mut state = InputState::default();
        for key in keys {
            state.press(*key);
        }
        state
    }

    fn subsets() -> impl Iterator<Item = Vec<DriveKey>> {
        (0u8..64).map(|mask| {
            DriveKey::ALL
                .into_iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, key)| key)
                .collect()
        })
    }

    #[test]
    fn translation_never_exceeds_unit_l1_norm() {
        for keys in subsets() {
            let command = compute_keyboard_command(&held(&keys));
            assert!(
                command.ax.abs() + command.ay.abs() <= 1.0,
                "keys {keys:?} gave {command:?}"
            );
            assert!([-1.0, 0.0, 1.0].contains(&command.rotation));
        }
    }

    #[test]
    fn forward_alone_is_full_negative_y() {
        let mut state = InputState::default();
        state.press(DriveKey::Forward);
        let command = compute_keyboard_command(&state);
        assert_eq!((command.ax, command.ay), (0.0, -1.0));

        state.release(DriveKey::Forward);
        let command = compute_keyboard_command(&state);
        assert_eq!((command.ax, command.ay), (0.0, 0.0));
    }

    #[test]
    fn diagonal_is_halved_but_rotation_is_not() {
        let command = compute_keyboard_command(&held(&[
            DriveKey::Forward,
            DriveKey::Right,
            DriveKey::RotateLeft,
        ]));
        assert_eq!(command.ax, 0.5);
        assert_eq!(command.ay, -0.5);
        assert_eq!(command.rotation, -1.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let command = compute_keyboard_command(&held(&[
            DriveKey::Left,
            DriveKey::Right,
            DriveKey::RotateLeft,
            DriveKey::RotateRight,
        ]));
        assert_eq!((command.ax, command.ay, command.rotation), (0.0, 0.0, 0.0));
    }

    #[test]
    fn keyboard_command_carries_turbo_and_speed() {
        let mut state = InputState::new(0.4);
        state.set_turbo(true);
        let command = compute_keyboard_command(&state);
        assert!(command.turbo);
        assert_eq!(command.speed, 0.4);
    }

    #[test]
    fn key_binding_is_case_insensitive() {
        assert_eq!(DriveKey::from_char('W'), Some(DriveKey::Forward));
        assert_eq!(DriveKey::from_char('e'), Some(DriveKey::RotateRight));
        assert_eq!(DriveKey::from_char('x'), None);
    }

    #[test]
    fn gamepad_above_deadzone_passes_raw_values_with_slider_speed() {
        let snapshot = GamepadSnapshot {
            axes: vec![0.2, 0.0, 0.0, 0.0],
            buttons: vec![true],
        };
        let command = compute_gamepad_command(&snapshot, 0.6);
        assert_eq!(
            command,
            MotionCommand {
                ax: 0.2,
                ay: 0.0,
                rotation: 0.0,
                turbo: true,
                speed: 0.6,
            }
        );
    }

    #[test]
    fn gamepad_inside_deadzone_sends_neutral_at_full_speed() {
        let snapshot = GamepadSnapshot {
            axes: vec![0.05, 0.02, 0.0],
            buttons: vec![true],
        };
        assert_eq!(compute_gamepad_command(&snapshot, 0.3), MotionCommand::NEUTRAL);
    }

    #[test]
    fn gamepad_rotation_counts_toward_deadzone() {
        let snapshot = GamepadSnapshot {
            axes: vec![0.0, 0.0, -0.5],
            buttons: Vec::new(),
        };
        let command = compute_gamepad_command(&snapshot, 1.0);
        assert_eq!(command.rotation, -0.5);
        assert!(!command.turbo);
    }

    #[test]
    fn missing_axes_read_as_centered() {
        let snapshot = GamepadSnapshot {
            axes: vec![0.9],
            buttons: Vec::new(),
        };
        let command = compute_gamepad_command(&snapshot, 1.0);
        assert_eq!((command.ax, command.ay, command.rotation), (0.9, 0.0, 0.0));
    }
}
