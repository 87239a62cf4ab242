//! Keyboard edge detection for drive keys and the shift (turbo) modifier.

use egui::{Event, Key};
use teleop_core::{DriveKey, OperatorEvent};

pub fn drive_key(key: Key) -> Option<DriveKey> {
    match key {
        Key::W => Some(DriveKey::Forward),
        Key::S => Some(DriveKey::Back),
        Key::A => Some(DriveKey::Left),
        Key::D => Some(DriveKey::Right),
        Key::Q => Some(DriveKey::RotateLeft),
        Key::E => Some(DriveKey::RotateRight),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct KeyboardTracker {
    shift_down: bool,
}

impl KeyboardTracker {
    /// Turns one frame of input into operator events.
    ///
    /// Auto-repeat presses are dropped. Presses are also dropped while a text field owns the
    /// keyboard, but releases always pass so a key can't stay held.
    pub fn translate(
        &mut self,
        events: &[Event],
        shift_down: bool,
        text_has_focus: bool,
    ) -> Vec<OperatorEvent> {
        let mut out = Vec::new();
        for event in events {
            let Event::Key {
                key,
                pressed,
                repeat,
                ..
            } = event
            else {
                continue;
            };
            let Some(drive) = drive_key(*key) else {
                continue;
            };
            if !*pressed {
                out.push(OperatorEvent::KeyUp(drive));
            } else if !*repeat && !text_has_focus {
                out.push(OperatorEvent::KeyDown(drive));
            }
        }

        if shift_down != self.shift_down {
            self.shift_down = shift_down;
            out.push(OperatorEvent::TurboChanged(shift_down));
        }
        out
    }
}
