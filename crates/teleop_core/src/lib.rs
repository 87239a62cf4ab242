use std::time::{Duration, Instant};

use shared::protocol::ClientCommand;
use tracing::{debug, trace};

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod grid;
pub mod input;
pub mod schedule;
pub mod transport;

pub use config::{load_settings, Settings};
pub use dispatcher::{handle, OperatorEvent, TeleopState};
pub use error::TeleopError;
pub use input::{DriveKey, GamepadSnapshot, GamepadSource, InputState};
pub use schedule::{CancelHandle, RecurringTask};
pub use transport::{ChannelEvent, CommandSender, TeleopChannel};

/// Where outbound commands leave the session. Emission is fire-and-forget.
pub trait CommandSink {
    fn emit(&self, command: ClientCommand);
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn emit(&self, command: ClientCommand) {
        (**self).emit(command)
    }
}

/// Operator session: the panel state, the outbound sink and the gamepad poll schedule.
pub struct TeleopSession<S: CommandSink> {
    state: TeleopState,
    sink: S,
    gamepad_poll: RecurringTask,
}

impl<S: CommandSink> TeleopSession<S> {
    pub fn new(settings: &Settings, sink: S, now: Instant) -> Self {
        let state = TeleopState::new(
            InputState::new(settings.default_speed),
            settings.goal_grid(),
        );
        Self {
            state,
            sink,
            gamepad_poll: RecurringTask::new(settings.gamepad_poll_period(), now),
        }
    }

    pub fn state(&self) -> &TeleopState {
        &self.state
    }

    pub fn dismiss_notice(&mut self) {
        self.state.dismiss_notice();
    }

    /// Handles one event and emits at most one command.
    pub fn dispatch(&mut self, event: OperatorEvent) -> Option<ClientCommand> {
        let command = handle(&mut self.state, event)?;
        match &command {
            ClientCommand::Axes(motion) => trace!(?motion, "emit axes"),
            other => debug!(event = other.event_name(), "emit command"),
        }
        self.sink.emit(command.clone());
        Some(command)
    }

    /// Samples the gamepad when a poll is due and dispatches the reading.
    pub fn poll_gamepad(
        &mut self,
        now: Instant,
        source: &mut dyn GamepadSource,
    ) -> Option<ClientCommand> {
        if !self.gamepad_poll.poll(now) {
            return None;
        }
        let snapshot = source.first_connected();
        self.dispatch(OperatorEvent::GamepadTick(snapshot))
    }

    pub fn next_gamepad_poll(&self, now: Instant) -> Option<Duration> {
        self.gamepad_poll.time_until_due(now)
    }

    pub fn gamepad_cancel_handle(&self) -> CancelHandle {
        self.gamepad_poll.cancel_handle()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
