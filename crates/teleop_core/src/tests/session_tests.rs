use super::*;
use shared::{
    domain::{GoalTarget, GridCell},
    protocol::MotionCommand,
};
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

#[derive(Clone, Default)]
struct RecordingSink {
    sent: Rc<RefCell<Vec<ClientCommand>>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<ClientCommand> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl CommandSink for RecordingSink {
    fn emit(&self, command: ClientCommand) {
        self.sent.borrow_mut().push(command);
    }
}

struct ScriptedGamepad {
    readings: VecDeque<Option<GamepadSnapshot>>,
    polls: usize,
}

impl ScriptedGamepad {
    fn new(readings: Vec<Option<GamepadSnapshot>>) -> Self {
        Self {
            readings: readings.into(),
            polls: 0,
        }
    }
}

impl GamepadSource for ScriptedGamepad {
    fn first_connected(&mut self) -> Option<GamepadSnapshot> {
        self.polls += 1;
        self.readings.pop_front().flatten()
    }
}

fn stick(ax: f64, ay: f64, rot: f64) -> Option<GamepadSnapshot> {
    Some(GamepadSnapshot {
        axes: vec![ax, ay, rot, 0.0],
        buttons: vec![false, false, false, false],
    })
}

fn new_session() -> (TeleopSession<RecordingSink>, RecordingSink, Instant) {
    let sink = RecordingSink::default();
    let start = Instant::now();
    let session = TeleopSession::new(&Settings::default(), sink.clone(), start);
    (session, sink, start)
}

fn axes(command: &ClientCommand) -> MotionCommand {
    match command {
        ClientCommand::Axes(motion) => *motion,
        other => panic!("expected axes, got {other:?}"),
    }
}

#[test]
fn each_key_transition_emits_one_axes_message() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::KeyDown(DriveKey::Forward));
    session.dispatch(OperatorEvent::KeyUp(DriveKey::Forward));

    let sent = sink.take();
    assert_eq!(sent.len(), 2);
    assert_eq!((axes(&sent[0]).ax, axes(&sent[0]).ay), (0.0, -1.0));
    assert_eq!((axes(&sent[1]).ax, axes(&sent[1]).ay), (0.0, 0.0));
}

#[test]
fn shift_transitions_toggle_turbo() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::KeyDown(DriveKey::Right));
    session.dispatch(OperatorEvent::TurboChanged(true));
    session.dispatch(OperatorEvent::TurboChanged(false));

    let turbo: Vec<bool> = sink.take().iter().map(|c| axes(c).turbo).collect();
    assert_eq!(turbo, vec![false, true, false]);
}

#[test]
fn slider_change_resends_keyboard_command_with_new_speed() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::KeyDown(DriveKey::Back));
    session.dispatch(OperatorEvent::SpeedChanged(0.4));

    let sent = sink.take();
    let last = axes(sent.last().expect("sent"));
    assert_eq!(last.ay, 1.0);
    assert_eq!(last.speed, 0.4);
}

#[test]
fn autonomy_suppresses_every_axes_source() {
    let (mut session, sink, start) = new_session();

    let toggled = session.dispatch(OperatorEvent::ToggleAutonomy);
    assert_eq!(toggled, Some(ClientCommand::Auton { enabled: true }));
    assert_eq!(session.state().autonomy_label(), "ON");

    session.dispatch(OperatorEvent::KeyDown(DriveKey::Left));
    session.dispatch(OperatorEvent::TurboChanged(true));
    session.dispatch(OperatorEvent::SpeedChanged(0.5));
    let mut pad = ScriptedGamepad::new(vec![stick(0.8, 0.0, 0.0)]);
    session.poll_gamepad(start + Duration::from_millis(50), &mut pad);

    session.dispatch(OperatorEvent::Stop);
    session.dispatch(OperatorEvent::SelectGoal(GridCell::new(1, 1)));

    let sent = sink.take();
    assert!(sent
        .iter()
        .all(|command| !matches!(command, ClientCommand::Axes(_))));
    assert_eq!(sent.len(), 3);

    // Held state kept updating while suppressed.
    assert!(session.state().input().is_held(DriveKey::Left));
    assert_eq!(session.state().input().speed(), 0.5);

    session.dispatch(OperatorEvent::ToggleAutonomy);
    assert_eq!(session.state().autonomy_label(), "OFF");
    session.dispatch(OperatorEvent::KeyUp(DriveKey::Left));
    let sent = sink.take();
    assert_eq!(sent[0], ClientCommand::Auton { enabled: false });
    assert!(matches!(sent[1], ClientCommand::Axes(_)));
}

#[test]
fn goal_selection_then_clear() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::SelectGoal(GridCell::new(3, 2)));
    assert_eq!(session.state().grid().selected(), Some(GridCell::new(3, 2)));
    session.dispatch(OperatorEvent::ClearGoal);
    assert_eq!(session.state().grid().selected(), None);

    assert_eq!(
        sink.take(),
        vec![
            ClientCommand::Goal(GoalTarget { x: 7, y: 6 }),
            ClientCommand::Goal(GoalTarget { x: -1, y: -1 }),
        ]
    );
}

#[test]
fn new_goal_replaces_previous_highlight() {
    let (mut session, _sink, _) = new_session();

    session.dispatch(OperatorEvent::SelectGoal(GridCell::new(0, 0)));
    session.dispatch(OperatorEvent::SelectGoal(GridCell::new(15, 9)));

    let grid = session.state().grid();
    assert_eq!(grid.cells().filter(|cell| grid.is_selected(*cell)).count(), 1);
    assert!(grid.is_selected(GridCell::new(15, 9)));
}

#[test]
fn out_of_grid_goal_emits_nothing() {
    let (mut session, sink, _) = new_session();
    assert_eq!(
        session.dispatch(OperatorEvent::SelectGoal(GridCell::new(16, 10))),
        None
    );
    assert!(sink.take().is_empty());
}

#[test]
fn discrete_actions_map_to_named_messages() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::Stop);
    session.dispatch(OperatorEvent::TriggerOta);
    session.dispatch(OperatorEvent::ApplyGains {
        kp: "0.5".into(),
        ki: "0.01".into(),
        kd: "0.2".into(),
    });

    let names: Vec<&str> = sink.take().iter().map(|c| c.event_name()).collect();
    assert_eq!(names, vec!["brake", "ota", "pid"]);
}

#[test]
fn unparseable_gain_is_sent_as_nan() {
    let (mut session, _sink, _) = new_session();

    let command = session.dispatch(OperatorEvent::ApplyGains {
        kp: "fast".into(),
        ki: "0".into(),
        kd: "1.5x".into(),
    });
    let Some(ClientCommand::Pid(gains)) = command.clone() else {
        panic!("expected pid, got {command:?}");
    };
    assert!(gains.kp.is_nan());
    assert_eq!(gains.ki, 0.0);
    assert_eq!(gains.kd, 1.5);
}

#[test]
fn reboot_only_sets_local_notice() {
    let (mut session, sink, _) = new_session();

    assert_eq!(session.dispatch(OperatorEvent::Reboot), None);
    assert_eq!(session.state().notice(), Some(dispatcher::REBOOT_NOTICE));
    assert!(sink.take().is_empty());

    session.dismiss_notice();
    assert_eq!(session.state().notice(), None);
}

#[test]
fn connection_indicator_is_idempotent() {
    let (mut session, sink, _) = new_session();

    session.dispatch(OperatorEvent::ChannelConnected);
    session.dispatch(OperatorEvent::ChannelConnected);
    assert!(session.state().connected());
    session.dispatch(OperatorEvent::ChannelDisconnected);
    session.dispatch(OperatorEvent::ChannelDisconnected);
    assert!(!session.state().connected());
    assert!(sink.take().is_empty());
}

#[test]
fn gamepad_is_sampled_once_per_period() {
    let (mut session, sink, start) = new_session();
    let mut pad = ScriptedGamepad::new(vec![stick(0.2, 0.0, 0.0), stick(0.05, 0.02, 0.0)]);

    assert_eq!(session.poll_gamepad(start + Duration::from_millis(10), &mut pad), None);
    assert_eq!(pad.polls, 0);

    session.dispatch(OperatorEvent::SpeedChanged(0.7));
    sink.take();

    let first = session
        .poll_gamepad(start + Duration::from_millis(50), &mut pad)
        .expect("tick");
    assert_eq!(
        axes(&first),
        MotionCommand {
            ax: 0.2,
            ay: 0.0,
            rotation: 0.0,
            turbo: false,
            speed: 0.7,
        }
    );

    let second = session
        .poll_gamepad(start + Duration::from_millis(100), &mut pad)
        .expect("tick");
    assert_eq!(axes(&second), MotionCommand::NEUTRAL);
    assert_eq!(pad.polls, 2);
    assert_eq!(sink.take().len(), 2);
}

#[test]
fn absent_gamepad_skips_the_cycle() {
    let (mut session, sink, start) = new_session();
    let mut pad = ScriptedGamepad::new(vec![None]);

    assert_eq!(session.poll_gamepad(start + Duration::from_millis(50), &mut pad), None);
    assert_eq!(pad.polls, 1);
    assert!(sink.take().is_empty());
}

#[test]
fn cancelled_gamepad_poll_stops_sampling() {
    let (mut session, _sink, start) = new_session();
    let mut pad = ScriptedGamepad::new(vec![stick(1.0, 0.0, 0.0)]);

    session.gamepad_cancel_handle().cancel();
    assert_eq!(session.poll_gamepad(start + Duration::from_secs(1), &mut pad), None);
    assert_eq!(pad.polls, 0);
    assert_eq!(session.next_gamepad_poll(start), None);
}
