use std::{ops::RangeInclusive, time::Instant};

use crossbeam_channel::Receiver;
use eframe::egui;
use egui::{Color32, RichText};
use shared::domain::GridCell;
use teleop_core::{
    ChannelEvent, CommandSender, GamepadSource, OperatorEvent, Settings, TeleopSession,
};
use tracing::{info, warn};

use crate::{backend_bridge::BridgeEvent, controller::keyboard::KeyboardTracker};

const CELL_SIZE: f32 = 22.0;
const CELL_GAP: f32 = 2.0;
const CELL_FILL: Color32 = Color32::from_rgb(44, 48, 56);
const CELL_HOVER: Color32 = Color32::from_rgb(70, 76, 88);
const GOAL_FILL: Color32 = Color32::from_rgb(46, 160, 67);
const INDICATOR_ON: Color32 = Color32::from_rgb(46, 160, 67);
const INDICATOR_OFF: Color32 = Color32::from_rgb(110, 110, 110);
const STOP_FILL: Color32 = Color32::from_rgb(200, 40, 40);

struct GainFields {
    kp: String,
    ki: String,
    kd: String,
}

pub struct TeleopApp {
    session: TeleopSession<CommandSender>,
    bridge_rx: Receiver<BridgeEvent>,
    gamepad: Box<dyn GamepadSource>,
    keyboard: KeyboardTracker,
    server_url: String,
    speed: f64,
    speed_range: RangeInclusive<f64>,
    gains: GainFields,
    bridge_status: Option<String>,
}

impl TeleopApp {
    pub fn new(
        settings: &Settings,
        commands: CommandSender,
        bridge_rx: Receiver<BridgeEvent>,
        gamepad: Box<dyn GamepadSource>,
    ) -> Self {
        let gains = settings.default_gains();
        Self {
            session: TeleopSession::new(settings, commands, Instant::now()),
            bridge_rx,
            gamepad,
            keyboard: KeyboardTracker::default(),
            server_url: settings.server_url.clone(),
            speed: settings.default_speed,
            speed_range: settings.speed_min..=settings.speed_max,
            gains: GainFields {
                kp: gains.kp.to_string(),
                ki: gains.ki.to_string(),
                kd: gains.kd.to_string(),
            },
            bridge_status: None,
        }
    }

    fn dispatch(&mut self, event: OperatorEvent) {
        self.session.dispatch(event);
    }

    fn process_bridge_events(&mut self) {
        while let Ok(event) = self.bridge_rx.try_recv() {
            match event {
                BridgeEvent::Channel(ChannelEvent::Connected) => {
                    self.dispatch(OperatorEvent::ChannelConnected)
                }
                BridgeEvent::Channel(ChannelEvent::Disconnected) => {
                    self.dispatch(OperatorEvent::ChannelDisconnected)
                }
                BridgeEvent::Channel(ChannelEvent::Server(event)) => {
                    info!(?event, "vehicle reported");
                }
                BridgeEvent::Stopped(reason) => {
                    warn!(%reason, "backend bridge stopped");
                    self.dispatch(OperatorEvent::ChannelDisconnected);
                    self.bridge_status = Some(reason);
                }
            }
        }
    }

    fn process_keyboard(&mut self, ctx: &egui::Context) {
        let text_has_focus = ctx.wants_keyboard_input();
        let (events, shift_down) = ctx.input(|i| (i.events.clone(), i.modifiers.shift));
        for event in self.keyboard.translate(&events, shift_down, text_has_focus) {
            self.dispatch(event);
        }
    }

    fn show_connection(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
            let color = if self.session.state().connected() {
                INDICATOR_ON
            } else {
                INDICATOR_OFF
            };
            ui.painter().circle_filled(rect.center(), 6.0, color);
            ui.label(self.server_url.as_str());
            if let Some(status) = &self.bridge_status {
                ui.colored_label(Color32::LIGHT_RED, status.as_str());
            }
        });
    }

    fn show_drive_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Speed");
            let slider = egui::Slider::new(&mut self.speed, self.speed_range.clone()).step_by(0.05);
            if ui.add(slider).changed() {
                let speed = self.speed;
                self.dispatch(OperatorEvent::SpeedChanged(speed));
            }
        });

        ui.horizontal(|ui| {
            let stop = egui::Button::new(RichText::new("STOP").strong().color(Color32::WHITE))
                .fill(STOP_FILL)
                .min_size(egui::vec2(90.0, 32.0));
            if ui.add(stop).clicked() {
                self.dispatch(OperatorEvent::Stop);
            }
            if ui.button("Autonomy").clicked() {
                self.dispatch(OperatorEvent::ToggleAutonomy);
            }
            ui.label(RichText::new(self.session.state().autonomy_label()).monospace());
        });
        ui.label(RichText::new("W/A/S/D move, Q/E rotate, Shift turbo").weak());
    }

    fn show_tuning(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for (label, value) in [
                ("Kp", &mut self.gains.kp),
                ("Ki", &mut self.gains.ki),
                ("Kd", &mut self.gains.kd),
            ] {
                ui.label(label);
                ui.add(egui::TextEdit::singleline(value).desired_width(56.0));
            }
            if ui.button("Apply").clicked() {
                let event = OperatorEvent::ApplyGains {
                    kp: self.gains.kp.clone(),
                    ki: self.gains.ki.clone(),
                    kd: self.gains.kd.clone(),
                };
                self.dispatch(event);
            }
        });

        ui.horizontal(|ui| {
            if ui.button("OTA update").clicked() {
                self.dispatch(OperatorEvent::TriggerOta);
            }
            if ui.button("Reboot").clicked() {
                self.dispatch(OperatorEvent::Reboot);
            }
        });

        let notice = self.session.state().notice().map(str::to_owned);
        if let Some(notice) = notice {
            ui.horizontal(|ui| {
                ui.colored_label(Color32::YELLOW, notice);
                if ui.small_button("Dismiss").clicked() {
                    self.session.dismiss_notice();
                }
            });
        }
    }

    fn show_goal_grid(&mut self, ui: &mut egui::Ui) {
        let grid = self.session.state().grid().clone();
        let mut clicked = None;

        ui.scope(|ui| {
            ui.spacing_mut().item_spacing = egui::vec2(CELL_GAP, CELL_GAP);
            for row in 0..grid.height() {
                ui.horizontal(|ui| {
                    for col in 0..grid.width() {
                        let cell = GridCell::new(col, row);
                        let (rect, response) = ui.allocate_exact_size(
                            egui::vec2(CELL_SIZE, CELL_SIZE),
                            egui::Sense::click(),
                        );
                        let fill = if grid.is_selected(cell) {
                            GOAL_FILL
                        } else if response.hovered() {
                            CELL_HOVER
                        } else {
                            CELL_FILL
                        };
                        ui.painter().rect_filled(rect, 2.0, fill);
                        if response.clicked() {
                            clicked = Some(cell);
                        }
                    }
                });
            }
        });

        if let Some(cell) = clicked {
            self.dispatch(OperatorEvent::SelectGoal(cell));
        }
        if ui.button("Clear goal").clicked() {
            self.dispatch(OperatorEvent::ClearGoal);
        }
    }
}

impl eframe::App for TeleopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bridge_events();
        self.process_keyboard(ctx);
        self.session.poll_gamepad(Instant::now(), self.gamepad.as_mut());

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_connection(ui);
            ui.separator();
            self.show_drive_controls(ui);
            ui.separator();
            self.show_tuning(ui);
            ui.separator();
            ui.label("Goal");
            self.show_goal_grid(ui);
        });

        if let Some(wait) = self.session.next_gamepad_poll(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }
}
