use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use super::{HmiSession, HmiView};
use crate::config::HmiConfig;
use crate::device::{DeviceState, Indicators};
use crate::dispatch::CommandDispatcher;
use crate::link::ChannelWriter;

type Dispatcher = CommandDispatcher<ChannelWriter>;

const LAMP_OFF: egui::Color32 = egui::Color32::from_gray(64);
const SPEED_RANGE: std::ops::RangeInclusive<f64> = 1.0..=18.0;

/// Widget state that belongs to the panel, not to the device.
#[derive(Resource)]
pub struct PanelState {
    speed: f64,
    speed_active: bool,
    run_ms: String,
    stop_ms: String,
    jog_held: bool,
}

impl PanelState {
    pub fn new(config: &HmiConfig) -> Self {
        Self {
            speed: f64::from(config.default_speed),
            speed_active: false,
            run_ms: config.default_auto_run_ms.to_string(),
            stop_ms: config.default_auto_stop_ms.to_string(),
            jog_held: false,
        }
    }
}

/// Operator panel: lamps and readouts on top, controls below, log at the bottom.
pub fn hmi_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<HmiSession>,
    mut panel: ResMut<PanelState>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let session = &mut session.0;
    let panel = panel.as_mut();

    egui::TopBottomPanel::bottom("hmi_log")
        .resizable(true)
        .default_height(180.0)
        .min_height(80.0)
        .show(ctx, |ui| {
            draw_log_ui(ui, session.sink_mut());
        });

    egui::CentralPanel::default().show(ctx, |ui| {
        let state = session.sink().state().clone();
        let dispatcher = session.dispatcher();

        ui.horizontal(|ui| draw_lamps_ui(ui, &state.indicators()));
        ui.add_space(6.0);
        draw_readouts_ui(ui, &state, dispatcher.writer().is_connected());
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                draw_manual_controls_ui(ui, dispatcher, &mut panel.jog_held);
                draw_mode_controls_ui(ui, dispatcher);
                draw_auto_controls_ui(ui, dispatcher, panel);
                draw_speed_ui(ui, dispatcher, panel, state.speed);
            });
    });
}

fn draw_lamp(ui: &mut egui::Ui, label: &str, lit: bool, color: egui::Color32) {
    ui.vertical(|ui| {
        ui.label(egui::RichText::new(label).strong());
        let (rect, _) = ui.allocate_exact_size(egui::vec2(34.0, 34.0), egui::Sense::hover());
        let fill = if lit { color } else { LAMP_OFF };
        ui.painter()
            .circle(rect.center(), 11.0, fill, egui::Stroke::new(1.0, egui::Color32::BLACK));
    });
    ui.add_space(12.0);
}

/// draw run/stop/fault/relay lamps
fn draw_lamps_ui(ui: &mut egui::Ui, lamps: &Indicators) {
    draw_lamp(ui, "RUN", lamps.run, egui::Color32::GREEN);
    draw_lamp(ui, "STOP", lamps.stop, egui::Color32::RED);
    draw_lamp(ui, "FAULT", lamps.fault, egui::Color32::ORANGE);
    draw_lamp(ui, "RELAY", lamps.relay, egui::Color32::GREEN);
}

fn draw_readouts_ui(ui: &mut egui::Ui, state: &DeviceState, connected: bool) {
    egui::Grid::new("hmi_readouts")
        .num_columns(6)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Mode:");
            ui.label(egui::RichText::new(state.mode.as_str()).strong());
            ui.label("Steps:");
            ui.label(state.steps.to_string());
            ui.label("Auto:");
            ui.label(if state.auto_running { "ON" } else { "OFF" });
            ui.end_row();

            ui.label("Run ms:");
            ui.label(state.auto_run_ms.to_string());
            ui.label("Stop ms:");
            ui.label(state.auto_stop_ms.to_string());
            ui.label("Link:");
            if connected {
                ui.label(egui::RichText::new("OPEN").color(egui::Color32::GREEN));
            } else {
                ui.label(egui::RichText::new("CLOSED").color(egui::Color32::RED));
            }
            ui.end_row();
        });
}

fn draw_manual_controls_ui(ui: &mut egui::Ui, dispatcher: &mut Dispatcher, jog_held: &mut bool) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Manual Controls").strong());
        ui.horizontal(|ui| {
            if ui.button("START").clicked() {
                dispatcher.start();
            }
            if ui.button("STOP").clicked() {
                dispatcher.stop();
            }
            if ui.button("FAULT").clicked() {
                dispatcher.fault();
            }
            if ui.button("RESET").clicked() {
                dispatcher.reset();
            }
        });

        // jog is momentary: on while the pointer is held on the button
        let jog = ui.add_sized([240.0, 28.0], egui::Button::new("JOG (hold)"));
        let pressed = jog.is_pointer_button_down_on();
        if pressed && !*jog_held {
            dispatcher.jog_on();
            *jog_held = true;
        } else if !pressed && *jog_held {
            dispatcher.jog_off();
            *jog_held = false;
        }

        if ui.button("STEPS RESET").clicked() {
            dispatcher.reset_steps();
        }
    });
}

fn draw_mode_controls_ui(ui: &mut egui::Ui, dispatcher: &mut Dispatcher) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Mode").strong());
        ui.horizontal(|ui| {
            if ui.button("MANUAL").clicked() {
                dispatcher.set_mode_manual();
            }
            if ui.button("AUTO").clicked() {
                dispatcher.set_mode_auto();
            }
        });
    });
}

fn draw_auto_controls_ui(ui: &mut egui::Ui, dispatcher: &mut Dispatcher, panel: &mut PanelState) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Auto Controls").strong());
        ui.horizontal(|ui| {
            if ui.button("AUTO START").clicked() {
                dispatcher.auto_start();
            }
            if ui.button("AUTO STOP").clicked() {
                dispatcher.auto_stop();
            }
        });
        egui::Grid::new("hmi_auto_params").show(ui, |ui| {
            ui.label("Run ms:");
            ui.add(egui::TextEdit::singleline(&mut panel.run_ms).desired_width(80.0));
            ui.end_row();
            ui.label("Stop ms:");
            ui.add(egui::TextEdit::singleline(&mut panel.stop_ms).desired_width(80.0));
            ui.end_row();
        });
        if ui.button("SET AUTO PARAMS").clicked() {
            dispatcher.set_auto_params(&panel.run_ms, &panel.stop_ms);
        }
    });
}

/// Speed slider. Follows the device value until the operator grabs it.
fn draw_speed_ui(ui: &mut egui::Ui, dispatcher: &mut Dispatcher, panel: &mut PanelState, device_speed: i32) {
    ui.group(|ui| {
        ui.label(egui::RichText::new("Speed (RPM)").strong());
        if !panel.speed_active {
            panel.speed = f64::from(device_speed);
        }
        let response = ui.add(
            egui::Slider::new(&mut panel.speed, SPEED_RANGE)
                .step_by(1.0)
                .integer(),
        );
        if response.changed() {
            dispatcher.set_speed(panel.speed);
        }
        panel.speed_active = response.dragged() || response.has_focus();
    });
}

fn draw_log_ui(ui: &mut egui::Ui, view: &mut HmiView) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Log").strong());
        if ui.small_button("Clear").clicked() {
            view.clear_log();
        }
    });
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for entry in view.log() {
                ui.label(egui::RichText::new(entry.display()).monospace());
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_seeded_from_config() {
        let config = HmiConfig {
            default_speed: 7,
            default_auto_run_ms: 1200,
            default_auto_stop_ms: 300,
            ..HmiConfig::default()
        };
        let panel = PanelState::new(&config);
        assert_eq!(panel.speed, 7.0);
        assert_eq!(panel.run_ms, "1200");
        assert_eq!(panel.stop_ms, "300");
        assert!(!panel.jog_held);
    }
}
