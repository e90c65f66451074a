use crate::graphics::LiveGalaxy;
use crate::prelude::*;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

pub struct ConfigEguiPlugin;

impl Plugin for ConfigEguiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, configure_visuals_system)
            .add_systems(Update, ui_system);
    }
}

fn configure_visuals_system(mut contexts: EguiContexts) {
    contexts.ctx_mut().set_visuals(egui::Visuals {
        window_corner_radius: 0.0.into(),
        ..Default::default()
    });
}

/// What the panel's controls did this frame.
#[derive(Default, Debug)]
struct PanelEdits {
    changed: bool,
    finished: bool,
    held: bool,
}

impl PanelEdits {
    fn track(&mut self, response: egui::Response) {
        self.changed |= response.changed();
        self.finished |= response.drag_stopped() || response.lost_focus();
        self.held |= response.dragged();
    }

    fn apply(self, debounce: &mut EditDebounce, now: f32) {
        if self.changed {
            debounce.note_change(now);
        }
        if self.finished {
            debounce.note_finished();
        }
        debounce.set_held(self.held);
    }

    fn commit_now(&mut self) {
        self.changed = true;
        self.finished = true;
    }
}

/// Color button plus a `#rrggbb` field; the field is applied when it loses focus.
fn color_row(
    ui: &mut egui::Ui,
    label: &str,
    color: &mut Rgb,
    hex: &mut String,
    edits: &mut PanelEdits,
) {
    ui.horizontal(|ui| {
        let mut rgb = color.to_rgb8();
        let button = ui.color_edit_button_srgb(&mut rgb);
        if button.changed() {
            *color = Rgb::from_rgb8(rgb[0], rgb[1], rgb[2]);
        }
        edits.track(button);

        let field = ui.add(egui::TextEdit::singleline(hex).desired_width(64.0));
        if field.lost_focus() {
            match Rgb::from_hex(hex.trim()) {
                Ok(parsed) if parsed != *color => {
                    *color = parsed;
                    edits.commit_now();
                }
                Ok(_) => {}
                Err(err) => warn!("Ignoring {label} color: {err}"),
            }
        }
        if !field.has_focus() {
            *hex = color.to_hex();
        }
        ui.label(label);
    });
}

fn ui_system(
    mut contexts: EguiContexts,
    time: Res<Time>,
    mut params: ResMut<GalaxyParameters>,
    mut debounce: ResMut<EditDebounce>,
    live: Res<LiveGalaxy>,
    mut hex_fields: Local<[String; 2]>,
) {
    let ctx = contexts.ctx_mut();
    let (min, max) = (GalaxyParameters::MIN, GalaxyParameters::MAX);
    let mut edits = PanelEdits::default();

    egui::SidePanel::left("side_panel")
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.heading("Galaxy");

            egui::CollapsingHeader::new("Shape")
                .default_open(true)
                .show(ui, |ui| {
                    edits.track(
                        ui.add(
                            egui::Slider::new(&mut params.count, min.count..=max.count)
                                .step_by(GalaxyParameters::COUNT_STEP)
                                .text("Count"),
                        ),
                    );
                    edits.track(
                        ui.add(
                            egui::Slider::new(&mut params.radius, min.radius..=max.radius)
                                .step_by(GalaxyParameters::RADIUS_STEP)
                                .text("Radius"),
                        ),
                    );
                    edits.track(
                        ui.add(
                            egui::Slider::new(&mut params.branches, min.branches..=max.branches)
                                .step_by(GalaxyParameters::BRANCHES_STEP)
                                .text("Branches"),
                        ),
                    );
                    edits.track(
                        ui.add(
                            egui::Slider::new(&mut params.spin, min.spin..=max.spin)
                                .step_by(GalaxyParameters::SPIN_STEP)
                                .text("Spin"),
                        ),
                    );
                });

            egui::CollapsingHeader::new("Randomness")
                .default_open(true)
                .show(ui, |ui| {
                    edits.track(
                        ui.add(
                            egui::Slider::new(
                                &mut params.randomness,
                                min.randomness..=max.randomness,
                            )
                            .step_by(GalaxyParameters::RANDOMNESS_STEP)
                            .text("Randomness"),
                        ),
                    );
                    edits.track(
                        ui.add(
                            egui::Slider::new(
                                &mut params.randomness_power,
                                min.randomness_power..=max.randomness_power,
                            )
                            .step_by(GalaxyParameters::RANDOMNESS_POWER_STEP)
                            .text("Randomness Power"),
                        ),
                    );
                });

            egui::CollapsingHeader::new("Appearance")
                .default_open(true)
                .show(ui, |ui| {
                    edits.track(
                        ui.add(
                            egui::Slider::new(&mut params.size, min.size..=max.size)
                                .step_by(GalaxyParameters::SIZE_STEP)
                                .text("Size"),
                        ),
                    );
                    let [inside_hex, outside_hex] = &mut *hex_fields;
                    color_row(ui, "Inside", &mut params.inside_color, inside_hex, &mut edits);
                    color_row(ui, "Outside", &mut params.outside_color, outside_hex, &mut edits);
                });

            ui.separator();
            match live.cloud() {
                Some(cloud) => ui.label(format!(
                    "Galaxy #{}: {} particles",
                    live.generation(),
                    cloud.len()
                )),
                None => ui.label("Generating..."),
            };
            if debounce.is_pending() {
                ui.label("Edit pending");
            }
        });

    edits.apply(&mut debounce, time.elapsed_secs());

    // typed-in slider values can land outside the ranges
    let clamped = params.clamped();
    if clamped != *params {
        *params = clamped;
    }
}
