//! Interactive viewer
//!
//! Drives an [`Engine`] from the egui frame loop: a fixed number of ticks per
//! frame, an energy check after every tick, and a launch gesture on the right
//! mouse button for adding bodies.

use crate::settings::Settings;
use eframe::egui;
use glam::DVec2;
use orbit_core::launch::{launch, launch_mass, star_radius};
use orbit_core::{
    format_engine_error, Algorithm, EnergyMonitor, Engine, EngineState, IntegratorConfig, Scenario,
};
use std::time::{Duration, Instant};

/// How long a divergence notice stays on screen
const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Smallest drawn body radius in pixels
const MIN_BODY_PIXELS: f32 = 2.0;

/// Right button pressed but not yet released
struct PendingLaunch {
    /// World position under the cursor at press time
    press: DVec2,
    started: Instant,
}

pub struct OrbitApp {
    engine: Engine,
    monitor: EnergyMonitor,
    settings: Settings,
    /// Edit buffer for the integrator panel
    draft: IntegratorConfig,
    scenario: &'static str,
    /// World position at the centre of the screen
    camera: DVec2,
    paused: bool,
    hide_gui: bool,
    pending: Option<PendingLaunch>,
    last_error: Option<String>,
    notice: Option<(String, Instant)>,
    fps: f32,
}

impl OrbitApp {
    pub fn new(engine: Engine, scenario: &'static str, _cc: &eframe::CreationContext<'_>) -> Self {
        let draft = *engine.integrator_config();
        Self {
            engine,
            monitor: EnergyMonitor::new(),
            settings: Settings::default(),
            draft,
            scenario,
            camera: DVec2::ZERO,
            paused: false,
            hide_gui: false,
            pending: None,
            last_error: None,
            notice: None,
            fps: 0.0,
        }
    }

    fn load_scenario(&mut self, name: &'static str) {
        let Some(scenario) = Scenario::from_name(name) else {
            return;
        };
        match self.engine.load(&scenario) {
            Ok(_) => {
                self.scenario = name;
                self.camera = DVec2::ZERO;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(format_engine_error(&e)),
        }
    }

    fn simulate(&mut self) {
        if self.paused || self.engine.body_count() == 0 {
            return;
        }

        for _ in 0..self.settings.time_speed {
            if let Err(e) = self.engine.step(self.settings.dt) {
                log::warn!("tick failed: {e}");
                self.last_error = Some(format_engine_error(&e));
                self.paused = true;
                break;
            }
            if let Some(notice) = self.monitor.check(&mut self.engine) {
                self.notice = Some((format!("System message: {notice}"), Instant::now()));
                break;
            }
        }
    }

    /// Push the edited integrator parameters to the engine if they changed
    fn apply_draft(&mut self) {
        if self.draft == *self.engine.integrator_config() {
            return;
        }
        let draft = self.draft;
        if let Err(e) = self
            .engine
            .set_integrator_config(draft.algorithm, draft.step_size, Some(draft.tolerance))
        {
            self.last_error = Some(format_engine_error(&e));
            self.draft = *self.engine.integrator_config();
        }
    }

    fn reset_parameters(&mut self) {
        self.settings.reset();
        self.draft = IntegratorConfig::default();
        self.apply_draft();
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (pan, pause, hide, reset, frame_time) = ctx.input(|i| {
            let mut pan = egui::Vec2::ZERO;
            if i.key_down(egui::Key::W) || i.key_down(egui::Key::ArrowUp) {
                pan.y += 1.0;
            }
            if i.key_down(egui::Key::S) || i.key_down(egui::Key::ArrowDown) {
                pan.y -= 1.0;
            }
            if i.key_down(egui::Key::A) || i.key_down(egui::Key::ArrowLeft) {
                pan.x -= 1.0;
            }
            if i.key_down(egui::Key::D) || i.key_down(egui::Key::ArrowRight) {
                pan.x += 1.0;
            }
            (
                pan,
                i.key_pressed(egui::Key::P),
                i.key_pressed(egui::Key::H),
                i.key_pressed(egui::Key::R),
                i.stable_dt,
            )
        });

        let pixels = self.settings.camera_speed * frame_time;
        let scale = f64::from(self.settings.distance_scale);
        self.camera += DVec2::new(f64::from(pan.x), f64::from(pan.y)) * f64::from(pixels) / scale;

        if pause {
            self.paused = !self.paused;
        }
        if hide {
            self.hide_gui = !self.hide_gui;
        }
        if reset {
            self.reset_parameters();
        }
    }

    fn to_screen(&self, center: egui::Pos2, world: DVec2) -> egui::Pos2 {
        let offset = (world - self.camera) * f64::from(self.settings.distance_scale);
        center + egui::vec2(offset.x as f32, -offset.y as f32)
    }

    fn to_world(&self, center: egui::Pos2, screen: egui::Pos2) -> DVec2 {
        let offset = screen - center;
        let scale = f64::from(self.settings.distance_scale);
        self.camera + DVec2::new(f64::from(offset.x), -f64::from(offset.y)) / scale
    }

    fn body_pixels(&self, mass: f64) -> f32 {
        let radius = star_radius(mass) * f64::from(self.settings.distance_scale * self.settings.star_scale);
        (radius as f32).max(MIN_BODY_PIXELS)
    }

    fn handle_launch(&mut self, ctx: &egui::Context, canvas: &egui::Response, center: egui::Pos2) {
        let (pressed, released, pointer) = ctx.input(|i| {
            (
                i.pointer.button_pressed(egui::PointerButton::Secondary),
                i.pointer.button_released(egui::PointerButton::Secondary),
                i.pointer.interact_pos(),
            )
        });

        if pressed && canvas.hovered() {
            if let Some(pos) = pointer {
                self.pending = Some(PendingLaunch {
                    press: self.to_world(center, pos),
                    started: Instant::now(),
                });
            }
        }

        if released {
            let (Some(pending), Some(pos)) = (self.pending.take(), pointer) else {
                return;
            };
            let hold = pending.started.elapsed().as_secs_f64();
            let seed = launch(
                pending.press,
                self.to_world(center, pos),
                hold,
                self.settings.new_star_mass_scale,
            );
            match self.engine.insert_body(seed.position, seed.velocity, seed.mass) {
                Ok(id) => log::debug!("launched body {id} with mass {:.3}", seed.mass),
                Err(e) => self.last_error = Some(format_engine_error(&e)),
            }
        }
    }

    fn draw_bodies(&self, painter: &egui::Painter, center: egui::Pos2) {
        for body in self.engine.read_bodies() {
            let pos = self.to_screen(center, body.position);
            let radius = self.body_pixels(body.mass);
            painter.circle_filled(pos, radius, egui::Color32::from_rgb(255, 200, 90));
        }
    }

    fn draw_pending(&self, painter: &egui::Painter, center: egui::Pos2, cursor: Option<egui::Pos2>) {
        let Some(pending) = &self.pending else {
            return;
        };
        let origin = self.to_screen(center, pending.press);
        if let Some(cursor) = cursor {
            painter.line_segment([origin, cursor], egui::Stroke::new(1.0, egui::Color32::WHITE));
        }
        let mass = launch_mass(pending.started.elapsed().as_secs_f64(), self.settings.new_star_mass_scale);
        painter.circle_stroke(
            origin,
            self.body_pixels(mass),
            egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 165, 0)),
        );
    }

    fn settings_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("settings").show(ctx, |ui| {
            ui.heading("Integrator");
            egui::ComboBox::from_label("Algorithm")
                .selected_text(self.draft.algorithm.name())
                .show_ui(ui, |ui| {
                    for algorithm in Algorithm::ALL {
                        ui.selectable_value(&mut self.draft.algorithm, algorithm, algorithm.name());
                    }
                });
            ui.add(egui::Slider::new(&mut self.draft.step_size, 1e-4..=10.0).logarithmic(true).text("Step size (days)"));
            ui.add_enabled(
                self.draft.algorithm.is_adaptive(),
                egui::Slider::new(&mut self.draft.tolerance, 1e-14..=1e-2).logarithmic(true).text("Tolerance"),
            );

            ui.separator();
            ui.heading("Simulation");
            ui.add(egui::Slider::new(&mut self.settings.time_speed, 1..=200).text("Ticks per frame"));
            ui.add(egui::Slider::new(&mut self.settings.dt, 1e-3..=30.0).logarithmic(true).text("dt (days)"));
            ui.add(egui::Slider::new(&mut self.settings.distance_scale, 1.0..=5000.0).logarithmic(true).text("Pixels per AU"));
            ui.add(
                egui::Slider::new(&mut self.settings.new_star_mass_scale, 1e-3..=10.0)
                    .logarithmic(true)
                    .text("New star mass scale"),
            );

            ui.horizontal(|ui| {
                if ui.button(if self.paused { "▶ Play" } else { "⏸ Pause" }).clicked() {
                    self.paused = !self.paused;
                }
                if ui.button("⏮ Clear").clicked() {
                    self.engine.reset();
                    self.last_error = None;
                }
            });

            let mut selected = self.scenario;
            egui::ComboBox::from_label("Scenario")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for name in Scenario::NAMES {
                        ui.selectable_value(&mut selected, name, name);
                    }
                });
            if ui.button("Load scenario").clicked() || selected != self.scenario {
                self.load_scenario(selected);
            }

            ui.separator();
            ui.heading("Stats");
            ui.label(format!("FPS: {:.0}", self.fps));
            ui.label(format!("Bodies: {}", self.engine.body_count()));
            ui.label(format!("Energy: {:.6e}", self.engine.read_energy()));
            ui.label(format!("Time: {:.2} years", self.engine.elapsed_time() / 365.25));
            ui.label(format!("Kernel: {}", self.engine.backend()));
            let state = match self.engine.state() {
                EngineState::Uninitialized | EngineState::Ready => "ready",
                EngineState::SteppingFixed => "fixed step",
                EngineState::SteppingAdaptive => "adaptive",
                EngineState::Error => "diverged",
            };
            ui.label(format!("State: {state}"));
            if self.monitor.resets() > 0 {
                ui.label(format!("Resets: {}", self.monitor.resets()));
            }

            ui.separator();
            ui.small("P pause · H hide · R reset parameters · WASD pan · right-drag to launch");
        });

        self.apply_draft();
    }
}

impl eframe::App for OrbitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame_time = ctx.input(|i| i.unstable_dt);
        if frame_time > 0.0 {
            self.fps = 0.9 * self.fps + 0.1 / frame_time;
        }

        self.handle_keys(ctx);

        if !self.hide_gui {
            self.settings_panel(ctx);
        }

        if let Some((_, shown)) = &self.notice {
            if shown.elapsed() > NOTICE_DURATION {
                self.notice = None;
            }
        }
        if self.notice.is_some() || self.last_error.is_some() {
            egui::TopBottomPanel::bottom("messages").show(ctx, |ui| {
                if let Some((notice, _)) = &self.notice {
                    ui.label(egui::RichText::new(notice).color(egui::Color32::YELLOW));
                }
                if let Some(error) = self.last_error.clone() {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(error).color(egui::Color32::RED));
                        if ui.small_button("✖").clicked() {
                            self.last_error = None;
                        }
                    });
                }
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let center = rect.center();
                let canvas = ui.allocate_rect(rect, egui::Sense::drag());

                self.handle_launch(ctx, &canvas, center);
                self.simulate();

                let painter = ui.painter();
                self.draw_bodies(painter, center);
                self.draw_pending(painter, center, ctx.input(|i| i.pointer.hover_pos()));

                if self.paused {
                    painter.text(
                        rect.right_top() + egui::vec2(-10.0, 10.0),
                        egui::Align2::RIGHT_TOP,
                        "Paused",
                        egui::FontId::proportional(16.0),
                        egui::Color32::WHITE,
                    );
                }
            });

        ctx.request_repaint();
    }
}
