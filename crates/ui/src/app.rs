use std::sync::Arc;

use eframe::egui;
use flamechart_core::parsers;
use flamechart_core::render::SoftwareRasterizer;
use flamechart_core::view::Surface;
use flamechart_core::{ChartConfig, Flamechart, FlamechartView};
use flamechart_protocol::{ThemeToken, Vec2};

use crate::gl::GlowBackend;
use crate::input;
use crate::renderer::{self, EguiMeasurer};
use crate::theme::{self, ThemeMode};

/// Format a sample weight with a metric suffix.
fn format_weight(weight: f64) -> String {
    if weight.abs() < 1000.0 {
        format!("{weight:.1}")
    } else if weight.abs() < 1_000_000.0 {
        format!("{:.2}k", weight / 1000.0)
    } else {
        format!("{:.2}M", weight / 1_000_000.0)
    }
}

/// Where the rectangle pass is drawn.
enum Backend {
    Glow(GlowBackend),
    /// No GL context (e.g. a wgpu host): rectangles are rasterized into
    /// commands and painted as egui shapes.
    Software(SoftwareRasterizer),
}

/// Main application state.
pub struct FlameApp {
    config: ChartConfig,
    view: Option<FlamechartView>,
    backend: Backend,
    profile_name: Option<String>,
    theme_mode: ThemeMode,
    error: Option<String>,
}

impl FlameApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ChartConfig) -> Self {
        let theme_mode = ThemeMode::Dark;
        cc.egui_ctx.set_visuals(theme_mode.visuals());
        theme::apply_typography(&cc.egui_ctx);

        let mut error = None;
        let backend = match cc.gl.as_ref().map(|gl| GlowBackend::new(Arc::clone(gl))) {
            Some(Ok(backend)) => Backend::Glow(backend),
            Some(Err(e)) => {
                tracing::error!(error = %e, "GL pipeline unavailable, drawing in software");
                error = Some(format!("GL pipeline unavailable: {e}"));
                Backend::Software(SoftwareRasterizer::new(Surface::new(1.0, 1.0, 1.0)))
            }
            None => {
                tracing::info!("no GL context, drawing in software");
                Backend::Software(SoftwareRasterizer::new(Surface::new(1.0, 1.0, 1.0)))
            }
        };

        Self {
            config,
            view: None,
            backend,
            profile_name: None,
            theme_mode,
            error,
        }
    }

    /// Open a profile before the first frame.
    pub fn with_profile(mut self, data: &[u8], source_name: Option<String>) -> Self {
        self.load_profile(data, source_name);
        self
    }

    fn load_profile(&mut self, data: &[u8], source_name: Option<String>) {
        match parsers::parse_auto(data) {
            Ok(profile) => {
                let chart = Flamechart::from_profile(&profile, self.config.color_seed);
                tracing::info!(
                    samples = profile.samples().len(),
                    layers = chart.layer_count(),
                    intervals = chart.interval_count(),
                    "loaded profile"
                );
                self.profile_name = profile.name.clone().or(source_name);
                // Attached on the next frame, once the canvas size is known.
                self.view = Some(FlamechartView::new(chart, self.config.clone()));
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse profile");
                self.error = Some(format!("Failed to parse profile: {e}"));
            }
        }
    }

    fn open_path(&mut self, path: &std::path::Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        match std::fs::read(path) {
            Ok(data) => self.load_profile(&data, name),
            Err(e) => self.error = Some(format!("Failed to read {}: {e}", path.display())),
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("flamechart");
                ui.separator();

                #[cfg(not(target_arch = "wasm32"))]
                {
                    if ui.button("Open").clicked()
                        && let Some(path) = rfd::FileDialog::new()
                            .add_filter("Profile", &["json", "speedscope", "folded", "collapsed", "txt"])
                            .pick_file()
                    {
                        self.open_path(&path);
                    }
                }

                let theme_label = match self.theme_mode {
                    ThemeMode::Dark => "Dark",
                    ThemeMode::Light => "Light",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = self.theme_mode.toggled();
                    ctx.set_visuals(self.theme_mode.visuals());
                }

                let can_reset = self.view.as_ref().is_some_and(FlamechartView::is_attached);
                if ui.add_enabled(can_reset, egui::Button::new("Reset zoom")).clicked()
                    && let Some(view) = self.view.as_mut()
                {
                    view.reset_zoom();
                }

                if let Some(name) = &self.profile_name {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(name);
                    });
                }
            });
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                } else if let Some(view) = &self.view {
                    let chart = view.chart();
                    let mut text = format!(
                        "Total: {} | Layers: {} | Frames: {}",
                        format_weight(chart.duration()),
                        chart.layer_count(),
                        chart.interval_count(),
                    );
                    if let (Some(viewport), Some(surface)) = (view.viewport(), view.surface()) {
                        let fraction = viewport.width() / surface.width;
                        text.push_str(&format!(
                            " | Viewing: {} | Zoom: {:.0}%",
                            format_weight(fraction * chart.duration()),
                            100.0 / fraction,
                        ));
                    }
                    ui.label(text);
                } else {
                    ui.label("No profile loaded. Click Open or drop a file");
                }
            });
        });
    }

    fn chart_panel(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.view.as_mut() else {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(ui.available_height() / 3.0);
                    ui.heading("Drop a profile here or click Open");
                    ui.label("Supports collapsed stacks (.folded) and speedscope JSON");
                });
            });
            return;
        };

        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let ppp = ui.ctx().pixels_per_point();
        let surface = Surface::new(
            f64::from(rect.width()),
            f64::from(rect.height()),
            f64::from(ppp),
        );

        if view.is_attached() {
            view.resize(surface);
        } else {
            let attached = match &mut self.backend {
                Backend::Glow(backend) => view.attach(surface, backend).map_err(|e| e.to_string()),
                Backend::Software(raster) => {
                    view.attach(surface, raster).map_err(|e| e.to_string())
                }
            };
            if let Err(e) = attached {
                tracing::error!(error = %e, "rectangle upload failed");
                self.error = Some(format!("Rectangle upload failed: {e}"));
            }
        }
        if let Backend::Software(raster) = &mut self.backend {
            raster.set_surface(surface);
        }

        handle_input(ui, view, &response, rect, &surface);

        let painter = ui.painter_at(rect);
        painter.rect_filled(
            rect,
            egui::CornerRadius::ZERO,
            theme::resolve(ThemeToken::Background, self.theme_mode),
        );

        let mut measurer = EguiMeasurer::new(&painter, ppp);
        let overlay = match &mut self.backend {
            Backend::Glow(backend) => {
                let overlay = view.render(backend, &mut measurer);
                if let Some(callback) = backend.paint_callback(rect) {
                    painter.add(callback);
                }
                overlay
            }
            Backend::Software(raster) => {
                let overlay = view.render(raster, &mut measurer);
                // View-space commands: one unit per point.
                renderer::paint_overlay(
                    &painter,
                    &raster.take_commands(),
                    rect.min,
                    1.0,
                    self.theme_mode,
                );
                overlay
            }
        };
        renderer::paint_overlay(&painter, &overlay, rect.min, ppp, self.theme_mode);

        if let Some(pos) = response.hover_pos() {
            let offset = pos - rect.min;
            let total = view.chart().duration();
            if let Some(frame) = view.frame_at(Vec2::new(f64::from(offset.x), f64::from(offset.y))) {
                let name = frame.frame.name.to_string();
                let file = frame.frame.file.as_ref().map(ToString::to_string);
                let duration = frame.duration();
                let _ = response.on_hover_ui_at_pointer(|ui| {
                    ui.strong(name);
                    if let Some(file) = file {
                        ui.label(file);
                    }
                    ui.label(format!(
                        "{} ({:.1}%)",
                        format_weight(duration),
                        100.0 * duration / total.max(f64::MIN_POSITIVE),
                    ));
                });
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        let Some(file) = dropped else {
            return;
        };
        if let Some(bytes) = &file.bytes {
            let name = (!file.name.is_empty()).then(|| file.name.clone());
            self.load_profile(bytes, name);
        } else if let Some(path) = &file.path {
            self.open_path(path);
        }
    }
}

fn handle_input(
    ui: &egui::Ui,
    view: &mut FlamechartView,
    response: &egui::Response,
    rect: egui::Rect,
    surface: &Surface,
) {
    if response.dragged() {
        view.pan(input::drag_pan(response.drag_delta()));
    }

    let (events, pointer) = ui.input(|i| (i.events.clone(), i.pointer.hover_pos()));
    for event in &events {
        match event {
            egui::Event::MouseWheel {
                unit,
                delta,
                modifiers,
                ..
            } => {
                if let Some(interaction) =
                    input::wheel_interaction(*unit, *delta, *modifiers, pointer, rect)
                {
                    view.handle_interaction(&interaction);
                }
            }
            egui::Event::Zoom(factor) => {
                if let Some(multiplier) = input::pinch_multiplier(*factor)
                    && let Some(pos) = pointer.filter(|p| rect.contains(*p))
                {
                    let offset = pos - rect.min;
                    view.zoom(
                        Vec2::new(f64::from(offset.x), f64::from(offset.y)),
                        multiplier,
                    );
                }
            }
            _ => {}
        }
    }

    if ui.ctx().wants_keyboard_input() {
        return;
    }
    let center = Vec2::new(surface.width / 2.0, surface.height / 2.0);
    let pan_step = surface.width * 0.1;
    let layer_step = view.config().frame_height * 3.0;
    ui.input(|i| {
        if i.key_pressed(egui::Key::A) || i.key_pressed(egui::Key::ArrowLeft) {
            view.pan(Vec2::new(-pan_step, 0.0));
        }
        if i.key_pressed(egui::Key::D) || i.key_pressed(egui::Key::ArrowRight) {
            view.pan(Vec2::new(pan_step, 0.0));
        }
        if i.key_pressed(egui::Key::W) || i.key_pressed(egui::Key::ArrowUp) {
            view.pan(Vec2::new(0.0, -layer_step));
        }
        if i.key_pressed(egui::Key::S) || i.key_pressed(egui::Key::ArrowDown) {
            view.pan(Vec2::new(0.0, layer_step));
        }
        if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
            view.zoom(center, 0.5);
        }
        if i.key_pressed(egui::Key::Minus) {
            view.zoom(center, 2.0);
        }
        if i.key_pressed(egui::Key::Num0) {
            view.reset_zoom();
        }
    });
}

impl eframe::App for FlameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.toolbar(ctx);
        self.status_bar(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.chart_panel(ui));
        self.handle_dropped_files(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Backend::Glow(backend) = &self.backend {
            backend.destroy();
        }
    }
}
