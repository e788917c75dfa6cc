use std::sync::Arc;

use eframe::egui;
use egui::{Color32, ImageData, Pos2, Rect, RichText, TextureFilter, TextureOptions};

use crate::components::curves::CurvePanel;
use crate::components::histogram::HistogramPanel;
use crate::components::layers::LayersPanel;
use crate::compose::LayerStack;
use crate::io;

pub struct BlendLabApp {
    stack: LayerStack,
    layers_panel: LayersPanel,
    curve_panel: CurvePanel,

    /// GPU copy of the current composite.
    composite_texture: Option<egui::TextureHandle>,
    /// Stack generation baked into `composite_texture`; re-uploaded when the
    /// stack moves past it.
    uploaded_generation: Option<u64>,

    /// Last load/save outcome shown in the status line.
    status: Option<String>,
}

impl BlendLabApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            stack: LayerStack::new(),
            layers_panel: LayersPanel,
            curve_panel: CurvePanel::default(),
            composite_texture: None,
            uploaded_generation: None,
            status: None,
        }
    }

    fn load_images(&mut self) {
        let paths = io::pick_images();
        if paths.is_empty() {
            return;
        }
        let (loaded, failures) = io::load_many(&paths);
        let count = loaded.len();
        for source in loaded {
            self.stack.add_image(source);
        }
        self.status = if failures.is_empty() {
            Some(format!("Loaded {} image(s)", count))
        } else {
            // Each failure names its file and cause; the rest of the batch
            // loaded anyway.
            Some(failures.join(" • "))
        };
    }

    fn save_composite(&mut self) {
        let Some(output) = self.stack.output() else {
            self.status = Some("Nothing to save".to_string());
            return;
        };
        let Some(path) = io::pick_save_path() else {
            return;
        };
        match io::save_composite(output, &path) {
            Ok(()) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log_err!("Save failed: {}", e);
                self.status = Some(format!("Save failed: {}", e));
            }
        }
    }

    /// Re-upload the composite texture when the stack has recomposited.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if self.uploaded_generation == Some(self.stack.generation()) {
            return;
        }
        self.uploaded_generation = Some(self.stack.generation());

        match self.stack.output() {
            Some(buffer) if !buffer.is_empty() => {
                let image_data = ImageData::Color(Arc::new(buffer.to_color_image()));
                let options = TextureOptions {
                    magnification: TextureFilter::Nearest,
                    minification: TextureFilter::Linear,
                    ..Default::default()
                };
                if let Some(tex) = &mut self.composite_texture {
                    tex.set(image_data, options);
                } else {
                    self.composite_texture =
                        Some(ctx.load_texture("composite", image_data, options));
                }
            }
            // Empty stack: clear the display
            _ => self.composite_texture = None,
        }
    }
}

impl eframe::App for BlendLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("controls")
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui.button("Load Images…").clicked() {
                        self.load_images();
                    }
                    if ui.button("Save Result…").clicked() {
                        self.save_composite();
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.label(RichText::new("LAYERS").small().strong());
                    self.layers_panel.show(ui, &mut self.stack);
                    ui.separator();

                    ui.label(RichText::new("TONE CURVE").small().strong());
                    self.curve_panel.show(ui, &mut self.stack);
                    ui.separator();

                    ui.label(RichText::new("HISTOGRAM").small().strong());
                    HistogramPanel::show(ui, self.stack.histogram());

                    if let Some(status) = &self.status {
                        ui.separator();
                        ui.label(RichText::new(status).small().weak());
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            // The side panel has already applied this frame's mutations, so
            // the texture refresh here always sees the final stack state.
            self.refresh_texture(ctx);
            match &self.composite_texture {
                Some(tex) => {
                    let avail = ui.available_rect_before_wrap();
                    let tex_size = tex.size_vec2();
                    let scale = (avail.width() / tex_size.x)
                        .min(avail.height() / tex_size.y)
                        .min(1.0);
                    let rect = Rect::from_center_size(avail.center(), tex_size * scale);
                    let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                    ui.painter().image(tex.id(), rect, uv, Color32::WHITE);
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label(RichText::new("Load images to begin compositing").weak());
                    });
                }
            }
        });
    }
}
