use eframe::egui;
use egui::{ComboBox, RichText, Slider};

use crate::blend::BlendMode;
use crate::compose::LayerStack;

/// Edits collected while the layer slice is borrowed for display, applied
/// through the stack's mutators afterwards.
enum LayerEdit {
    Opacity(usize, f32),
    Mode(usize, BlendMode),
    Channels(usize, bool, bool, bool),
    Remove(usize),
}

/// The layer list: one row per loaded image with its blend settings.
#[derive(Default)]
pub struct LayersPanel;

impl LayersPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, stack: &mut LayerStack) {
        if stack.layers().is_empty() {
            ui.label(RichText::new("No images loaded").weak());
            return;
        }

        let mut edits: Vec<LayerEdit> = Vec::new();

        for (i, layer) in stack.layers().iter().enumerate() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&layer.source.name).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🗑").on_hover_text("Remove layer").clicked() {
                            edits.push(LayerEdit::Remove(i));
                        }
                    });
                });
                ui.label(RichText::new(layer.source.info_line()).small().weak());

                let mut opacity = layer.opacity;
                if ui
                    .add(Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
                    .changed()
                {
                    edits.push(LayerEdit::Opacity(i, opacity));
                }

                let mut mode = layer.blend_mode;
                ComboBox::from_id_source(("layer_blend_mode", i))
                    .selected_text(mode.name())
                    .show_ui(ui, |ui| {
                        for &m in BlendMode::all() {
                            ui.selectable_value(&mut mode, m, m.name());
                        }
                    });
                if mode != layer.blend_mode {
                    edits.push(LayerEdit::Mode(i, mode));
                }

                ui.horizontal(|ui| {
                    let (mut r, mut g, mut b) = (layer.use_red, layer.use_green, layer.use_blue);
                    let changed = ui.checkbox(&mut r, "R").changed()
                        | ui.checkbox(&mut g, "G").changed()
                        | ui.checkbox(&mut b, "B").changed();
                    if changed {
                        edits.push(LayerEdit::Channels(i, r, g, b));
                    }
                });
            });
        }

        // A removal invalidates later indices, so apply at most one per frame
        // and apply the value edits first.
        let mut remove: Option<usize> = None;
        for edit in edits {
            match edit {
                LayerEdit::Opacity(i, v) => stack.set_opacity(i, v),
                LayerEdit::Mode(i, m) => stack.set_blend_mode(i, m),
                LayerEdit::Channels(i, r, g, b) => stack.set_channels(i, r, g, b),
                LayerEdit::Remove(i) => remove = Some(i),
            }
        }
        if let Some(i) = remove {
            stack.remove_layer(i);
        }
    }
}
