use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Vec2};

use crate::compose::LayerStack;
use crate::curve::{CURVE_MAX, CurveEditor, DragState};

/// Side length of the curve canvas in points.
const CANVAS_SIZE: f32 = 256.0;

/// Grid spacing in curve units.
const GRID_STEP: usize = 32;

/// Interactive tone-curve canvas.
///
/// Screen y runs downward while curve y runs upward, so all drawing and
/// pointer positions convert through `CURVE_MAX - y`. Pointer events are fed
/// to the `CurveEditor` state machine, and any resulting curve mutation
/// recomposites through `LayerStack::edit_curve`.
#[derive(Default)]
pub struct CurvePanel {
    editor: CurveEditor,
}

impl CurvePanel {
    pub fn show(&mut self, ui: &mut egui::Ui, stack: &mut LayerStack) {
        ui.horizontal(|ui| {
            let mut enabled = stack.curve_enabled();
            if ui.checkbox(&mut enabled, "Apply tone curve").changed() {
                stack.set_curve_enabled(enabled);
            }
            if ui.button("Reset").clicked() {
                stack.reset_curve();
            }
        });

        let (response, painter) =
            ui.allocate_painter(Vec2::splat(CANVAS_SIZE + 2.0), Sense::click_and_drag());
        let rect = Rect::from_min_size(
            response.rect.min + Vec2::new(1.0, 1.0),
            Vec2::splat(CANVAS_SIZE),
        );

        let dark = ui.visuals().dark_mode;
        painter.rect_filled(
            rect,
            Rounding::same(2.0),
            if dark {
                Color32::from_gray(25)
            } else {
                Color32::from_gray(245)
            },
        );

        // Grid every 32 curve units
        let grid_color = if dark {
            Color32::from_gray(50)
        } else {
            Color32::from_gray(210)
        };
        for i in (0..=256).step_by(GRID_STEP) {
            let t = i as f32 / 256.0 * CANVAS_SIZE;
            painter.line_segment(
                [
                    Pos2::new(rect.min.x + t, rect.min.y),
                    Pos2::new(rect.min.x + t, rect.max.y),
                ],
                Stroke::new(0.5, grid_color),
            );
            painter.line_segment(
                [
                    Pos2::new(rect.min.x, rect.min.y + t),
                    Pos2::new(rect.max.x, rect.min.y + t),
                ],
                Stroke::new(0.5, grid_color),
            );
        }

        // The curve polyline through the control points (piecewise linear)
        let to_screen = |(px, py): (f32, f32)| {
            Pos2::new(
                rect.min.x + px / CURVE_MAX * CANVAS_SIZE,
                rect.min.y + (CURVE_MAX - py) / CURVE_MAX * CANVAS_SIZE,
            )
        };
        let curve_stroke = Stroke::new(2.0, Color32::from_rgb(70, 100, 220));
        for seg in stack.curve().points().windows(2) {
            painter.line_segment([to_screen(seg[0]), to_screen(seg[1])], curve_stroke);
        }

        // Control points, the dragged one slightly enlarged
        let outline = if dark { Color32::WHITE } else { Color32::BLACK };
        for (i, &p) in stack.curve().points().iter().enumerate() {
            let radius = if self.editor.drag_state() == DragState::Dragging(i) {
                6.0
            } else {
                5.0
            };
            painter.circle_filled(to_screen(p), radius, curve_stroke.color);
            painter.circle_stroke(to_screen(p), radius, Stroke::new(1.5, outline));
        }

        // Pointer events, in canvas units with y still pointing down: the
        // editor owns the inversion
        if let Some(pos) = response.interact_pointer_pos() {
            let x = ((pos.x - rect.min.x) / CANVAS_SIZE * CURVE_MAX).clamp(0.0, CURVE_MAX);
            let y = ((pos.y - rect.min.y) / CANVAS_SIZE * CURVE_MAX).clamp(0.0, CURVE_MAX);
            let editor = &mut self.editor;
            if response.drag_started() {
                stack.edit_curve(|curve| editor.pointer_down(curve, x, y));
            } else if response.dragged() {
                stack.edit_curve(|curve| editor.pointer_moved(curve, x, y));
            }
        }
        if response.drag_released() {
            self.editor.pointer_up();
        }

        painter.rect_stroke(
            rect,
            Rounding::same(2.0),
            Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
        );
    }
}
