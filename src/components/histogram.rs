use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Stroke, Vec2};

use crate::histogram::Histogram;

/// Histogram strip height in points.
const STRIP_HEIGHT: f32 = 100.0;

/// Translucent per-channel bar colors, overdrawn in R, G, B order.
const RED: Color32 = Color32::from_rgba_premultiplied(128, 0, 0, 128);
const GREEN: Color32 = Color32::from_rgba_premultiplied(0, 128, 0, 128);
const BLUE: Color32 = Color32::from_rgba_premultiplied(0, 0, 128, 128);

/// Renders the three channel histograms as overlaid bars.
///
/// Bar heights share one scale: the maximum bin count across all three
/// channels. A zero maximum (no composite) draws no bars at all, it never
/// divides by the count.
pub struct HistogramPanel;

impl HistogramPanel {
    pub fn show(ui: &mut egui::Ui, histogram: &Histogram) {
        let width = ui.available_width();
        let (_, rect) = ui.allocate_space(Vec2::new(width, STRIP_HEIGHT));
        let painter = ui.painter();

        let dark = ui.visuals().dark_mode;
        painter.rect_filled(
            rect,
            Rounding::same(3.0),
            if dark {
                Color32::from_gray(30)
            } else {
                Color32::from_gray(240)
            },
        );

        let max = histogram.max_count();
        if max > 0 {
            let bar_w = rect.width() / 256.0;
            let channels = [
                (&histogram.red, RED),
                (&histogram.green, GREEN),
                (&histogram.blue, BLUE),
            ];
            for (bins, color) in channels {
                for (i, &count) in bins.iter().enumerate() {
                    if count == 0 {
                        continue;
                    }
                    let h = count as f32 / max as f32 * rect.height();
                    let x = rect.min.x + i as f32 * bar_w;
                    let bar = Rect::from_min_max(
                        Pos2::new(x, rect.max.y - h),
                        Pos2::new(x + bar_w.max(1.0), rect.max.y),
                    );
                    painter.rect_filled(bar, 0.0, color);
                }
            }
        }

        painter.rect_stroke(
            rect,
            Rounding::same(3.0),
            Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
        );
    }
}
