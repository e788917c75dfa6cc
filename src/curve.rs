use rayon::prelude::*;

use crate::buffer::{BYTES_PER_PIXEL, PixelBuffer};

/// Maximum coordinate value in curve space (both axes run 0..=255).
pub const CURVE_MAX: f32 = 255.0;

/// Pointer-down within this distance (per axis) of a control point grabs it.
pub const HIT_RADIUS: f32 = 10.0;

/// A new point may only be inserted at least this far (horizontally) from
/// every existing point.
pub const MIN_INSERT_SPACING: f32 = 20.0;

/// Piecewise-linear tone curve over control points in [0, 255]².
///
/// Invariants: at least two points, x strictly increasing, first x = 0,
/// last x = 255. All mutators clamp so the invariants cannot be violated.
///
/// The default curve is the *inverted* identity {(0,255), (255,0)}: value 0
/// maps to 255 and 255 to 0.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneCurve {
    points: Vec<(f32, f32)>,
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self {
            points: vec![(0.0, CURVE_MAX), (CURVE_MAX, 0.0)],
        }
    }
}

impl ToneCurve {
    /// Control points sorted by x ascending.
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Restore the two-point inverted-identity default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Insert a control point, keeping the list sorted by x.
    ///
    /// Returns false (and leaves the curve untouched) when another point sits
    /// within one unit of `x`, which would break strict ordering. Callers
    /// normally enforce the larger `MIN_INSERT_SPACING` before calling.
    pub fn insert(&mut self, x: f32, y: f32) -> bool {
        let x = x.clamp(0.0, CURVE_MAX);
        let y = y.clamp(0.0, CURVE_MAX);
        if self.points.iter().any(|p| (p.0 - x).abs() < 1.0) {
            return false;
        }
        self.points.push((x, y));
        self.points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        true
    }

    /// Move point `i` to the given curve-space position with per-role
    /// clamping: the first point's x is pinned to 0, the last point's x is
    /// pinned to 255, and interior points stay strictly between their
    /// neighbors (one unit of margin). y is free within [0, 255].
    pub fn move_point(&mut self, i: usize, x: f32, y: f32) {
        if i >= self.points.len() {
            return;
        }
        let y = y.clamp(0.0, CURVE_MAX);
        let last = self.points.len() - 1;
        if i == 0 {
            self.points[0] = (0.0, y);
        } else if i == last {
            self.points[last] = (CURVE_MAX, y);
        } else {
            let min_x = self.points[i - 1].0 + 1.0;
            let max_x = self.points[i + 1].0 - 1.0;
            self.points[i] = (x.clamp(min_x, max_x), y);
        }
    }

    /// Map one sample value through the curve.
    ///
    /// Finds the segment whose x-range contains `value`, interpolates
    /// linearly, clamps to [0, 255] and truncates. The invariants guarantee a
    /// containing segment; if none matches the input is returned unchanged.
    pub fn evaluate(&self, value: u8) -> u8 {
        let v = value as f32;
        for seg in self.points.windows(2) {
            let (x0, y0) = seg[0];
            let (x1, y1) = seg[1];
            if v >= x0 && v <= x1 {
                let t = (v - x0) / (x1 - x0);
                let y = y0 + t * (y1 - y0);
                return y.clamp(0.0, CURVE_MAX) as u8;
            }
        }
        value
    }

    /// Build a 256-entry lookup table from the curve.
    pub fn lut(&self) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = self.evaluate(i as u8);
        }
        lut
    }

    /// Apply the curve to every pixel's R, G and B channels; alpha is left
    /// untouched. Returns a new buffer, the input is unmodified.
    pub fn apply_to_image(&self, src: &PixelBuffer) -> PixelBuffer {
        let lut = self.lut();
        let mut out = src.clone();
        let stride = src.stride();
        if stride == 0 {
            return out;
        }
        out.as_bytes_mut().par_chunks_mut(stride).for_each(|row| {
            for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                px[0] = lut[px[0] as usize];
                px[1] = lut[px[1] as usize];
                px[2] = lut[px[2] as usize];
                // alpha (px[3]) untouched
            }
        });
        out
    }
}

// ============================================================================
// CURVE EDITOR: pointer interaction state machine
// ============================================================================

/// Interaction state: either idle or dragging one control point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(usize),
}

/// Translates pointer events on the curve canvas into `ToneCurve` mutations.
///
/// Positions are given in canvas units (0..=255 on both axes) with y pointing
/// *down*: screen y = 0 corresponds to curve value 255, so every hit test and
/// update converts via `255 - y`.
///
/// Methods return true when the curve was mutated, which is the caller's
/// signal to recomposite.
#[derive(Debug, Default)]
pub struct CurveEditor {
    state: DragState,
}

impl CurveEditor {
    pub fn drag_state(&self) -> DragState {
        self.state
    }

    /// Pointer pressed at `(x, y)`.
    ///
    /// Near an existing point (per-axis distance < `HIT_RADIUS`): start
    /// dragging it. Otherwise, if no existing point is horizontally within
    /// `MIN_INSERT_SPACING`, insert a new point there. Too close but not a
    /// hit: no-op.
    pub fn pointer_down(&mut self, curve: &mut ToneCurve, x: f32, y: f32) -> bool {
        let x = x.clamp(0.0, CURVE_MAX);
        let y = y.clamp(0.0, CURVE_MAX);

        for (i, &(px, py)) in curve.points().iter().enumerate() {
            if (px - x).abs() < HIT_RADIUS && ((CURVE_MAX - py) - y).abs() < HIT_RADIUS {
                self.state = DragState::Dragging(i);
                return false;
            }
        }

        if !curve
            .points()
            .iter()
            .any(|p| (p.0 - x).abs() < MIN_INSERT_SPACING)
        {
            return curve.insert(x, CURVE_MAX - y);
        }

        false
    }

    /// Pointer moved to `(x, y)`; only meaningful while dragging.
    pub fn pointer_moved(&mut self, curve: &mut ToneCurve, x: f32, y: f32) -> bool {
        let DragState::Dragging(i) = self.state else {
            return false;
        };
        let x = x.clamp(0.0, CURVE_MAX);
        let y = y.clamp(0.0, CURVE_MAX);
        curve.move_point(i, x, CURVE_MAX - y);
        true
    }

    /// Pointer released anywhere ends any drag.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strictly_increasing(curve: &ToneCurve) -> bool {
        curve.points().windows(2).all(|w| w[0].0 < w[1].0)
    }

    #[test]
    fn default_curve_is_inverted_identity() {
        let curve = ToneCurve::default();
        assert_eq!(curve.points(), &[(0.0, 255.0), (255.0, 0.0)]);
        assert_eq!(curve.evaluate(0), 255);
        assert_eq!(curve.evaluate(255), 0);
        assert_eq!(curve.evaluate(128), 127);
    }

    #[test]
    fn three_point_curve_interpolates_linearly() {
        let mut curve = ToneCurve::default();
        assert!(curve.insert(128.0, 128.0));
        // t = 64/128 = 0.5 between (0,255) and (128,128): 191.5 → 191
        assert_eq!(curve.evaluate(64), 191);
        assert_eq!(curve.evaluate(128), 128);
    }

    #[test]
    fn insert_keeps_strict_ordering() {
        let mut curve = ToneCurve::default();
        for x in [200.0, 50.0, 120.0, 80.0] {
            assert!(curve.insert(x, 100.0));
            assert!(strictly_increasing(&curve));
        }
        assert_eq!(curve.points().len(), 6);
    }

    #[test]
    fn insert_rejects_duplicate_x() {
        let mut curve = ToneCurve::default();
        assert!(curve.insert(100.0, 10.0));
        assert!(!curve.insert(100.4, 20.0));
        assert_eq!(curve.points().len(), 3);
    }

    #[test]
    fn move_pins_endpoint_x() {
        let mut curve = ToneCurve::default();
        curve.move_point(0, 90.0, 40.0);
        assert_eq!(curve.points()[0], (0.0, 40.0));
        curve.move_point(1, 13.0, 200.0);
        assert_eq!(curve.points()[1], (255.0, 200.0));
    }

    #[test]
    fn move_clamps_interior_between_neighbors() {
        let mut curve = ToneCurve::default();
        curve.insert(100.0, 100.0);
        curve.insert(150.0, 150.0);
        // Drag the x=100 point past its right neighbor at 150
        curve.move_point(1, 240.0, 50.0);
        assert_eq!(curve.points()[1].0, 149.0);
        // And past its left neighbor at 0
        curve.move_point(1, -50.0, 50.0);
        assert_eq!(curve.points()[1].0, 1.0);
        assert!(strictly_increasing(&curve));
    }

    #[test]
    fn reset_restores_default() {
        let mut curve = ToneCurve::default();
        curve.insert(64.0, 10.0);
        curve.move_point(0, 0.0, 3.0);
        curve.reset();
        assert_eq!(curve, ToneCurve::default());
    }

    #[test]
    fn apply_to_image_maps_rgb_and_preserves_alpha() {
        let curve = ToneCurve::default(); // inverts
        let mut src = PixelBuffer::new(2, 1);
        src.put_pixel(0, 0, [0, 128, 255, 77]);
        let out = curve.apply_to_image(&src);
        assert_eq!(out.get_pixel(0, 0), [255, 127, 0, 77]);
        assert_eq!(src.get_pixel(0, 0), [0, 128, 255, 77], "input unmodified");
    }

    // ---- editor state machine ----------------------------------------------

    #[test]
    fn pointer_down_on_point_starts_drag() {
        let mut curve = ToneCurve::default();
        let mut editor = CurveEditor::default();
        // First point is at curve (0, 255) → screen (0, 0)
        let changed = editor.pointer_down(&mut curve, 4.0, 6.0);
        assert!(!changed);
        assert_eq!(editor.drag_state(), DragState::Dragging(0));
    }

    #[test]
    fn pointer_down_in_open_space_inserts_point() {
        let mut curve = ToneCurve::default();
        let mut editor = CurveEditor::default();
        // Screen y = 55 → curve y = 200
        let changed = editor.pointer_down(&mut curve, 128.0, 55.0);
        assert!(changed);
        assert_eq!(editor.drag_state(), DragState::Idle);
        assert_eq!(curve.points()[1], (128.0, 200.0));
    }

    #[test]
    fn pointer_down_too_close_to_existing_x_is_noop() {
        let mut curve = ToneCurve::default();
        let mut editor = CurveEditor::default();
        editor.pointer_down(&mut curve, 128.0, 55.0);
        // Within 20 units of x=128 but not a hit (screen y far from the point)
        let changed = editor.pointer_down(&mut curve, 140.0, 250.0);
        assert!(!changed);
        assert_eq!(curve.points().len(), 3);
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn drag_moves_point_and_release_returns_to_idle() {
        let mut curve = ToneCurve::default();
        let mut editor = CurveEditor::default();
        editor.pointer_down(&mut curve, 128.0, 55.0);
        editor.pointer_down(&mut curve, 128.0, 52.0); // grab it
        assert_eq!(editor.drag_state(), DragState::Dragging(1));

        let changed = editor.pointer_moved(&mut curve, 110.0, 100.0);
        assert!(changed);
        assert_eq!(curve.points()[1], (110.0, 155.0));

        editor.pointer_up();
        assert_eq!(editor.drag_state(), DragState::Idle);
        assert!(!editor.pointer_moved(&mut curve, 10.0, 10.0), "idle moves are no-ops");
    }
}
