use std::sync::Arc;

use crate::blend::{BlendMode, ChannelMask, NormalBlend, blend};
use crate::buffer::PixelBuffer;
use crate::curve::ToneCurve;
use crate::histogram::Histogram;
use crate::resample::{Filter, resize};

/// One decoded image plus its display-only metadata.
///
/// Sources are owned by the stack and shared into layers via `Arc`, so a
/// recomposite never copies source pixels.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pub name: String,
    pub pixels: PixelBuffer,
    /// Display-only; never participates in compositing math.
    pub dpi: (f32, f32),
}

impl SourceImage {
    /// Info line for the layer list: "W×H, DPI: X×Y".
    pub fn info_line(&self) -> String {
        format!(
            "{}×{}, DPI: {:.0}×{:.0}",
            self.pixels.width(),
            self.pixels.height(),
            self.dpi.0,
            self.dpi.1
        )
    }
}

/// One entry in the compositing stack: a shared source image plus its blend
/// settings. Created on image load, destroyed on removal.
#[derive(Clone, Debug)]
pub struct Layer {
    pub source: Arc<SourceImage>,
    pub blend_mode: BlendMode,
    pub opacity: f32,
    pub use_red: bool,
    pub use_green: bool,
    pub use_blue: bool,
}

impl Layer {
    pub fn new(source: Arc<SourceImage>) -> Self {
        Self {
            source,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            use_red: true,
            use_green: true,
            use_blue: true,
        }
    }

    pub fn mask(&self) -> ChannelMask {
        ChannelMask {
            red: self.use_red,
            green: self.use_green,
            blue: self.use_blue,
        }
    }
}

/// The ordered layer stack, the tone curve, and the cached composite.
///
/// This is the application core: every mutator recomposites synchronously and
/// refreshes the histogram before returning (the recompute-trigger contract),
/// so `output()` and `histogram()` are always consistent with the current
/// settings. `generation()` increments on each recompute; the UI re-uploads
/// its texture when the value moves.
pub struct LayerStack {
    layers: Vec<Layer>,
    curve: ToneCurve,
    curve_enabled: bool,
    normal_blend: NormalBlend,
    output: Option<PixelBuffer>,
    histogram: Histogram,
    generation: u64,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            curve: ToneCurve::default(),
            curve_enabled: false,
            normal_blend: NormalBlend::default(),
            output: None,
            histogram: Histogram::default(),
            generation: 0,
        }
    }
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- accessors ----------------------------------------------------------

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn curve(&self) -> &ToneCurve {
        &self.curve
    }

    pub fn curve_enabled(&self) -> bool {
        self.curve_enabled
    }

    /// The composited canvas, or `None` for an empty stack (degenerate but
    /// valid: the display and histogram are simply cleared).
    pub fn output(&self) -> Option<&PixelBuffer> {
        self.output.as_ref()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Bumped on every recomposite.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ---- mutators (each triggers a synchronous recomposite) -----------------

    /// Append a loaded image as the topmost layer.
    pub fn add_image(&mut self, source: SourceImage) {
        self.layers.push(Layer::new(Arc::new(source)));
        self.recomposite();
    }

    pub fn remove_layer(&mut self, index: usize) {
        if index < self.layers.len() {
            self.layers.remove(index);
            self.recomposite();
        }
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.opacity = opacity.clamp(0.0, 1.0);
            self.recomposite();
        }
    }

    pub fn set_blend_mode(&mut self, index: usize, mode: BlendMode) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.blend_mode = mode;
            self.recomposite();
        }
    }

    pub fn set_channels(&mut self, index: usize, red: bool, green: bool, blue: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.use_red = red;
            layer.use_green = green;
            layer.use_blue = blue;
            self.recomposite();
        }
    }

    /// Toggle tone-curve application without touching the control points.
    pub fn set_curve_enabled(&mut self, enabled: bool) {
        self.curve_enabled = enabled;
        self.recomposite();
    }

    /// Restore the default two-point curve.
    pub fn reset_curve(&mut self) {
        self.curve.reset();
        self.recomposite();
    }

    /// Mutate the curve through `f`; recomposites when `f` reports a change.
    ///
    /// This is the seam the curve editor drives: pointer handlers return
    /// whether they moved or inserted a point, and every change recomposites
    /// synchronously (no debouncing).
    pub fn edit_curve<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut ToneCurve) -> bool,
    {
        let changed = f(&mut self.curve);
        if changed {
            self.recomposite();
        }
        changed
    }

    /// Select legacy or corrected Normal-mode interpolation.
    pub fn set_normal_blend(&mut self, normal: NormalBlend) {
        self.normal_blend = normal;
        self.recomposite();
    }

    // ---- compositing --------------------------------------------------------

    fn recomposite(&mut self) {
        self.output = self.composite();
        self.histogram = match &self.output {
            Some(buffer) => Histogram::compute(buffer),
            None => Histogram::default(),
        };
        self.generation += 1;
    }

    /// Fold the stack into one canvas.
    ///
    /// The canvas spans (max width, max height) over all layer sources, not
    /// the first layer's size, and starts fully transparent. Layers are
    /// folded in list order, resampling any source whose size differs from
    /// the canvas, then the tone curve is applied as a final pass when
    /// enabled.
    fn composite(&self) -> Option<PixelBuffer> {
        if self.layers.is_empty() {
            return None;
        }
        let width = self.layers.iter().map(|l| l.source.pixels.width()).max()?;
        let height = self.layers.iter().map(|l| l.source.pixels.height()).max()?;
        if width == 0 || height == 0 {
            return None;
        }

        let mut acc = PixelBuffer::new(width, height);
        for layer in &self.layers {
            let source = &layer.source.pixels;
            let resized;
            let overlay = if source.width() == width && source.height() == height {
                source
            } else {
                resized = resize(source, width, height, Filter::Bilinear);
                &resized
            };
            acc = blend(
                &acc,
                overlay,
                layer.blend_mode,
                layer.opacity,
                layer.mask(),
                self.normal_blend,
            );
        }

        if self.curve_enabled {
            acc = self.curve.apply_to_image(&acc);
        }
        Some(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(name: &str, w: u32, h: u32, px: [u8; 4]) -> SourceImage {
        let mut pixels = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                pixels.put_pixel(x, y, px);
            }
        }
        SourceImage {
            name: name.to_string(),
            pixels,
            dpi: (96.0, 96.0),
        }
    }

    #[test]
    fn empty_stack_has_no_output_and_clear_histogram() {
        let stack = LayerStack::new();
        assert!(stack.output().is_none());
        assert!(stack.histogram().is_empty());
    }

    #[test]
    fn removing_last_layer_clears_output() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 2, 2, [0, 0, 255, 255]));
        assert!(stack.output().is_some());
        stack.remove_layer(0);
        assert!(stack.output().is_none());
        assert!(stack.histogram().is_empty());
    }

    #[test]
    fn canvas_spans_max_dimensions_across_layers() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("wide", 4, 1, [255, 255, 255, 255]));
        stack.add_image(solid("tall", 1, 6, [255, 255, 255, 255]));
        let out = stack.output().unwrap();
        assert_eq!((out.width(), out.height()), (4, 6));
    }

    #[test]
    fn single_opaque_layer_at_normal_full_opacity_passes_through() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 2, 2, [10, 20, 30, 255]));
        let out = stack.output().unwrap();
        assert_eq!(out.get_pixel(1, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn layers_fold_in_list_order() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("base", 2, 2, [0, 0, 200, 255]));
        stack.add_image(solid("top", 2, 2, [100, 0, 0, 255]));
        stack.set_blend_mode(1, BlendMode::Add);
        let out = stack.output().unwrap();
        assert_eq!(out.get_pixel(0, 0), [100, 0, 200, 255]);
    }

    #[test]
    fn curve_applies_only_when_enabled() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 2, 2, [0, 0, 0, 255]));
        assert_eq!(stack.output().unwrap().get_pixel(0, 0), [0, 0, 0, 255]);

        // Default curve inverts: 0 → 255 on B, G, R; alpha untouched
        stack.set_curve_enabled(true);
        assert_eq!(stack.output().unwrap().get_pixel(0, 0), [255, 255, 255, 255]);

        stack.set_curve_enabled(false);
        assert_eq!(stack.output().unwrap().get_pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn edit_curve_recomposites_only_on_change() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 2, 2, [50, 50, 50, 255]));
        let before = stack.generation();
        assert!(!stack.edit_curve(|_| false));
        assert_eq!(stack.generation(), before);
        assert!(stack.edit_curve(|c| c.insert(128.0, 40.0)));
        assert_eq!(stack.generation(), before + 1);
    }

    #[test]
    fn mutators_bump_generation() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 2, 2, [1, 2, 3, 255]));
        let g = stack.generation();
        stack.set_opacity(0, 0.5);
        stack.set_blend_mode(0, BlendMode::Average);
        stack.set_channels(0, true, false, true);
        assert_eq!(stack.generation(), g + 3);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("a", 1, 1, [0, 0, 0, 255]));
        stack.set_opacity(0, 7.5);
        assert_eq!(stack.layers()[0].opacity, 1.0);
        stack.set_opacity(0, -1.0);
        assert_eq!(stack.layers()[0].opacity, 0.0);
    }

    #[test]
    fn smaller_layer_is_resampled_to_canvas() {
        let mut stack = LayerStack::new();
        stack.add_image(solid("big", 4, 4, [0, 0, 0, 255]));
        stack.add_image(solid("small", 2, 2, [200, 200, 200, 255]));
        stack.set_blend_mode(1, BlendMode::Max);
        let out = stack.output().unwrap();
        // The uniform small layer upscales to a uniform 4×4 overlay
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.get_pixel(x, y), [200, 200, 200, 255]);
            }
        }
    }
}
