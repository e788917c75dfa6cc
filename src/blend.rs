use rayon::prelude::*;

use crate::buffer::{CH_A, CH_B, CH_G, CH_R, PixelBuffer};

/// Per-pixel combining operator for one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Subtract,
    Multiply,
    Divide,
    Average,
    Min,
    Max,
}

impl BlendMode {
    /// All modes in UI display order.
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Add,
            BlendMode::Subtract,
            BlendMode::Multiply,
            BlendMode::Divide,
            BlendMode::Average,
            BlendMode::Min,
            BlendMode::Max,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Add => "Add",
            BlendMode::Subtract => "Subtract",
            BlendMode::Multiply => "Multiply",
            BlendMode::Divide => "Divide",
            BlendMode::Average => "Average",
            BlendMode::Min => "Min",
            BlendMode::Max => "Max",
        }
    }

    /// Resolve a mode by name.  Unrecognized names fall back to Normal.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Add" => BlendMode::Add,
            "Subtract" => BlendMode::Subtract,
            "Multiply" => BlendMode::Multiply,
            "Divide" => BlendMode::Divide,
            "Average" => BlendMode::Average,
            "Min" => BlendMode::Min,
            "Max" => BlendMode::Max,
            _ => BlendMode::Normal,
        }
    }
}

/// Which overlay color channels participate in the blend.
/// Alpha always participates and is never masked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self {
            red: true,
            green: true,
            blue: true,
        }
    }
}

/// Behavior of the Normal operator.
///
/// The reference pipeline scales the overlay by opacity *and* then lerps by
/// opacity again, so Normal effectively applies opacity twice. `Legacy`
/// reproduces that byte-for-byte and is the default; `Corrected` lerps with
/// the unscaled overlay so opacity is applied exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NormalBlend {
    #[default]
    Legacy,
    Corrected,
}

/// Combine `base` and `overlay` into a new buffer.
///
/// Both buffers must have identical dimensions; the compositor resamples an
/// overlay to the canvas size before calling this. Per pixel and channel:
/// the overlay alpha is scaled by `opacity`, masked-off color channels are
/// forced to zero (and enabled ones scaled by `opacity`), then the operator
/// combines base and effective overlay. All arithmetic is 8-bit with integer
/// truncation. Neither input is mutated.
pub fn blend(
    base: &PixelBuffer,
    overlay: &PixelBuffer,
    mode: BlendMode,
    opacity: f32,
    mask: ChannelMask,
    normal: NormalBlend,
) -> PixelBuffer {
    debug_assert_eq!(
        (base.width(), base.height()),
        (overlay.width(), overlay.height()),
        "blend inputs must match; resample the overlay first"
    );

    let opacity = opacity.clamp(0.0, 1.0);
    let mut out = PixelBuffer::new(base.width(), base.height());
    let stride = base.stride();
    if stride == 0 {
        return out;
    }

    let base_bytes = base.as_bytes();
    let overlay_bytes = overlay.as_bytes();

    out.as_bytes_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let base_row = &base_bytes[y * stride..(y + 1) * stride];
            let overlay_row = &overlay_bytes[y * stride..(y + 1) * stride];
            for ((out_px, base_px), overlay_px) in row
                .chunks_exact_mut(4)
                .zip(base_row.chunks_exact(4))
                .zip(overlay_row.chunks_exact(4))
            {
                let b = [base_px[0], base_px[1], base_px[2], base_px[3]];
                let o = [overlay_px[0], overlay_px[1], overlay_px[2], overlay_px[3]];
                out_px.copy_from_slice(&blend_pixel(b, o, mode, opacity, mask, normal));
            }
        });

    out
}

/// Blend a single BGRA pixel.  `opacity` must already be clamped to [0, 1].
pub fn blend_pixel(
    base: [u8; 4],
    overlay: [u8; 4],
    mode: BlendMode,
    opacity: f32,
    mask: ChannelMask,
    normal: NormalBlend,
) -> [u8; 4] {
    // Effective overlay: alpha scaled by opacity, color channels zeroed when
    // masked off, otherwise scaled by opacity. Truncating casts throughout.
    let scale = |v: u8| (v as f32 * opacity) as u8;
    let ov_a = scale(overlay[CH_A]);
    let ov_b = if mask.blue { scale(overlay[CH_B]) } else { 0 };
    let ov_g = if mask.green { scale(overlay[CH_G]) } else { 0 };
    let ov_r = if mask.red { scale(overlay[CH_R]) } else { 0 };

    let mut out = [0u8; 4];
    match mode {
        BlendMode::Add => {
            out[CH_B] = add(base[CH_B], ov_b);
            out[CH_G] = add(base[CH_G], ov_g);
            out[CH_R] = add(base[CH_R], ov_r);
            out[CH_A] = add(base[CH_A], ov_a);
        }
        BlendMode::Subtract => {
            out[CH_B] = sub_abs(base[CH_B], ov_b);
            out[CH_G] = sub_abs(base[CH_G], ov_g);
            out[CH_R] = sub_abs(base[CH_R], ov_r);
            out[CH_A] = sub_abs(base[CH_A], ov_a);
        }
        BlendMode::Multiply => {
            out[CH_B] = mul(base[CH_B], ov_b);
            out[CH_G] = mul(base[CH_G], ov_g);
            out[CH_R] = mul(base[CH_R], ov_r);
            out[CH_A] = mul(base[CH_A], ov_a);
        }
        BlendMode::Divide => {
            out[CH_B] = div(base[CH_B], ov_b);
            out[CH_G] = div(base[CH_G], ov_g);
            out[CH_R] = div(base[CH_R], ov_r);
            // Alpha is passed through unchanged, not divided.
            out[CH_A] = base[CH_A];
        }
        BlendMode::Average => {
            out[CH_B] = avg(base[CH_B], ov_b);
            out[CH_G] = avg(base[CH_G], ov_g);
            out[CH_R] = avg(base[CH_R], ov_r);
            out[CH_A] = avg(base[CH_A], ov_a);
        }
        BlendMode::Min => {
            out[CH_B] = base[CH_B].min(ov_b);
            out[CH_G] = base[CH_G].min(ov_g);
            out[CH_R] = base[CH_R].min(ov_r);
            out[CH_A] = base[CH_A].min(ov_a);
        }
        BlendMode::Max => {
            out[CH_B] = base[CH_B].max(ov_b);
            out[CH_G] = base[CH_G].max(ov_g);
            out[CH_R] = base[CH_R].max(ov_r);
            out[CH_A] = base[CH_A].max(ov_a);
        }
        BlendMode::Normal => {
            let lerp = |b: u8, o: u8| (b as f32 * (1.0 - opacity) + o as f32 * opacity) as u8;
            match normal {
                // Lerp over the already-opacity-scaled overlay: opacity is
                // applied twice, matching the reference pipeline.
                NormalBlend::Legacy => {
                    out[CH_B] = lerp(base[CH_B], ov_b);
                    out[CH_G] = lerp(base[CH_G], ov_g);
                    out[CH_R] = lerp(base[CH_R], ov_r);
                    out[CH_A] = lerp(base[CH_A], ov_a);
                }
                // Lerp over the masked but unscaled overlay: opacity applied
                // exactly once.
                NormalBlend::Corrected => {
                    let raw_b = if mask.blue { overlay[CH_B] } else { 0 };
                    let raw_g = if mask.green { overlay[CH_G] } else { 0 };
                    let raw_r = if mask.red { overlay[CH_R] } else { 0 };
                    out[CH_B] = lerp(base[CH_B], raw_b);
                    out[CH_G] = lerp(base[CH_G], raw_g);
                    out[CH_R] = lerp(base[CH_R], raw_r);
                    out[CH_A] = lerp(base[CH_A], overlay[CH_A]);
                }
            }
        }
    }
    out
}

fn add(base: u8, ov: u8) -> u8 {
    (base as u16 + ov as u16).min(255) as u8
}

fn sub_abs(base: u8, ov: u8) -> u8 {
    (base as i16 - ov as i16).unsigned_abs() as u8
}

fn mul(base: u8, ov: u8) -> u8 {
    (base as u16 * ov as u16 / 255) as u8
}

fn div(base: u8, ov: u8) -> u8 {
    if ov == 0 {
        255
    } else {
        (base / ov).min(255)
    }
}

fn avg(base: u8, ov: u8) -> u8 {
    ((base as u16 + ov as u16) / 2) as u8
}
