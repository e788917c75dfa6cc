use rayon::prelude::*;

use crate::buffer::{BYTES_PER_PIXEL, PixelBuffer};

/// Resampling kernel used when a layer's source size differs from the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Filter {
    /// Sample the nearest source pixel.
    Nearest,
    /// Weighted average of the four surrounding source pixels.
    #[default]
    Bilinear,
}

/// Scale `src` to exactly `target_w × target_h`.
///
/// X and Y are scaled independently (no aspect-ratio preservation), and the
/// same kernel handles both upscaling and downscaling. Source coordinates are
/// mapped with the half-pixel-center convention and clamped at the edges, so
/// the result is deterministic for any scale factor. A same-size call returns
/// a copy of the input.
pub fn resize(src: &PixelBuffer, target_w: u32, target_h: u32, filter: Filter) -> PixelBuffer {
    if src.width() == target_w && src.height() == target_h {
        return src.clone();
    }
    if src.is_empty() || target_w == 0 || target_h == 0 {
        return PixelBuffer::new(target_w, target_h);
    }

    let mut out = PixelBuffer::new(target_w, target_h);
    let scale_x = src.width() as f32 / target_w as f32;
    let scale_y = src.height() as f32 / target_h as f32;
    let stride = target_w as usize * BYTES_PER_PIXEL;

    out.as_bytes_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| match filter {
            Filter::Nearest => {
                let sy = ((y as f32 + 0.5) * scale_y) as u32;
                let sy = sy.min(src.height() - 1);
                for x in 0..target_w {
                    let sx = (((x as f32 + 0.5) * scale_x) as u32).min(src.width() - 1);
                    let px = src.get_pixel(sx, sy);
                    row[x as usize * 4..x as usize * 4 + 4].copy_from_slice(&px);
                }
            }
            Filter::Bilinear => {
                let fy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
                let y0 = fy.floor() as u32;
                let y1 = (y0 + 1).min(src.height() - 1);
                let wy = fy - y0 as f32;
                for x in 0..target_w {
                    let fx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
                    let x0 = fx.floor() as u32;
                    let x1 = (x0 + 1).min(src.width() - 1);
                    let wx = fx - x0 as f32;

                    let p00 = src.get_pixel(x0, y0);
                    let p10 = src.get_pixel(x1, y0);
                    let p01 = src.get_pixel(x0, y1);
                    let p11 = src.get_pixel(x1, y1);

                    let base = x as usize * 4;
                    for c in 0..4 {
                        let top = p00[c] as f32 * (1.0 - wx) + p10[c] as f32 * wx;
                        let bottom = p01[c] as f32 * (1.0 - wx) + p11[c] as f32 * wx;
                        let v = top * (1.0 - wy) + bottom * wy;
                        row[base + c] = (v + 0.5) as u8;
                    }
                }
            }
        });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> PixelBuffer {
        let mut buf = PixelBuffer::new(2, 2);
        buf.put_pixel(0, 0, [255, 255, 255, 255]);
        buf.put_pixel(1, 1, [255, 255, 255, 255]);
        buf
    }

    #[test]
    fn same_size_is_identity() {
        let src = checker_2x2();
        for filter in [Filter::Nearest, Filter::Bilinear] {
            let out = resize(&src, 2, 2, filter);
            assert_eq!(out, src, "{filter:?} must copy unchanged at same size");
        }
    }

    #[test]
    fn zero_target_yields_empty_buffer() {
        let src = checker_2x2();
        let out = resize(&src, 0, 3, Filter::Bilinear);
        assert!(out.is_empty());
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn nearest_upscale_replicates_pixels() {
        let src = checker_2x2();
        let out = resize(&src, 4, 4, Filter::Nearest);
        // Each source pixel becomes a 2×2 block
        assert_eq!(out.get_pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(1, 1), [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(2, 0), [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn bilinear_downscale_of_uniform_image_stays_uniform() {
        let mut src = PixelBuffer::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                src.put_pixel(x, y, [40, 80, 120, 255]);
            }
        }
        let out = resize(&src, 2, 2, Filter::Bilinear);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(out.get_pixel(x, y), [40, 80, 120, 255]);
            }
        }
    }

    #[test]
    fn axes_scale_independently() {
        let src = checker_2x2();
        let out = resize(&src, 8, 2, Filter::Nearest);
        assert_eq!(out.width(), 8);
        assert_eq!(out.height(), 2);
    }
}
