use egui::{Color32, ColorImage};
use image::RgbaImage;

/// Bytes per pixel: one 8-bit sample per channel in (B, G, R, A) order.
pub const BYTES_PER_PIXEL: usize = 4;

/// Byte offsets of the channels within one pixel.
pub const CH_B: usize = 0;
pub const CH_G: usize = 1;
pub const CH_R: usize = 2;
pub const CH_A: usize = 3;

/// Flat 8-bit-per-channel pixel buffer in **BGRA** sample order.
///
/// Rows are stored top-to-bottom with stride `width * 4` bytes and no padding,
/// so `data.len() == height * width * 4` always holds. Alpha is straight
/// (non-premultiplied). Zero-dimension buffers are valid and hold no bytes.
///
/// Buffers are value types: pipeline stages that transform pixels return a new
/// `PixelBuffer` and never mutate their input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a fully transparent (all-zero) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Self {
            width,
            height,
            data: vec![0u8; len],
        }
    }

    /// Wrap an existing flat BGRA byte vector.
    /// Returns `None` if `data` is not exactly `width * height * 4` bytes.
    pub fn from_bgra(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read one pixel as a `[B, G, R, A]` array.  `x`/`y` must be in bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Write one pixel from a `[B, G, R, A]` array.  `x`/`y` must be in bounds.
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    // ---- codec / display seams ---------------------------------------------

    /// Import from the `image` crate's RGBA layout, swizzling to BGRA.
    pub fn from_rgba_image(src: &RgbaImage) -> Self {
        let (w, h) = src.dimensions();
        let raw = src.as_raw();
        let mut data = vec![0u8; raw.len()];
        for (dst, px) in data.chunks_exact_mut(4).zip(raw.chunks_exact(4)) {
            dst[CH_B] = px[2];
            dst[CH_G] = px[1];
            dst[CH_R] = px[0];
            dst[CH_A] = px[3];
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }

    /// Export to the `image` crate's RGBA layout for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut raw = vec![0u8; self.data.len()];
        for (dst, px) in raw.chunks_exact_mut(4).zip(self.data.chunks_exact(4)) {
            dst[0] = px[CH_R];
            dst[1] = px[CH_G];
            dst[2] = px[CH_B];
            dst[3] = px[CH_A];
        }
        RgbaImage::from_raw(self.width, self.height, raw)
            .expect("buffer length invariant guarantees a valid image")
    }

    /// Convert to an egui `ColorImage` for texture upload.
    pub fn to_color_image(&self) -> ColorImage {
        let pixels: Vec<Color32> = self
            .data
            .chunks_exact(4)
            .map(|px| Color32::from_rgba_unmultiplied(px[CH_R], px[CH_G], px[CH_B], px[CH_A]))
            .collect();
        ColorImage {
            size: [self.width as usize, self.height as usize],
            pixels,
        }
    }
}
