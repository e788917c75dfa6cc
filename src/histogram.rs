use crate::buffer::{BYTES_PER_PIXEL, CH_B, CH_G, CH_R, PixelBuffer};

/// Per-channel 256-bin sample counts, rebuilt from scratch on every
/// composite; there is no incremental update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    pub red: [u32; 256],
    pub green: [u32; 256],
    pub blue: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; 256],
            green: [0; 256],
            blue: [0; 256],
        }
    }
}

impl Histogram {
    /// Count every pixel's R, G and B sample values in a single pass.
    pub fn compute(buffer: &PixelBuffer) -> Self {
        let mut hist = Self::default();
        for px in buffer.as_bytes().chunks_exact(BYTES_PER_PIXEL) {
            hist.blue[px[CH_B] as usize] += 1;
            hist.green[px[CH_G] as usize] += 1;
            hist.red[px[CH_R] as usize] += 1;
        }
        hist
    }

    /// Largest bin count across all three channels.
    ///
    /// This is the shared bar scale for rendering. It is 0 for an empty
    /// histogram; the renderer must skip drawing rather than divide by it.
    pub fn max_count(&self) -> u32 {
        let max_of = |bins: &[u32; 256]| bins.iter().copied().max().unwrap_or(0);
        max_of(&self.red).max(max_of(&self.green)).max(max_of(&self.blue))
    }

    /// True when no samples have been counted.
    pub fn is_empty(&self) -> bool {
        self.max_count() == 0
    }
}
