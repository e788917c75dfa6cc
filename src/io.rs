use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageError};
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::buffer::PixelBuffer;
use crate::compose::SourceImage;

/// File extensions the loader accepts (lowercase).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// JPEG encode quality for saved composites.
const JPEG_QUALITY: u8 = 90;

/// The `image` crate does not surface DPI metadata uniformly across formats,
/// and DPI is display-only here, so every source gets this default.
const DEFAULT_DPI: (f32, f32) = (96.0, 96.0);

pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Output format chosen by the destination file extension.
/// Anything that is not `.jpg` or `.bmp` is saved as PNG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" => SaveFormat::Jpeg,
            "bmp" => SaveFormat::Bmp,
            _ => SaveFormat::Png,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode one image file into a BGRA source.
///
/// The error string names the file and the underlying decoder cause so it can
/// be surfaced directly in the status line.
pub fn load_image(path: &Path) -> Result<SourceImage, String> {
    let name = display_name(path);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !is_supported_extension(&ext) {
        return Err(format!("{}: unsupported file type \".{}\"", name, ext));
    }

    let decoded = image::open(path).map_err(|e| format!("{}: {}", name, e))?;
    let rgba = decoded.to_rgba8();
    log_info!("Loaded {} ({}×{})", name, rgba.width(), rgba.height());

    Ok(SourceImage {
        name,
        pixels: PixelBuffer::from_rgba_image(&rgba),
        dpi: DEFAULT_DPI,
    })
}

/// Decode a batch of files. A failing file is reported and skipped; the rest
/// of the batch still loads.
pub fn load_many(paths: &[PathBuf]) -> (Vec<SourceImage>, Vec<String>) {
    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match load_image(path) {
            Ok(source) => loaded.push(source),
            Err(message) => {
                log_err!("Load failed: {}", message);
                failures.push(message);
            }
        }
    }
    (loaded, failures)
}

/// Encode the composited canvas to `path`, choosing the format from the
/// destination extension. A failed save leaves the in-memory composite
/// untouched; the caller just reports the error.
pub fn save_composite(buffer: &PixelBuffer, path: &Path) -> Result<(), ImageError> {
    let rgba = buffer.to_rgba_image();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match SaveFormat::from_path(path) {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel, flatten to RGB
            let rgb = DynamicImage::ImageRgba8(rgba.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ColorType::Rgba8,
            )?;
        }
    }

    log_info!("Saved composite to {}", path.display());
    Ok(())
}

// ---- native dialogs --------------------------------------------------------

/// Multi-select open dialog filtered to the supported extensions.
pub fn pick_images() -> Vec<PathBuf> {
    FileDialog::new()
        .add_filter("Image files", SUPPORTED_EXTENSIONS)
        .pick_files()
        .unwrap_or_default()
}

/// Save dialog offering the three writable formats.
pub fn pick_save_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PNG Image", &["png"])
        .add_filter("JPEG Image", &["jpg"])
        .add_filter("BMP Image", &["bmp"])
        .save_file()
}
