//! Image encoding: `DynamicImage` → lossy JPEG bytes.
//!
//! Compression trades fidelity for size on purpose: a rasterised page at
//! quality 40 is usually a fraction of a scanned original and still legible
//! to a downstream reader. Pages are flattened to RGB first because the
//! assembler declares every image as `DeviceRGB`.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode a rasterised page as JPEG at `quality` (clamped to 1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;

    debug!(
        "Encoded {}x{} page → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}
