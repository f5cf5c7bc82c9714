//! Pixmap conversion

use image::{DynamicImage, RgbImage};

use crate::extract::PdfBackendError;

/// Convert a rendered pixmap to an RGB image
///
/// Handles gray, RGB and alpha-carrying pixmaps; alpha is dropped since the
/// page is rendered over an opaque background.
pub(crate) fn pixmap_to_image(pixmap: &mupdf::Pixmap, page: usize) -> Result<DynamicImage, PdfBackendError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    let samples = pixmap.samples();

    samples_to_image(samples, width, height, n)
        .ok_or_else(|| PdfBackendError::Render(page, "Failed to create image buffer".to_string()))
}

/// Pack interleaved samples with `n` components per pixel into RGB
fn samples_to_image(samples: &[u8], width: u32, height: u32, n: usize) -> Option<DynamicImage> {
    if n == 0 {
        return None;
    }

    let pixels = width as usize * height as usize;
    if samples.len() < pixels * n {
        return None;
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for pixel in samples.chunks_exact(n).take(pixels) {
        match n {
            // gray, gray + alpha
            1 | 2 => rgb.extend_from_slice(&[pixel[0], pixel[0], pixel[0]]),
            _ => rgb.extend_from_slice(&pixel[..3]),
        }
    }

    RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
}
