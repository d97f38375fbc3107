use crate::decoded::{CHANNELS, DecodedImage};

/// Opaque magenta written for every changed pixel.
pub const HIGHLIGHT: [u8; 4] = [255, 0, 255, 255];

/// Default color-distance threshold.
pub const DEFAULT_SENSITIVITY: u8 = 10;

/// Upper bound of the sensitivity slider.
pub const MAX_SENSITIVITY: u8 = 50;

/// Output of one diff computation. Never patched; recompute instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Sized to the overlap of both inputs.
    pub image: DecodedImage,
    /// Pixels whose mean channel distance exceeded the sensitivity.
    pub changed_pixels: u64,
    /// `width * height` of `image`.
    pub total_pixels: u64,
}

impl DiffResult {
    /// Fraction of changed pixels, 0.0 = identical, 1.0 = every pixel changed.
    pub fn change_ratio(&self) -> f64 {
        if self.total_pixels > 0 {
            self.changed_pixels as f64 / self.total_pixels as f64
        } else {
            0.0
        }
    }

    pub fn is_match(&self) -> bool {
        self.changed_pixels == 0
    }
}

/// Classify every pixel in the overlap of `previous` and `current`.
///
/// Only the top-left `min(w) x min(h)` region is compared; each input is
/// indexed with its own row stride. A pixel is changed when the mean absolute
/// RGB difference is strictly greater than `sensitivity` (alpha is ignored).
/// Changed pixels become [`HIGHLIGHT`]; unchanged pixels become the half
/// brightness luminance of the current pixel.
///
/// Pure and deterministic. Runs synchronously, so async callers should go
/// through `spawn_blocking`.
pub fn diff(previous: &DecodedImage, current: &DecodedImage, sensitivity: u8) -> DiffResult {
    let width = previous.width().min(current.width());
    let height = previous.height().min(current.height());

    let prev_px = previous.pixels();
    let cur_px = current.pixels();
    let prev_stride = previous.width() as usize * CHANNELS;
    let cur_stride = current.width() as usize * CHANNELS;

    // mean > s  <=>  sum > 3s, which keeps the comparison in integers.
    let limit = 3 * u32::from(sensitivity);

    let mut out = Vec::with_capacity(width as usize * height as usize * CHANNELS);
    let mut changed_pixels: u64 = 0;

    for y in 0..height as usize {
        let prev_row = &prev_px[y * prev_stride..][..width as usize * CHANNELS];
        let cur_row = &cur_px[y * cur_stride..][..width as usize * CHANNELS];

        for (p, c) in prev_row
            .chunks_exact(CHANNELS)
            .zip(cur_row.chunks_exact(CHANNELS))
        {
            let distance = u32::from(p[0].abs_diff(c[0]))
                + u32::from(p[1].abs_diff(c[1]))
                + u32::from(p[2].abs_diff(c[2]));

            if distance > limit {
                changed_pixels += 1;
                out.extend_from_slice(&HIGHLIGHT);
            } else {
                let gray = dimmed_luma(c[0], c[1], c[2]);
                out.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
    }

    let total_pixels = u64::from(width) * u64::from(height);
    // Both inputs have positive dimensions, so the overlap does too.
    let image = match DecodedImage::new(width, height, out) {
        Ok(img) => img,
        Err(e) => unreachable!("diff output is always well formed: {e}"),
    };

    DiffResult {
        image,
        changed_pixels,
        total_pixels,
    }
}

/// Rec.601 luminance rounded to an integer, then halved with ties to even.
fn dimmed_luma(r: u8, g: u8, b: u8) -> u8 {
    let luma = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)).round();
    (luma * 0.5).round_ties_even().clamp(0.0, 255.0) as u8
}
