// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Denoising filters for binarized document images.

use image::GrayImage;
use imageproc::filter::median_filter;
use panscan_core::config::DenoiseMethod;
use tracing::debug;

/// Weights smaller than this are treated as zero.
const WEIGHT_THRESHOLD: f32 = 0.001;

/// Largest possible mean squared difference between two 8-bit patches.
const MAX_MEAN_SQ_DIFF: usize = 255 * 255;

/// Apply the configured denoising method to a grayscale image.
pub fn apply(gray: &GrayImage, method: DenoiseMethod) -> GrayImage {
    match method {
        DenoiseMethod::NonLocalMeans {
            h,
            template_window,
            search_window,
        } => non_local_means(gray, h, template_window, search_window),
        DenoiseMethod::Median { radius } => median_filter(gray, radius, radius),
        DenoiseMethod::None => gray.clone(),
    }
}

/// Non-local means denoising.
///
/// Every output pixel is a weighted average of the pixels in its
/// `search_window` square. A candidate's weight is `exp(-d / h²)`, where `d`
/// is the mean squared difference between the `template_window` patch around
/// the candidate and the one around the output pixel. Borders replicate the
/// edge pixels.
///
/// Patch distances are computed one search offset at a time with running
/// box sums, so the cost is `O(width * height * search_window²)` regardless
/// of the template size.
pub fn non_local_means(
    gray: &GrayImage,
    h: f32,
    template_window: u32,
    search_window: u32,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tr = (template_window / 2) as usize;
    let sr = (search_window / 2) as isize;
    let border = tr + sr as usize;
    let padded = PaddedImage::new(gray, border);

    let w = width as usize;
    let hgt = height as usize;
    let area = u64::from(template_window) * u64::from(template_window);
    let weights = weight_table(h);

    // Horizontal patch sums for every row a template can reach.
    let rows = hgt + 2 * tr;
    let mut row_sums = vec![0u64; rows * w];
    let mut column_sums = vec![0u64; w];
    let mut numerator = vec![0f32; w * hgt];
    let mut denominator = vec![0f32; w * hgt];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            for r in 0..rows {
                let py = (r + sr as usize) as isize;
                let qy = py + dy;
                let row = &mut row_sums[r * w..(r + 1) * w];

                let mut acc = 0u64;
                for k in 0..=2 * tr {
                    let px = (sr as usize + k) as isize;
                    acc += padded.sq_diff(px, py, px + dx, qy);
                }
                row[0] = acc;

                for (x, slot) in row.iter_mut().enumerate().skip(1) {
                    let entering = (x + border + tr) as isize;
                    let leaving = (x + border - tr - 1) as isize;
                    acc += padded.sq_diff(entering, py, entering + dx, qy);
                    acc -= padded.sq_diff(leaving, py, leaving + dx, qy);
                    *slot = acc;
                }
            }

            column_sums.fill(0);
            for r in 0..=2 * tr {
                for (x, sum) in column_sums.iter_mut().enumerate() {
                    *sum += row_sums[r * w + x];
                }
            }

            for y in 0..hgt {
                if y > 0 {
                    let entering = (y + 2 * tr) * w;
                    let leaving = (y - 1) * w;
                    for (x, sum) in column_sums.iter_mut().enumerate() {
                        *sum += row_sums[entering + x];
                        *sum -= row_sums[leaving + x];
                    }
                }

                for (x, &ssd) in column_sums.iter().enumerate() {
                    let weight = weights[(ssd / area) as usize];
                    if weight == 0.0 {
                        continue;
                    }
                    let candidate = padded.get(
                        (x + border) as isize + dx,
                        (y + border) as isize + dy,
                    );
                    numerator[y * w + x] += weight * candidate as f32;
                    denominator[y * w + x] += weight;
                }
            }
        }
    }

    debug!(width, height, template_window, search_window, "Non-local means complete");

    // The zero offset always contributes weight 1, so the denominator is >= 1.
    GrayImage::from_fn(width, height, |x, y| {
        let idx = y as usize * w + x as usize;
        let value = (numerator[idx] / denominator[idx]).round().clamp(0.0, 255.0);
        image::Luma([value as u8])
    })
}

/// Weight for each possible mean squared patch difference.
fn weight_table(h: f32) -> Vec<f32> {
    let h2 = h * h;
    (0..=MAX_MEAN_SQ_DIFF)
        .map(|d| {
            let weight = (-(d as f32) / h2).exp();
            if weight < WEIGHT_THRESHOLD { 0.0 } else { weight }
        })
        .collect()
}

/// A grayscale image with a replicated border of fixed width on every side.
struct PaddedImage {
    data: Vec<u8>,
    stride: usize,
}

impl PaddedImage {
    fn new(gray: &GrayImage, border: usize) -> Self {
        let (w, h) = gray.dimensions();
        let (w, h) = (w as usize, h as usize);
        let stride = w + 2 * border;
        let rows = h + 2 * border;
        let src = gray.as_raw();

        let mut data = Vec::with_capacity(stride * rows);
        for py in 0..rows {
            let sy = py.saturating_sub(border).min(h - 1);
            for px in 0..stride {
                let sx = px.saturating_sub(border).min(w - 1);
                data.push(src[sy * w + sx]);
            }
        }
        Self { data, stride }
    }

    #[inline]
    fn get(&self, x: isize, y: isize) -> u8 {
        self.data[y as usize * self.stride + x as usize]
    }

    #[inline]
    fn sq_diff(&self, ax: isize, ay: isize, bx: isize, by: isize) -> u64 {
        let d = self.get(ax, ay) as i32 - self.get(bx, by) as i32;
        (d * d) as u64
    }
}
