//! Page cleanup: turn a rendered page into a clean two-level image.
//!
//! ## Steps
//!
//! 1. **Grayscale.** 8-bit luma input passes through untouched. Any other
//!    layout (luma+alpha, RGB, RGBA, 16-bit, float) is widened to RGBA8,
//!    alpha is composited over white paper, and BT.601 weights give the luma.
//! 2. **Adaptive threshold.** Each pixel is compared against the
//!    Gaussian-weighted mean of its `block_size × block_size` neighbourhood
//!    minus `offset`. A local cutoff survives uneven scan lighting where a
//!    single global threshold would blacken shadows or wash out faint print.
//! 3. **Median denoise.** A small median window removes the isolated specks
//!    thresholding leaves behind without rounding glyph edges.
//!
//! The transform is pure and total: any image in, a same-sized image out,
//! every pixel either 0 or 255 when cleanup is enabled.

use crate::config::CleanupParams;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{median_filter, separable_filter_equal};

/// Run the configured cleanup on one rendered page.
pub fn clean_page(image: &DynamicImage, params: &CleanupParams) -> GrayImage {
    let gray = to_grayscale(image);
    if !params.enabled {
        return gray;
    }
    let binary = adaptive_threshold_gaussian(&gray, params.block_size, params.offset);
    denoise(&binary, params.median_window)
}

/// Convert any image to single-channel 8-bit luma.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Luma([luma_over_white(r, g, b, a)])
    })
}

/// BT.601 luma of a pixel composited over white, in 14-bit fixed point.
fn luma_over_white(r: u8, g: u8, b: u8, a: u8) -> u8 {
    let a = a as u32;
    let blend = |c: u8| (c as u32 * a + 255 * (255 - a) + 127) / 255;
    let y = blend(r) * 4899 + blend(g) * 9617 + blend(b) * 1868 + (1 << 13);
    (y >> 14).min(255) as u8
}

/// Binarise with a Gaussian-weighted local threshold.
///
/// A pixel turns white when `src - mean > -offset`, black otherwise.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let mean = gaussian_mean(gray, block_size);
    let (w, h) = gray.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let src = gray.get_pixel(x, y).0[0] as i32;
        let m = mean.get_pixel(x, y).0[0] as i32;
        Luma([if src - m > -offset { 255 } else { 0 }])
    })
}

/// Median filter over a square `window × window` neighbourhood.
pub fn denoise(gray: &GrayImage, window: u32) -> GrayImage {
    let radius = window / 2;
    if radius == 0 || gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    median_filter(gray, radius, radius)
}

/// Normalised 1-D Gaussian of odd length `size`.
///
/// σ follows the usual block-size rule `0.3·((size−1)·0.5 − 1) + 0.8`, so a
/// 35 px block uses σ = 5.6.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as i32;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| ((i * i) as f32 * scale).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|v| *v /= sum);
    kernel
}

/// Gaussian-weighted local mean, borders replicated.
fn gaussian_mean(gray: &GrayImage, block_size: u32) -> GrayImage {
    if gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }
    separable_filter_equal(gray, &gaussian_kernel(block_size))
}
