//! Image preprocessing variants applied before OCR.
//!
//! Slide images are often flat design-tool renders with low-contrast text,
//! so each variant trades detail for contrast differently.

use image::{DynamicImage, GrayImage, Luma};

/// Smoothing kernel used as the "degenerate" image when sharpening.
const SMOOTH_KERNEL: [u32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
const SMOOTH_KERNEL_SUM: u32 = 13;

/// A named preprocessing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocess {
    /// Grayscale, sharpen ×2.0, contrast ×1.5, auto-contrast (2% clip).
    Standard,
    /// Grayscale, contrast ×3.0, auto-contrast (5% clip), binarize at 200.
    HighContrast,
}

impl Preprocess {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::HighContrast => "high-contrast",
        }
    }

    /// Produce the grayscale image handed to the OCR engine.
    pub fn apply(&self, image: &DynamicImage) -> GrayImage {
        let gray = flatten_to_gray(image);
        match self {
            Self::Standard => {
                let img = sharpen(&gray, 2.0);
                let img = adjust_contrast(&img, 1.5);
                autocontrast(&img, 2)
            }
            Self::HighContrast => {
                let img = adjust_contrast(&gray, 3.0);
                let img = autocontrast(&img, 5);
                binarize(&img, 200)
            }
        }
    }
}

/// Composite transparent pixels onto white and convert to luminance.
pub fn flatten_to_gray(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let over_white = |c: u8| -> u32 {
            let a = a as u32;
            (c as u32 * a + 255 * (255 - a) + 127) / 255
        };
        let luma = (over_white(r) * 299 + over_white(g) * 587 + over_white(b) * 114) / 1000;
        Luma([luma.min(255) as u8])
    })
}

/// Blend the image away from its smoothed version by `factor`.
/// Border pixels are left as they are.
pub fn sharpen(image: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }

    let mut out = image.clone();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0u32;
            let mut k = 0;
            for dy in 0..3 {
                for dx in 0..3 {
                    let p = image.get_pixel(x + dx - 1, y + dy - 1).0[0] as u32;
                    acc += p * SMOOTH_KERNEL[k];
                    k += 1;
                }
            }
            let smooth = acc as f32 / SMOOTH_KERNEL_SUM as f32;
            let original = image.get_pixel(x, y).0[0] as f32;
            out.put_pixel(x, y, Luma([blend(smooth, original, factor)]));
        }
    }
    out
}

/// Scale distances from the mean gray level by `factor`.
pub fn adjust_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return image.clone();
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    let mean = (sum as f64 / pixels.len() as f64 + 0.5).floor() as f32;

    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = blend(mean, p.0[0] as f32, factor);
    }
    out
}

/// Stretch the histogram to the full range after clipping `cutoff_percent`
/// of the pixels from each end.
pub fn autocontrast(image: &GrayImage, cutoff_percent: u32) -> GrayImage {
    let mut histogram = [0u64; 256];
    for p in image.pixels() {
        histogram[p.0[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();

    let mut cut = total * cutoff_percent as u64 / 100;
    for count in histogram.iter_mut() {
        if cut == 0 {
            break;
        }
        let removed = cut.min(*count);
        *count -= removed;
        cut -= removed;
    }
    let mut cut = total * cutoff_percent as u64 / 100;
    for count in histogram.iter_mut().rev() {
        if cut == 0 {
            break;
        }
        let removed = cut.min(*count);
        *count -= removed;
        cut -= removed;
    }

    let lo = histogram.iter().position(|&c| c > 0);
    let hi = histogram.iter().rposition(|&c| c > 0);
    let (lo, hi) = match (lo, hi) {
        (Some(lo), Some(hi)) if hi > lo => (lo as f32, hi as f32),
        _ => return image.clone(),
    };

    let scale = 255.0 / (hi - lo);
    let offset = -lo * scale;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = (i as f32 * scale + offset).clamp(0.0, 255.0) as u8;
    }

    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
    }
    out
}

/// Pixels above `threshold` become white, the rest black.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
    }
    out
}

fn blend(degenerate: f32, original: f32, factor: f32) -> u8 {
    (degenerate + factor * (original - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}
