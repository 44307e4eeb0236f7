//! Low level image operations shared by template and frame preprocessing.

use image::{GrayImage, ImageBuffer, Pixel, RgbaImage};

use crate::errors::CaptureError;
use crate::types::Rect;

/// Source span covered by one destination sample along one axis.
struct AxisWeights {
    start: usize,
    weights: Vec<f32>,
}

/// Box filter weights for mapping `src_len` samples onto `dst_len` samples.
fn axis_weights(src_len: u32, dst_len: u32) -> Vec<AxisWeights> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = ((i + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).clamp(first + 1, src_len as usize);
            let span = end - start;
            let weights = (first..last)
                .map(|j| {
                    let lo = start.max(j as f64);
                    let hi = end.min((j + 1) as f64);
                    ((hi - lo).max(0.0) / span) as f32
                })
                .collect();
            AxisWeights {
                start: first,
                weights,
            }
        })
        .collect()
}

/// Resizes an 8-bit image by area averaging.
///
/// Each destination pixel is the mean of the source area it covers, with
/// fractional coverage at the borders. Same size input is returned as a copy.
pub fn resize_area<P>(src: &ImageBuffer<P, Vec<u8>>, width: u32, height: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    if src.width() == width && src.height() == height {
        return src.clone();
    }
    let mut out = ImageBuffer::<P, Vec<u8>>::new(width, height);
    if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
        return out;
    }

    let channels = P::CHANNEL_COUNT as usize;
    let src_w = src.width() as usize;
    let raw: &[u8] = src.as_raw();

    // Horizontal pass into a float buffer of width x src_height.
    let cols = axis_weights(src.width(), width);
    let mut horizontal = vec![0.0f32; width as usize * src.height() as usize * channels];
    for y in 0..src.height() as usize {
        let row = &raw[y * src_w * channels..(y + 1) * src_w * channels];
        for (x, col) in cols.iter().enumerate() {
            let dst = &mut horizontal[(y * width as usize + x) * channels..][..channels];
            for (k, w) in col.weights.iter().enumerate() {
                let px = &row[(col.start + k) * channels..][..channels];
                for c in 0..channels {
                    dst[c] += px[c] as f32 * w;
                }
            }
        }
    }

    // Vertical pass.
    let rows = axis_weights(src.height(), height);
    let buf: &mut [u8] = &mut out;
    let stride = width as usize * channels;
    for (y, row) in rows.iter().enumerate() {
        for x in 0..stride {
            let mut acc = 0.0f32;
            for (k, w) in row.weights.iter().enumerate() {
                acc += horizontal[(row.start + k) * stride + x] * w;
            }
            buf[y * stride + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Copies `roi` out of `frame`.
pub fn crop(frame: &RgbaImage, roi: &Rect) -> Result<RgbaImage, CaptureError> {
    if roi.is_empty() || !roi.fits_within(frame.width(), frame.height()) {
        return Err(CaptureError::RoiOutOfBounds {
            roi: *roi,
            width: frame.width(),
            height: frame.height(),
        });
    }
    Ok(image::imageops::crop_imm(frame, roi.x, roi.y, roi.width, roi.height).to_image())
}

pub fn grayscale(image: &RgbaImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Global histogram equalization.
///
/// Remaps through the normalized cumulative histogram:
/// `lut[v] = round((cdf[v] - cdf_min) * 255 / (N - cdf_min))`.
/// A constant image maps to all zeros.
pub fn equalize_histogram(image: &GrayImage) -> GrayImage {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return image.clone();
    }

    let mut hist = [0u32; 256];
    for p in image.as_raw() {
        hist[*p as usize] += 1;
    }
    let lut = build_lut(&hist, total);

    let mut out = image.clone();
    for p in out.iter_mut() {
        *p = lut[*p as usize];
    }
    out
}

fn build_lut(hist: &[u32; 256], total: usize) -> [u8; 256] {
    let mut cdf = [0u32; 256];
    cdf[0] = hist[0];
    for i in 1..256 {
        cdf[i] = cdf[i - 1] + hist[i];
    }
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);

    let mut lut = [0u8; 256];
    let denom = total as f32 - cdf_min as f32;
    if denom <= 0.0 {
        return lut;
    }
    for i in 0..256 {
        let val = (cdf[i] as f32 - cdf_min as f32) / denom * 255.0;
        lut[i] = val.round().clamp(0.0, 255.0) as u8;
    }
    lut
}
