#![allow(dead_code)]

use cardar::types::Rect;
use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Random 10px colour blocks: plenty of corners for FAST.
pub fn textured_card(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cols = width / 10 + 1;
    let cells: Vec<[u8; 3]> = (0..cols * (height / 10 + 1))
        .map(|_| [rng.random_range(0..=255u8), rng.random_range(0..=255u8), rng.random_range(0..=255u8)])
        .collect();
    RgbaImage::from_fn(width, height, |x, y| {
        let c = cells[((y / 10) * cols + x / 10) as usize];
        Rgba([c[0], c[1], c[2], 255])
    })
}

pub fn blank_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([40, 40, 40, 255]))
}

/// A `width` x `height` frame showing `card` at `roi`.
pub fn frame_with_card(width: u32, height: u32, card: &RgbaImage, roi: &Rect) -> RgbaImage {
    let mut frame = blank_frame(width, height);
    image::imageops::replace(&mut frame, card, roi.x as i64, roi.y as i64);
    frame
}
