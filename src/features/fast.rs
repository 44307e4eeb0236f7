//! FAST-9 corner detection and Harris corner response.

use image::GrayImage;

/// Bresenham circle of radius 3, clockwise from the top.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;
const HARRIS_K: f32 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// Detects FAST-9 corners at least `border` pixels from every edge, keeping
/// only 3x3 local maxima of the corner score. Output is in row-major order.
pub fn detect(image: &GrayImage, threshold: u8, border: u32) -> Vec<Corner> {
    let (w, h) = image.dimensions();
    let border = border.max(3);
    if w <= 2 * border || h <= 2 * border {
        return Vec::new();
    }

    let stride = w as usize;
    let raw = image.as_raw();
    let offsets: Vec<isize> = CIRCLE
        .iter()
        .map(|(dx, dy)| *dy as isize * stride as isize + *dx as isize)
        .collect();

    let mut scores = vec![0.0f32; raw.len()];
    for y in border..h - border {
        for x in border..w - border {
            let idx = y as usize * stride + x as usize;
            if let Some(score) = corner_score(raw, idx, &offsets, threshold) {
                scores[idx] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in border..h - border {
        for x in border..w - border {
            let idx = y as usize * stride + x as usize;
            let s = scores[idx];
            if s <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'nms: for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n = (idx as isize + dy * stride as isize + dx) as usize;
                    // ties go to the earlier pixel in scan order
                    if scores[n] > s || (scores[n] == s && n < idx) {
                        is_max = false;
                        break 'nms;
                    }
                }
            }
            if is_max {
                corners.push(Corner { x, y, score: s });
            }
        }
    }
    corners
}

fn corner_score(raw: &[u8], idx: usize, offsets: &[isize], threshold: u8) -> Option<f32> {
    let center = raw[idx] as i16;
    let t = threshold as i16;
    let at = |k: usize| raw[(idx as isize + offsets[k]) as usize] as i16;

    // Any 9-arc covers at least two of the four compass points.
    let compass = [at(0), at(4), at(8), at(12)];
    let bright = compass.iter().filter(|&&p| p > center + t).count();
    let dark = compass.iter().filter(|&&p| p < center - t).count();
    if bright < 2 && dark < 2 {
        return None;
    }

    let ring: [i16; 16] = std::array::from_fn(at);
    let is_bright = has_arc(&ring, |p| p > center + t);
    let is_dark = has_arc(&ring, |p| p < center - t);
    if !is_bright && !is_dark {
        return None;
    }

    let bright_sum: i32 = ring
        .iter()
        .map(|&p| (p - center - t).max(0) as i32)
        .sum();
    let dark_sum: i32 = ring
        .iter()
        .map(|&p| (center - p - t).max(0) as i32)
        .sum();
    Some(bright_sum.max(dark_sum).max(1) as f32)
}

fn has_arc(ring: &[i16; 16], pred: impl Fn(i16) -> bool) -> bool {
    let mut run = 0;
    for k in 0..16 + ARC_LENGTH {
        if pred(ring[k % 16]) {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Harris corner response over a `block` x `block` window of Sobel gradients
/// centred on (x, y). The caller keeps the window plus one pixel inside the
/// image.
pub fn harris_response(image: &GrayImage, x: u32, y: u32, block: u32) -> f32 {
    let raw = image.as_raw();
    let stride = image.width() as isize;
    let half = (block / 2) as isize;
    let px = |xx: isize, yy: isize| raw[(yy * stride + xx) as usize] as f32;

    let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
    for dy in -half..=half {
        for dx in -half..=half {
            let xx = x as isize + dx;
            let yy = y as isize + dy;
            let ix = (px(xx + 1, yy - 1) + 2.0 * px(xx + 1, yy) + px(xx + 1, yy + 1))
                - (px(xx - 1, yy - 1) + 2.0 * px(xx - 1, yy) + px(xx - 1, yy + 1));
            let iy = (px(xx - 1, yy + 1) + 2.0 * px(xx, yy + 1) + px(xx + 1, yy + 1))
                - (px(xx - 1, yy - 1) + 2.0 * px(xx, yy - 1) + px(xx + 1, yy - 1));
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }
    let scale = 1.0 / (4.0 * block as f32 * 255.0);
    let scale4 = scale.powi(4);
    (a * b - c * c - HARRIS_K * (a + b) * (a + b)) * scale4
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Luma([220])
            } else {
                Luma([30])
            }
        })
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(64, 64, Luma([90]));
        assert!(detect(&img, 20, 3).is_empty());
    }

    #[test]
    fn square_corners_are_found() {
        let img = square(64, 20, 44);
        let corners = detect(&img, 20, 3);
        assert!(!corners.is_empty());
        for (cx, cy) in [(20, 20), (43, 20), (20, 43), (43, 43)] {
            assert!(
                corners
                    .iter()
                    .any(|c| (c.x as i32 - cx).abs() <= 2 && (c.y as i32 - cy).abs() <= 2),
                "missing corner near ({cx}, {cy})"
            );
        }
    }

    #[test]
    fn straight_edges_are_not_corners() {
        let img = square(64, 20, 44);
        let corners = detect(&img, 20, 3);
        assert!(!corners.iter().any(|c| c.x == 32));
    }

    #[test]
    fn border_is_respected() {
        let img = square(64, 2, 62);
        let corners = detect(&img, 20, 10);
        assert!(corners.iter().all(|c| c.x >= 10 && c.x < 54 && c.y >= 10 && c.y < 54));
    }

    #[test]
    fn harris_prefers_corners_over_edges() {
        let img = square(64, 20, 44);
        let corner = harris_response(&img, 20, 20, 7);
        let edge = harris_response(&img, 32, 20, 7);
        let flat = harris_response(&img, 32, 32, 7);
        assert!(corner > edge);
        assert!(corner > 0.0);
        assert!(edge <= 0.0);
        assert_eq!(flat, 0.0);
    }
}
