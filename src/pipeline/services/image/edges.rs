//! Two-threshold edge detection on the raw intensities, with no smoothing pass of its own.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// tan(22.5°) in Q15.
const TAN_22_5: i64 = 13573;
const SHIFT: i64 = 15;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Marks edge pixels with 255.
///
/// Gradients are 3x3 Sobel with replicated borders and an L1 magnitude. A pixel
/// survives non-maximum suppression when its magnitude exceeds `low` and peaks
/// along the quantized gradient direction. Survivors above `high` seed the
/// result, and weaker survivors join when 8-connected to a seed.
pub fn hysteresis_edges(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as i64, height as i64);
    let dx = horizontal_sobel(image);
    let dy = vertical_sobel(image);

    let magnitude: Vec<i32> = dx
        .pixels()
        .zip(dy.pixels())
        .map(|(gx, gy)| (gx[0] as i32).abs() + (gy[0] as i32).abs())
        .collect();
    let mag = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0
        } else {
            magnitude[(y * w + x) as usize]
        }
    };

    let low = low.floor() as i32;
    let high = high.floor() as i32;
    let mut state = vec![NONE; magnitude.len()];
    let mut seeds = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let m = mag(x, y);
            if m <= low {
                continue;
            }

            let gx = dx.get_pixel(x as u32, y as u32)[0] as i64;
            let gy = dy.get_pixel(x as u32, y as u32)[0] as i64;
            let (ax, ay) = (gx.abs(), gy.abs());
            let tg22x = ax * TAN_22_5;
            let scaled_y = ay << SHIFT;

            let is_peak = if scaled_y < tg22x {
                m > mag(x - 1, y) && m >= mag(x + 1, y)
            } else {
                let tg67x = tg22x + (ax << (SHIFT + 1));
                if scaled_y > tg67x {
                    m > mag(x, y - 1) && m >= mag(x, y + 1)
                } else {
                    let s = if (gx ^ gy) < 0 { -1 } else { 1 };
                    m > mag(x - s, y - 1) && m > mag(x + s, y + 1)
                }
            };
            if !is_peak {
                continue;
            }

            let index = (y * w + x) as usize;
            if m > high {
                state[index] = STRONG;
                seeds.push((x, y));
            } else {
                state[index] = WEAK;
            }
        }
    }

    while let Some((x, y)) = seeds.pop() {
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let index = (ny * w + nx) as usize;
                if state[index] == WEAK {
                    state[index] = STRONG;
                    seeds.push((nx, ny));
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        if state[(y * width + x) as usize] == STRONG {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
