//! Pixel-level helpers shared by the feature extractor.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::{
    definitions::Image,
    filter::{laplacian_filter, separable_filter_equal},
};

/// Sampling kernels used for small apertures when no sigma is given.
const SMALL_GAUSSIAN_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// Normalized 1-D Gaussian weights for an odd aperture, sigma derived from the size.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    debug_assert!(size % 2 == 1, "gaussian aperture must be odd");

    if size <= 7 {
        return SMALL_GAUSSIAN_KERNELS[(size / 2) as usize].to_vec();
    }

    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let scale = -0.5 / (sigma * sigma);
    let center = (size / 2) as f64;

    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();

    weights.into_iter().map(|w| (w / total) as f32).collect()
}

/// Gaussian smoothing with reflected borders. Both passes run in `f32`; the result is rounded once.
pub fn gaussian_blur(image: &GrayImage, size: u32) -> GrayImage {
    let radius = size / 2;
    let padded = pad_reflect_101(image, radius);
    let wide: Image<Luma<f32>> = ImageBuffer::from_fn(padded.width(), padded.height(), |x, y| {
        Luma([padded.get_pixel(x, y)[0] as f32])
    });
    let blurred = separable_filter_equal(&wide, &gaussian_kernel(size));

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = blurred.get_pixel(x + radius, y + radius)[0];
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Laplacian response over every pixel, borders reflected like the blur.
pub fn laplacian_response(image: &GrayImage) -> Vec<f64> {
    let response = laplacian_filter(&pad_reflect_101(image, 1));
    let (width, height) = image.dimensions();
    (1..=height)
        .flat_map(|y| (1..=width).map(move |x| (x, y)))
        .map(|(x, y)| response.get_pixel(x, y)[0] as f64)
        .collect()
}

/// Pads by `radius` on every side, mirroring about the edge pixel (`dcb|abcd|cba`).
pub fn pad_reflect_101(image: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return image.clone();
    }
    let r = radius as i64;
    GrayImage::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
        let sx = reflect_101(x as i64 - r, width as i64);
        let sy = reflect_101(y as i64 - r, height as i64);
        *image.get_pixel(sx, sy)
    })
}

fn reflect_101(mut index: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    while index < 0 || index >= len {
        if index < 0 {
            index = -index;
        }
        if index >= len {
            index = 2 * (len - 1) - index;
        }
    }
    index as u32
}

/// Single-channel view of any decoded image, weighting colour channels by BT.601 luma.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                Luma([luma.round().clamp(0.0, 255.0) as u8])
            })
        }
    }
}

/// Foreground is every pixel strictly above `level`.
pub fn binarize(image: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Population standard deviation.
pub fn std_dev<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    let (count, sum) = values
        .clone()
        .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    variance.sqrt()
}
