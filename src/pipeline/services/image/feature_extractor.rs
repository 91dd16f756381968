/// Feature extraction: grayscale, equalize, smooth, then measure four statistics.
use super::edges::hysteresis_edges;
use super::filters::{binarize, gaussian_blur, laplacian_response, std_dev, to_grayscale};
use crate::{config::ExtractionConfig, error::AnalysisError, pipeline::types::FeatureSet};
use image::{DynamicImage, GrayImage};
use imageproc::{
    contours::find_contours,
    contrast::{equalize_histogram, otsu_level},
};
use std::time::Instant;
use tracing::debug;

/// A denoised single-channel scan every statistic is measured on.
pub struct PreparedImage {
    pub gray: GrayImage,
}

impl PreparedImage {
    pub fn pixel_count(&self) -> f64 {
        self.gray.width() as f64 * self.gray.height() as f64
    }
}

/// One scalar measurement over a prepared scan.
pub trait ImageStatistic: Send + Sync {
    fn measure(&self, image: &PreparedImage) -> f64;
    fn name(&self) -> &'static str;
}

/// Outer regions of the Otsu-binarized scan.
pub struct ContourCount;

impl ImageStatistic for ContourCount {
    fn measure(&self, image: &PreparedImage) -> f64 {
        let level = otsu_level(&image.gray);
        let binary = binarize(&image.gray, level);
        find_contours::<i32>(&binary)
            .iter()
            .filter(|contour| contour.parent.is_none())
            .count() as f64
    }

    fn name(&self) -> &'static str {
        "contour_count"
    }
}

/// Share of pixels marked by a hysteresis edge detector.
pub struct EdgeDensity {
    low_threshold: f32,
    high_threshold: f32,
}

impl ImageStatistic for EdgeDensity {
    fn measure(&self, image: &PreparedImage) -> f64 {
        let edges = hysteresis_edges(&image.gray, self.low_threshold, self.high_threshold);
        let flagged = edges.pixels().filter(|p| p[0] > 0).count();
        flagged as f64 / image.pixel_count()
    }

    fn name(&self) -> &'static str {
        "edge_density"
    }
}

/// Detail left after subtracting a heavy blur.
pub struct HighFrequencyResidual {
    background_kernel: u32,
    normalizer: f64,
}

impl ImageStatistic for HighFrequencyResidual {
    fn measure(&self, image: &PreparedImage) -> f64 {
        let background = gaussian_blur(&image.gray, self.background_kernel);
        // 8-bit difference wraps, matching the calibration data.
        let residual = image
            .gray
            .pixels()
            .zip(background.pixels())
            .map(|(p, b)| p[0].wrapping_sub(b[0]) as f64);
        std_dev(residual) / self.normalizer
    }

    fn name(&self) -> &'static str {
        "high_frequency_residual"
    }
}

/// Spread of the second-derivative response.
pub struct LocalVariance {
    normalizer: f64,
}

impl ImageStatistic for LocalVariance {
    fn measure(&self, image: &PreparedImage) -> f64 {
        std_dev(laplacian_response(&image.gray)) / self.normalizer
    }

    fn name(&self) -> &'static str {
        "local_variance_magnitude"
    }
}

pub struct FeatureExtractor {
    smoothing_kernel: u32,
    contours: ContourCount,
    edges: EdgeDensity,
    residual: HighFrequencyResidual,
    variance: LocalVariance,
}

impl FeatureExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &ExtractionConfig) -> Self {
        Self {
            smoothing_kernel: config.smoothing_kernel,
            contours: ContourCount,
            edges: EdgeDensity {
                low_threshold: config.edge_low_threshold,
                high_threshold: config.edge_high_threshold,
            },
            residual: HighFrequencyResidual {
                background_kernel: config.background_kernel,
                normalizer: config.statistic_normalizer,
            },
            variance: LocalVariance {
                normalizer: config.statistic_normalizer,
            },
        }
    }

    /// Equalize first, then smooth; the thresholds were tuned on that order.
    pub fn prepare(&self, image: &DynamicImage) -> Result<PreparedImage, AnalysisError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidImage(format!(
                "image has zero area ({width}x{height})"
            )));
        }

        let gray = to_grayscale(image);
        let equalized = equalize_histogram(&gray);
        let smoothed = gaussian_blur(&equalized, self.smoothing_kernel);

        Ok(PreparedImage { gray: smoothed })
    }

    pub fn extract(&self, image: &DynamicImage) -> Result<FeatureSet, AnalysisError> {
        let start = Instant::now();
        let prepared = self.prepare(image)?;

        let statistics: [&dyn ImageStatistic; 4] =
            [&self.contours, &self.edges, &self.residual, &self.variance];
        let mut values = [0.0f64; 4];
        for (slot, statistic) in values.iter_mut().zip(statistics) {
            *slot = statistic.measure(&prepared);
            debug!("{} = {:.6}", statistic.name(), *slot);
        }

        let features = FeatureSet::new(values[0], values[1], values[2], values[3])?;
        debug!(
            "Extracted features from {}x{} image in {}us",
            prepared.gray.width(),
            prepared.gray.height(),
            start.elapsed().as_micros()
        );
        Ok(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::build(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb};

    fn checkerboard(size: u32, cell: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([230u8])
            } else {
                Luma([20u8])
            }
        }))
    }

    /// Bright enamel with sparse dark spots.
    fn spotted(size: u32, spacing: u32, spot: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |x, y| {
            if x % spacing < spot && y % spacing < spot {
                Luma([20u8])
            } else {
                Luma([230u8])
            }
        }))
    }

    fn prepared(gray: GrayImage) -> PreparedImage {
        PreparedImage { gray }
    }

    #[test]
    fn rejects_invalid_extraction_config() {
        let inverted = ExtractionConfig {
            edge_low_threshold: 200.0,
            edge_high_threshold: 100.0,
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            FeatureExtractor::new(&inverted),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let even = ExtractionConfig {
            smoothing_kernel: 4,
            ..ExtractionConfig::default()
        };
        assert!(FeatureExtractor::new(&even).is_err());
        assert!(FeatureExtractor::new(&ExtractionConfig::default()).is_ok());
    }

    #[test]
    fn counts_each_isolated_spot_once() {
        let spots = GrayImage::from_fn(32, 32, |x, y| {
            if x % 8 >= 3 && x % 8 < 5 && y % 8 >= 3 && y % 8 < 5 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        assert_eq!(ContourCount.measure(&prepared(spots)), 16.0);
    }

    #[test]
    fn stripe_edge_density_is_exact() {
        let stripes = GrayImage::from_fn(12, 4, |x, _| {
            Luma([if (x / 3) % 2 == 0 { 0u8 } else { 255u8 }])
        });
        let edges = EdgeDensity {
            low_threshold: 100.0,
            high_threshold: 200.0,
        };
        assert_eq!(edges.measure(&prepared(stripes)), 0.25);
    }

    #[test]
    fn residual_uses_wrapped_difference() {
        let step = GrayImage::from_fn(4, 1, |x, _| Luma([if x < 2 { 0u8 } else { 255u8 }]));
        let residual = HighFrequencyResidual {
            background_kernel: 3,
            normalizer: 128.0,
        };
        // background rounds to [0, 64, 191, 255]; residual is [0, 192, 64, 0]
        let value = residual.measure(&prepared(step));
        assert!((value - 0.375f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn laplacian_spread_of_impulse() {
        let mut impulse = GrayImage::new(3, 3);
        impulse.put_pixel(1, 1, Luma([255]));
        let variance = LocalVariance { normalizer: 128.0 };

        let expected = 17_686_800f64.sqrt() / 9.0 / 128.0;
        assert!((variance.measure(&prepared(impulse)) - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let extractor = FeatureExtractor::default();
        let result = extractor.extract(&DynamicImage::new_luma8(0, 0));
        assert!(matches!(result, Err(AnalysisError::InvalidImage(_))));

        let result = extractor.extract(&DynamicImage::new_rgb8(10, 0));
        assert!(matches!(result, Err(AnalysisError::InvalidImage(_))));
    }

    #[test]
    fn flat_image_has_no_texture() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(64, 64, Rgb([128, 128, 128])));
        let features = FeatureExtractor::default().extract(&image).unwrap();

        assert_eq!(features.edge_density, 0.0);
        assert_eq!(features.high_frequency_residual, 0.0);
        assert_eq!(features.local_variance_magnitude, 0.0);
    }

    #[test]
    fn textured_image_produces_edges_and_contours() {
        let features = FeatureExtractor::default()
            .extract(&spotted(96, 24, 8))
            .unwrap();

        assert!(features.contour_count >= 1.0);
        assert!(features.edge_density > 0.0 && features.edge_density <= 1.0);
        assert!(features.local_variance_magnitude > 0.0);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = FeatureExtractor::default();
        let image = checkerboard(64, 8);
        assert_eq!(
            extractor.extract(&image).unwrap(),
            extractor.extract(&image).unwrap()
        );
    }

    #[test]
    fn color_and_gray_inputs_share_pipeline() {
        let gray = checkerboard(48, 6);
        let color = DynamicImage::ImageRgb8(gray.to_rgb8());
        let extractor = FeatureExtractor::default();

        assert_eq!(
            extractor.extract(&gray).unwrap(),
            extractor.extract(&color).unwrap()
        );
    }
}
