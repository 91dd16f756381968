use super::dicom;
use crate::{config::LoaderConfig, error::AnalysisError};
use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Capture modality, inferred from the container and bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Photograph,
    Radiograph,
}

/// A decoded scan ready for the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub kind: ImageKind,
    pub source: String,
}

pub struct ImageLoader {
    allowed_extensions: Vec<String>,
    max_upload_bytes: u64,
}

impl ImageLoader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.allowed_extensions.contains(&ext))
    }

    pub fn load_path(&self, path: &Path) -> Result<LoadedImage, AnalysisError> {
        if !self.is_allowed(path) {
            return Err(AnalysisError::UnsupportedFormat(path.display().to_string()));
        }

        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;

        let bytes = std::fs::read(path)?;
        let mut loaded = self.load_bytes(&bytes, &path.display().to_string())?;
        if matches!(extension_of(path).as_deref(), Some("tif" | "tiff")) {
            loaded.kind = ImageKind::Radiograph;
        }
        info!(
            "Loaded {} ({}x{}, {:?})",
            loaded.source,
            loaded.image.width(),
            loaded.image.height(),
            loaded.kind
        );
        Ok(loaded)
    }

    pub fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<LoadedImage, AnalysisError> {
        self.check_size(bytes.len() as u64)?;

        if dicom::is_dicom(bytes) {
            return self.load_dicom(bytes, source);
        }

        let format = image::guess_format(bytes)?;
        if !self.accepts_format(format) {
            return Err(AnalysisError::UnsupportedFormat(format!("{format:?}")));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (image, kind) = normalize_bit_depth(decoded);
        debug!("Decoded {} as {:?} ({:?})", source, format, kind);

        Ok(LoadedImage {
            image,
            kind,
            source: source.to_string(),
        })
    }

    /// DICOM scans are always radiographs; stored values are stretched to 8 bits.
    fn load_dicom(&self, bytes: &[u8], source: &str) -> Result<LoadedImage, AnalysisError> {
        if !self.allowed_extensions.iter().any(|a| a == "dcm") {
            return Err(AnalysisError::UnsupportedFormat("DICOM".to_string()));
        }

        let wide = dicom::decode_grayscale(bytes)?;
        debug!("Decoded {} as DICOM ({}x{})", source, wide.width(), wide.height());

        Ok(LoadedImage {
            image: DynamicImage::ImageLuma8(stretch_to_u8(&wide)),
            kind: ImageKind::Radiograph,
            source: source.to_string(),
        })
    }

    fn accepts_format(&self, format: ImageFormat) -> bool {
        format
            .extensions_str()
            .iter()
            .any(|ext| self.allowed_extensions.iter().any(|a| a == ext))
    }

    fn check_size(&self, size: u64) -> Result<(), AnalysisError> {
        if size > self.max_upload_bytes {
            return Err(AnalysisError::PayloadTooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(&LoaderConfig::default())
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// High-bit-depth single-channel scans are stretched into 8 bits.
fn normalize_bit_depth(image: DynamicImage) -> (DynamicImage, ImageKind) {
    match image {
        DynamicImage::ImageLuma16(wide) => (
            DynamicImage::ImageLuma8(stretch_to_u8(&wide)),
            ImageKind::Radiograph,
        ),
        DynamicImage::ImageLumaA16(_) => (
            DynamicImage::ImageLuma8(stretch_to_u8(&image.to_luma16())),
            ImageKind::Radiograph,
        ),
        other => (other, ImageKind::Photograph),
    }
}

/// Min-max stretch of 16-bit intensities to the full 8-bit range. Flat input maps to zero.
pub fn stretch_to_u8(wide: &ImageBuffer<Luma<u16>, Vec<u16>>) -> GrayImage {
    let (min, max) = wide
        .pixels()
        .fold((u16::MAX, u16::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if wide.width() == 0 || wide.height() == 0 || max <= min {
        return GrayImage::new(wide.width(), wide.height());
    }

    let range = (max - min) as f64;
    GrayImage::from_fn(wide.width(), wide.height(), |x, y| {
        let value = wide.get_pixel(x, y)[0];
        Luma([((value - min) as f64 * 255.0 / range) as u8])
    })
}
