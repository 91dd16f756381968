pub mod dicom;
pub mod image_loader;

pub use image_loader::{ImageKind, ImageLoader, LoadedImage};
