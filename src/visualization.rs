// src/visualization.rs

//! Writes reconstructions and eigenfaces as grayscale PNG files.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat};
use log::info;
use ndarray::{ArrayView1, ArrayView2};

use crate::dataset::FeatureDimension;
use crate::error::{FaceSpaceError, Result};

/// File name prefix of rendered eigenvectors.
pub const EIGENFACE_PREFIX: &str = "eigenface_";

/// Renders a flattened image, stretching its value range to 0..=255.
///
/// Constant vectors render black.
pub fn to_gray_image(values: ArrayView1<f64>, dimension: FeatureDimension) -> Result<GrayImage> {
    if values.len() != dimension.len() {
        return Err(FaceSpaceError::Dimension(format!(
            "{} values cannot fill a {}x{} image",
            values.len(),
            dimension.width,
            dimension.height
        )));
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let pixels: Vec<u8> = values
        .iter()
        .map(|&v| {
            if range > 0.0 && range.is_finite() {
                (255.0 * (v - min) / range).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect();
    GrayImage::from_raw(dimension.width, dimension.height, pixels).ok_or_else(|| {
        FaceSpaceError::Dimension("pixel buffer does not match the image size".to_string())
    })
}

/// Writes row `i` of `reconstruction` to `<dir>/<identifiers[i]>.png`.
pub fn save_reconstructions(
    dir: &Path,
    identifiers: &[String],
    reconstruction: ArrayView2<f64>,
    dimension: FeatureDimension,
) -> Result<Vec<PathBuf>> {
    if identifiers.len() != reconstruction.nrows() {
        return Err(FaceSpaceError::Dimension(format!(
            "{} identifiers for {} reconstructed rows",
            identifiers.len(),
            reconstruction.nrows()
        )));
    }
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(identifiers.len());
    for (name, row) in identifiers.iter().zip(reconstruction.rows()) {
        let path = dir.join(format!("{}.png", name));
        to_gray_image(row, dimension)?.save_with_format(&path, ImageFormat::Png)?;
        written.push(path);
    }
    info!("Wrote {} reconstructed images to {}", written.len(), dir.display());
    Ok(written)
}

/// Writes column `i` of `basis` to `<dir>/eigenface_<i>.png`.
pub fn save_eigenfaces(dir: &Path, basis: ArrayView2<f64>, dimension: FeatureDimension) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(basis.ncols());
    for (i, column) in basis.columns().into_iter().enumerate() {
        let path = dir.join(format!("{}{}.png", EIGENFACE_PREFIX, i));
        to_gray_image(column, dimension)?.save_with_format(&path, ImageFormat::Png)?;
        written.push(path);
    }
    info!("Wrote {} eigenfaces to {}", written.len(), dir.display());
    Ok(written)
}
