// src/dataset.rs

//! Loading labeled face images into a sample matrix.
//!
//! File names carry the identity: everything before the first `.` is stripped
//! of non-digits and parsed, so `subject07.happy` belongs to subject 7.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imageops::FilterType;
use image::ImageReader;
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::classifier::Label;
use crate::error::{FaceSpaceError, Result};

/// Resize target shared by every image of a run. `D = width * height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureDimension {
    pub width: u32,
    pub height: u32,
}

impl Default for FeatureDimension {
    fn default() -> Self {
        Self {
            width: 60,
            height: 60,
        }
    }
}

impl FeatureDimension {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let dim = Self { width, height };
        dim.validate()?;
        Ok(dim)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FaceSpaceError::InvalidParameter(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Number of features (pixels) per sample.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Labeled sample matrix: one flattened image per row.
#[derive(Debug, Clone)]
pub struct SampleSet {
    data: Array2<f64>,
    labels: Vec<Label>,
    identifiers: Vec<String>,
    dimension: FeatureDimension,
}

impl SampleSet {
    /// Bundles a sample matrix with its labels and identifiers.
    ///
    /// # Errors
    /// `Dimension` if labels or identifiers are not parallel to the rows, or
    /// the row width is not `dimension.len()`.
    pub fn new(
        data: Array2<f64>,
        labels: Vec<Label>,
        identifiers: Vec<String>,
        dimension: FeatureDimension,
    ) -> Result<Self> {
        if labels.len() != data.nrows() || identifiers.len() != data.nrows() {
            return Err(FaceSpaceError::Dimension(format!(
                "{} rows but {} labels and {} identifiers",
                data.nrows(),
                labels.len(),
                identifiers.len()
            )));
        }
        if data.ncols() != dimension.len() {
            return Err(FaceSpaceError::Dimension(format!(
                "rows have {} features but a {}x{} image has {}",
                data.ncols(),
                dimension.width,
                dimension.height,
                dimension.len()
            )));
        }
        Ok(Self {
            data,
            labels,
            identifiers,
            dimension,
        })
    }

    pub fn data(&self) -> ArrayView2<f64> {
        self.data.view()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn dimension(&self) -> FeatureDimension {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }
}

/// Extracts the identity label from a file name such as `subject07.happy`.
///
/// # Errors
/// `InvalidParameter` when the part before the first `.` contains no digits.
pub fn label_from_file_name(name: &str) -> Result<Label> {
    let stem = name.split('.').next().unwrap_or("");
    let digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(FaceSpaceError::InvalidParameter(format!(
            "file name '{}' carries no numeric label",
            name
        )));
    }
    digits.parse::<Label>().map_err(|e| {
        FaceSpaceError::InvalidParameter(format!("label in '{}' is not a valid number: {}", name, e))
    })
}

/// Decodes an image, resizes it to `dimension` and flattens its grayscale
/// intensities row by row.
///
/// The format is sniffed from the file contents, so extension-less files
/// (e.g. `subject01.glasses`) load as well.
pub fn load_image_features(path: &Path, dimension: FeatureDimension) -> Result<Vec<f64>> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let gray = img
        .resize_exact(dimension.width, dimension.height, FilterType::Lanczos3)
        .to_luma8();
    Ok(gray.as_raw().iter().map(|&p| f64::from(p)).collect())
}

/// Loads every image directly inside `dir` (no recursion, hidden files skipped),
/// in file-name order. Symlinks are followed.
///
/// # Errors
/// - `Io` if the directory cannot be read.
/// - `Image` if a file is not a decodable image.
/// - `InvalidParameter` if a file name has no numeric label.
/// - `Dimension` if the directory holds no images.
pub fn load_directory(dir: &Path, dimension: FeatureDimension) -> Result<SampleSet> {
    dimension.validate()?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            debug!("Skipping hidden file {:?}", entry.path());
            continue;
        }
        paths.push(entry.into_path());
    }
    if paths.is_empty() {
        return Err(FaceSpaceError::Dimension(format!(
            "no images found in {}",
            dir.display()
        )));
    }
    load_files(&paths, dimension)
}

/// Loads the given image files in order.
pub fn load_files(paths: &[PathBuf], dimension: FeatureDimension) -> Result<SampleSet> {
    dimension.validate()?;
    let start = Instant::now();
    let n_features = dimension.len();
    let mut data = Array2::<f64>::zeros((paths.len(), n_features));
    let mut labels = Vec::with_capacity(paths.len());
    let mut identifiers = Vec::with_capacity(paths.len());

    for (row_idx, path) in paths.iter().enumerate() {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FaceSpaceError::InvalidParameter(format!("unreadable file name {}", path.display()))
            })?
            .to_string();
        let label = label_from_file_name(&name)?;
        let pixels = load_image_features(path, dimension)?;

        if pixels.iter().all(|&p| p == pixels[0]) {
            warn!("{} is a constant image after resizing.", name);
        }
        for (dst, src) in data.row_mut(row_idx).iter_mut().zip(pixels) {
            *dst = src;
        }
        labels.push(label);
        identifiers.push(name);
    }

    info!(
        "Loaded {} images at {}x{} in {:?}.",
        paths.len(),
        dimension.width,
        dimension.height,
        start.elapsed()
    );
    SampleSet::new(data, labels, identifiers, dimension)
}
