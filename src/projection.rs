// src/projection.rs

use ndarray::{Array2, ArrayView2};

use crate::error::{FaceSpaceError, Result};

/// Projects samples onto a basis: `X . basis`, shape (N, k).
///
/// # Errors
/// `Dimension` if `x.ncols()` differs from `basis.nrows()`.
pub fn project(x: ArrayView2<f64>, basis: ArrayView2<f64>) -> Result<Array2<f64>> {
    if x.ncols() != basis.nrows() {
        return Err(FaceSpaceError::Dimension(format!(
            "samples have {} features but the basis expects {}",
            x.ncols(),
            basis.nrows()
        )));
    }
    Ok(x.dot(&basis))
}

/// Maps reduced coordinates back to feature space: `Z . basis^T`, shape (N, D).
///
/// Only meaningful for visualization; classification never looks at it.
///
/// # Errors
/// `Dimension` if `z.ncols()` differs from `basis.ncols()`.
pub fn reconstruct(z: ArrayView2<f64>, basis: ArrayView2<f64>) -> Result<Array2<f64>> {
    if z.ncols() != basis.ncols() {
        return Err(FaceSpaceError::Dimension(format!(
            "reduced data has {} components but the basis has {}",
            z.ncols(),
            basis.ncols()
        )));
    }
    Ok(z.dot(&basis.t()))
}

/// Mean squared per-element difference between `original` and `reconstructed`.
pub fn reconstruction_error(original: ArrayView2<f64>, reconstructed: ArrayView2<f64>) -> Result<f64> {
    if original.dim() != reconstructed.dim() {
        return Err(FaceSpaceError::Dimension(format!(
            "cannot compare a {:?} matrix with a {:?} reconstruction",
            original.dim(),
            reconstructed.dim()
        )));
    }
    if original.is_empty() {
        return Err(FaceSpaceError::Dimension("reconstruction error of an empty matrix".to_string()));
    }
    let sse: f64 = original
        .iter()
        .zip(reconstructed.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    Ok(sse / original.len() as f64)
}
