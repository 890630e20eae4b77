// src/matrix.rs

//! Dense matrix helpers shared by the subspace extractor and the classifier.
//!
//! Every function takes samples as rows. Nothing here allocates more than the
//! result it returns plus one centered copy of the input.

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{FaceSpaceError, Result};

/// Rejects matrices with zero rows or zero columns.
pub fn ensure_non_empty(matrix: ArrayView2<f64>, what: &str) -> Result<()> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(FaceSpaceError::Dimension(format!(
            "{} is empty ({}x{})",
            what,
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(())
}

/// Builds a sample matrix from row vectors, rejecting empty or ragged input.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_features = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || n_features == 0 {
        return Err(FaceSpaceError::Dimension(
            "cannot build a sample matrix from zero rows or zero-length rows".to_string(),
        ));
    }
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
        return Err(FaceSpaceError::Dimension(format!(
            "ragged input: row {} has {} features, expected {}",
            idx,
            row.len(),
            n_features
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), n_features), flat)
        .map_err(|e| FaceSpaceError::Dimension(e.to_string()))
}

/// Feature covariance (D x D) of an N x D sample matrix.
///
/// Columns are centered by their sample mean and the scatter matrix is divided
/// by `N - 1`, the same unbiased convention as `numpy.cov`. The result is
/// symmetrized so that `S_ij == S_ji` holds bit for bit.
///
/// # Errors
/// `Dimension` if the matrix is empty or has fewer than two samples.
pub fn covariance(samples: ArrayView2<f64>) -> Result<Array2<f64>> {
    ensure_non_empty(samples, "sample matrix")?;
    let n_samples = samples.nrows();
    if n_samples < 2 {
        return Err(FaceSpaceError::Dimension(
            "covariance requires at least 2 samples".to_string(),
        ));
    }

    let mean = samples
        .mean_axis(Axis(0))
        .ok_or_else(|| FaceSpaceError::Dimension("failed to compute column means".to_string()))?;
    let centered = &samples - &mean;
    let mut cov = centered.t().dot(&centered);
    cov /= (n_samples - 1) as f64;
    symmetrize(&mut cov);
    Ok(cov)
}

/// Linear-kernel Gram matrix over the feature axis, `X^T X` (D x D).
pub fn gram_matrix_linear(samples: ArrayView2<f64>) -> Result<Array2<f64>> {
    ensure_non_empty(samples, "sample matrix")?;
    let mut gram = samples.t().dot(&samples);
    symmetrize(&mut gram);
    Ok(gram)
}

/// Squared Euclidean distances between every pair of rows (N x N).
///
/// Uses `|a|^2 + |b|^2 - 2 a.b`, clamps rounding negatives to zero and pins the
/// diagonal to exactly zero.
pub fn pairwise_sq_euclidean(samples: ArrayView2<f64>) -> Result<Array2<f64>> {
    ensure_non_empty(samples, "sample matrix")?;
    let mut dists = cross_sq_euclidean(samples, samples)?;
    symmetrize(&mut dists);
    dists.diag_mut().fill(0.0);
    Ok(dists)
}

/// Squared Euclidean distances between the rows of `a` and the rows of `b`.
pub fn cross_sq_euclidean(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<Array2<f64>> {
    ensure_non_empty(a, "left operand")?;
    ensure_non_empty(b, "right operand")?;
    if a.ncols() != b.ncols() {
        return Err(FaceSpaceError::Dimension(format!(
            "cannot compare rows of width {} with rows of width {}",
            a.ncols(),
            b.ncols()
        )));
    }

    let a_norms = a.map_axis(Axis(1), |row| row.dot(&row));
    let b_norms = b.map_axis(Axis(1), |row| row.dot(&row));
    let mut dists = a.dot(&b.t());
    dists.mapv_inplace(|v| -2.0 * v);
    dists += &a_norms.insert_axis(Axis(1));
    dists += &b_norms.insert_axis(Axis(0));
    dists.mapv_inplace(|v| v.max(0.0));
    Ok(dists)
}

/// Largest absolute difference between mirrored entries. Non-square input yields `None`.
pub fn max_asymmetry(matrix: ArrayView2<f64>) -> Option<f64> {
    if !matrix.is_square() {
        return None;
    }
    let n = matrix.nrows();
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((matrix[[i, j]] - matrix[[j, i]]).abs());
        }
    }
    Some(worst)
}

/// True when `matrix` is square and symmetric to within `tolerance`
/// scaled by `max(1, max|S_ij|)`.
pub fn is_symmetric(matrix: ArrayView2<f64>, tolerance: f64) -> bool {
    match max_asymmetry(matrix) {
        Some(asym) => asym <= tolerance * magnitude(matrix),
        None => false,
    }
}

/// `max(1, max|S_ij|)`, the scale symmetry tolerances are relative to.
pub(crate) fn magnitude(matrix: ArrayView2<f64>) -> f64 {
    matrix.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()))
}

/// Replaces a nearly symmetric matrix with `(S + S^T) / 2`.
fn symmetrize(matrix: &mut Array2<f64>) {
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (matrix[[i, j]] + matrix[[j, i]]);
            matrix[[i, j]] = avg;
            matrix[[j, i]] = avg;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_covariance_matches_unbiased_estimate() {
        let x = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
        let cov = covariance(x.view()).unwrap();
        // column variances 4 and 16, covariance 8
        assert_abs_diff_eq!(cov, array![[4.0, 8.0], [8.0, 16.0]], epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_needs_two_samples() {
        let x = array![[1.0, 2.0, 3.0]];
        assert!(matches!(covariance(x.view()), Err(FaceSpaceError::Dimension(_))));
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(gram_matrix_linear(empty.view()), Err(FaceSpaceError::Dimension(_))));
        assert!(matches!(pairwise_sq_euclidean(empty.view()), Err(FaceSpaceError::Dimension(_))));
        assert!(matches!(covariance(empty.view()), Err(FaceSpaceError::Dimension(_))));
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        match from_rows(&rows) {
            Err(FaceSpaceError::Dimension(msg)) => assert!(msg.contains("row 1")),
            other => panic!("expected a ragged-row error, got {:?}", other),
        }
        assert!(from_rows(&[]).is_err());
        assert_eq!(from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(), array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_gram_matrix_linear_is_xtx() {
        let x = array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]];
        let g = gram_matrix_linear(x.view()).unwrap();
        assert_eq!(g.dim(), (3, 3));
        assert_abs_diff_eq!(g, x.t().dot(&x), epsilon = 1e-12);
    }

    #[test]
    fn test_pairwise_sq_euclidean() {
        let x = array![[0.0, 0.0], [3.0, 4.0], [1.0, 1.0]];
        let d = pairwise_sq_euclidean(x.view()).unwrap();
        assert_abs_diff_eq!(
            d,
            array![[0.0, 25.0, 2.0], [25.0, 0.0, 13.0], [2.0, 13.0, 0.0]],
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cross_sq_euclidean_width_mismatch() {
        let a = array![[0.0, 0.0]];
        let b = array![[0.0, 0.0, 0.0]];
        assert!(matches!(cross_sq_euclidean(a.view(), b.view()), Err(FaceSpaceError::Dimension(_))));
    }

    #[test]
    fn test_is_symmetric_uses_relative_tolerance() {
        let big = array![[1.0e8, 2.0e7], [2.0e7 + 0.1, 3.0e8]];
        assert!(is_symmetric(big.view(), 1e-8));
        let skewed = array![[1.0, 2.0], [2.5, 1.0]];
        assert!(!is_symmetric(skewed.view(), 1e-8));
        let rect = array![[1.0, 2.0, 3.0]];
        assert!(!is_symmetric(rect.view(), 1e-8));
    }
}
