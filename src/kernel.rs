// src/kernel.rs

//! Kernel functions and kernel-matrix centering for kernel PCA.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{FaceSpaceError, Result};
use crate::matrix;

/// RBF bandwidth used by the face pipeline unless configured otherwise.
pub const DEFAULT_RBF_GAMMA: f64 = 1e-5;

/// Kernel function together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    /// `k(a, b) = a . b`
    Linear,
    /// `k(a, b) = exp(-gamma * |a - b|^2)`
    Rbf { gamma: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Rbf {
            gamma: DEFAULT_RBF_GAMMA,
        }
    }
}

impl Kernel {
    /// RBF kernel with the given bandwidth.
    pub fn rbf(gamma: f64) -> Result<Self> {
        let kernel = Kernel::Rbf { gamma };
        kernel.validate()?;
        Ok(kernel)
    }

    /// Checks kernel parameters. `gamma` must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Kernel::Linear => Ok(()),
            Kernel::Rbf { gamma } if gamma.is_finite() && gamma > 0.0 => Ok(()),
            Kernel::Rbf { gamma } => Err(FaceSpaceError::InvalidParameter(format!(
                "RBF gamma must be finite and positive, got {}",
                gamma
            ))),
        }
    }

    /// Raw (uncentered) Gram matrix between the rows of `points`.
    pub fn gram(&self, points: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.validate()?;
        match *self {
            Kernel::Linear => {
                // X X^T is the feature-axis Gram matrix of X^T
                matrix::gram_matrix_linear(points.t())
            }
            Kernel::Rbf { gamma } => {
                let mut k = matrix::pairwise_sq_euclidean(points)?;
                k.mapv_inplace(|d| (-gamma * d).exp());
                Ok(k)
            }
        }
    }

    /// Kernel values between every row of `a` and every row of `b`.
    pub fn cross(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.validate()?;
        match *self {
            Kernel::Linear => {
                matrix::ensure_non_empty(a, "left operand")?;
                matrix::ensure_non_empty(b, "right operand")?;
                if a.ncols() != b.ncols() {
                    return Err(FaceSpaceError::Dimension(format!(
                        "kernel operands have widths {} and {}",
                        a.ncols(),
                        b.ncols()
                    )));
                }
                Ok(a.dot(&b.t()))
            }
            Kernel::Rbf { gamma } => {
                let mut k = matrix::cross_sq_euclidean(a, b)?;
                k.mapv_inplace(|d| (-gamma * d).exp());
                Ok(k)
            }
        }
    }
}

/// Double-centers a Gram matrix: `K - 1n K - K 1n + 1n K 1n`, with `1n` the N x N
/// matrix whose entries are all `1/N`.
///
/// Evaluated through row, column and grand means, which gives the same matrix
/// in O(N^2) instead of three O(N^3) products.
///
/// # Errors
/// `Dimension` if `k` is empty or not square.
pub fn center_kernel(k: ArrayView2<f64>) -> Result<Array2<f64>> {
    if k.is_empty() || !k.is_square() {
        return Err(FaceSpaceError::Dimension(format!(
            "kernel centering needs a non-empty square matrix, got {}x{}",
            k.nrows(),
            k.ncols()
        )));
    }
    let col_means = k.sum_axis(Axis(0)) / k.nrows() as f64;
    let row_means = k.sum_axis(Axis(1)) / k.ncols() as f64;
    let grand_mean = col_means.sum() / k.ncols() as f64;

    let mut centered = &k - &col_means.insert_axis(Axis(0));
    centered -= &row_means.insert_axis(Axis(1));
    centered += grand_mean;
    Ok(centered)
}

/// Centers an out-of-sample kernel block against the training kernel.
///
/// `k_test` is M x N (test rows against training rows) and `k_train` the raw
/// N x N training kernel. Computes `K_t - 1m K - K_t 1n + 1m K 1n`, where `1m`
/// is the M x N matrix of `1/N`.
pub fn center_cross_kernel(k_test: ArrayView2<f64>, k_train: ArrayView2<f64>) -> Result<Array2<f64>> {
    if k_train.is_empty() || !k_train.is_square() {
        return Err(FaceSpaceError::Dimension(format!(
            "training kernel must be a non-empty square matrix, got {}x{}",
            k_train.nrows(),
            k_train.ncols()
        )));
    }
    if k_test.ncols() != k_train.nrows() {
        return Err(FaceSpaceError::Dimension(format!(
            "test kernel has {} columns but the training kernel covers {} samples",
            k_test.ncols(),
            k_train.nrows()
        )));
    }
    let n = k_train.nrows() as f64;
    let train_col_means = k_train.sum_axis(Axis(0)) / n;
    let train_grand_mean = train_col_means.sum() / n;
    let test_row_means = k_test.sum_axis(Axis(1)) / n;

    let mut centered = &k_test - &train_col_means.insert_axis(Axis(0));
    centered -= &test_row_means.insert_axis(Axis(1));
    centered += train_grand_mean;
    Ok(centered)
}
