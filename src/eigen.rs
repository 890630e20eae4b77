// src/eigen.rs

//! Top-k eigenpairs of a symmetric matrix.

use log::{debug, trace, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{FaceSpaceError, Result};
use crate::linalg_backends::{BackendEigh, LinAlgBackendProvider};
use crate::matrix;

/// Relative tolerance used to decide whether a matrix is symmetric.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Eigenvalues below this are treated as numerically zero.
pub const EIGENVALUE_FLOOR: f64 = 1e-12;

/// An orthonormal basis together with the eigenvalues of its columns.
///
/// `vectors` has shape (M, k); column `i` belongs to `values[i]` and the
/// values are non-increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenBasis {
    pub vectors: Array2<f64>,
    pub values: Array1<f64>,
    /// Sum of all M eigenvalues of the decomposed matrix (its trace).
    pub total_variance: f64,
}

impl EigenBasis {
    /// Row dimension of the basis (M).
    pub fn dim(&self) -> usize {
        self.vectors.nrows()
    }

    /// Number of retained components (k).
    pub fn n_components(&self) -> usize {
        self.vectors.ncols()
    }

    /// Share of the total eigenvalue mass carried by each retained component.
    /// All zeros when the decomposed matrix has a non-positive trace.
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        if self.total_variance > EIGENVALUE_FLOOR {
            self.values.mapv(|v| v / self.total_variance)
        } else {
            Array1::zeros(self.values.len())
        }
    }
}

/// Returns the eigenvectors of the `k` largest eigenvalues of the symmetric matrix `s`.
///
/// Eigenvalues are sorted in descending order; equal eigenvalues keep whatever
/// relative order the sort leaves them in, which is not guaranteed.
///
/// # Errors
/// - `Dimension` if `s` is empty or not square.
/// - `NotSymmetric` if `|S_ij - S_ji| > 1e-8 * max(1, max|S|)` for some pair.
/// - `InvalidParameter` unless `1 <= k <= M`.
/// - `Decomposition` if LAPACK fails.
pub fn top_k_eigenvectors(s: ArrayView2<f64>, k: usize) -> Result<EigenBasis> {
    if s.is_empty() || !s.is_square() {
        return Err(FaceSpaceError::Dimension(format!(
            "expected a non-empty square matrix, got {}x{}",
            s.nrows(),
            s.ncols()
        )));
    }
    let m = s.nrows();
    if k == 0 || k > m {
        return Err(FaceSpaceError::InvalidParameter(format!(
            "number of components k = {} must satisfy 1 <= k <= {}",
            k, m
        )));
    }
    let tolerance = SYMMETRY_TOLERANCE * matrix::magnitude(s);
    let asym = matrix::max_asymmetry(s).unwrap_or(f64::INFINITY);
    if asym > tolerance {
        return Err(FaceSpaceError::NotSymmetric {
            max_asymmetry: asym,
            tolerance,
        });
    }
    if s.iter().any(|v| !v.is_finite()) {
        return Err(FaceSpaceError::InvalidParameter(
            "matrix contains non-finite entries".to_string(),
        ));
    }

    debug!("Decomposing {}x{} symmetric matrix for top {} eigenpairs.", m, m, k);
    let backend = LinAlgBackendProvider::<f64>::new();
    let eig = backend.eigh_upper(&s.to_owned())?;

    // Sort descending by eigenvalue
    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);

    let total_variance = eig.eigenvalues.sum();
    let values = eig.eigenvalues.select(Axis(0), &order);
    let vectors = eig.eigenvectors.select(Axis(1), &order);

    if let Some(&smallest) = values.get(k - 1) {
        if smallest <= EIGENVALUE_FLOOR {
            warn!(
                "Component {} has eigenvalue {:e}; the matrix has rank below the requested k = {}.",
                k - 1,
                smallest,
                k
            );
        }
    }
    trace!("Leading eigenvalues: {:?}", values.iter().take(5).collect::<Vec<_>>());

    Ok(EigenBasis {
        vectors,
        values,
        total_variance,
    })
}
