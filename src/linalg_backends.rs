// src/linalg_backends.rs

use ndarray::{Array1, Array2};
use ndarray_linalg::{Eigh as NdLinalgEigh, UPLO};
use std::marker::PhantomData;

use crate::error::{FaceSpaceError, Result};

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<F: 'static> {
    /// Eigenvalues in the order the backend produced them (ascending for LAPACK).
    pub eigenvalues: Array1<F>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<F>,
}

/// Trait for symmetric eigendecomposition (LAPACK `?syevd`).
/// Implementers only read the upper triangle of `matrix`.
pub trait BackendEigh<F: 'static + Copy> {
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>>;
}

/// ndarray-linalg (LAPACK) backend. The BLAS/LAPACK provider is picked by the
/// `backend_*` Cargo features.
#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

impl BackendEigh<f64> for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>> {
        if !matrix.is_square() {
            return Err(FaceSpaceError::Dimension(format!(
                "eigendecomposition needs a square matrix, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.is_empty() {
            return Ok(EighOutput {
                eigenvalues: Array1::zeros(0),
                eigenvectors: Array2::zeros((0, 0)),
            });
        }
        let (eigenvalues, eigenvectors) = matrix
            .eigh(UPLO::Upper)
            .map_err(|e| FaceSpaceError::Decomposition(e.to_string()))?;
        Ok(EighOutput {
            eigenvalues,
            eigenvectors,
        })
    }
}

/// Dispatches to the compiled-in linear algebra backend.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<F> BackendEigh<F> for LinAlgBackendProvider<F>
where
    F: 'static + Copy,
    NdarrayLinAlgBackend: BackendEigh<F>,
{
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>> {
        NdarrayLinAlgBackend.eigh_upper(matrix)
    }
}
