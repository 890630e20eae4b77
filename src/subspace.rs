// src/subspace.rs

//! Eigen-subspace extraction: PCA and kernel PCA.
//!
//! Three routes produce a basis that plugs into [`crate::projection`]:
//!
//! - **PCA**: eigendecomposition of the D x D feature covariance.
//! - **Kernel PCA, feature axis**: the kernel is evaluated between feature
//!   columns, giving a D x D Gram matrix that is double-centered and
//!   decomposed. The eigenvectors live in feature space, so projection and
//!   reconstruction work exactly as for PCA.
//! - **Kernel PCA, sample axis**: the textbook formulation. The N x N kernel
//!   between training samples is centered and decomposed; new samples are
//!   projected through their kernel values against the training set. There is
//!   no explicit feature-space basis, so this route cannot reconstruct.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::eigen::{top_k_eigenvectors, EigenBasis, EIGENVALUE_FLOOR};
use crate::error::{FaceSpaceError, Result};
use crate::kernel::{center_cross_kernel, center_kernel, Kernel, DEFAULT_RBF_GAMMA};
use crate::matrix;
use crate::projection;

/// Retained-component count used by the face pipeline.
pub const DEFAULT_N_COMPONENTS: usize = 25;

/// Which axis the kernel is evaluated over.
///
/// `Features` treats every pixel column as a point and keeps the Gram matrix
/// at D x D. This departs from standard kernel PCA but yields a feature-space
/// basis usable by the ordinary projector. `Samples` is the standard
/// N x N formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelAxis {
    #[default]
    Features,
    Samples,
}

impl FromStr for KernelAxis {
    type Err = FaceSpaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "features" | "feature" => Ok(KernelAxis::Features),
            "samples" | "sample" => Ok(KernelAxis::Samples),
            other => Err(FaceSpaceError::InvalidParameter(format!(
                "unknown kernel axis '{}', expected 'features' or 'samples'",
                other
            ))),
        }
    }
}

/// How the subspace is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SubspaceMethod {
    Pca,
    KernelPca {
        kernel: Kernel,
        #[serde(default)]
        axis: KernelAxis,
    },
}

impl Default for SubspaceMethod {
    fn default() -> Self {
        SubspaceMethod::Pca
    }
}

impl SubspaceMethod {
    /// Feature-axis kernel PCA with `kernel`.
    pub fn kernel(kernel: Kernel) -> Self {
        SubspaceMethod::KernelPca {
            kernel,
            axis: KernelAxis::Features,
        }
    }

    /// Same method with the kernel evaluated over `axis`. PCA is returned unchanged.
    pub fn with_axis(self, axis: KernelAxis) -> Self {
        match self {
            SubspaceMethod::Pca => SubspaceMethod::Pca,
            SubspaceMethod::KernelPca { kernel, .. } => SubspaceMethod::KernelPca { kernel, axis },
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SubspaceMethod::Pca => Ok(()),
            SubspaceMethod::KernelPca { kernel, .. } => kernel.validate(),
        }
    }
}

impl FromStr for SubspaceMethod {
    type Err = FaceSpaceError;

    /// Parses `pca`, `linear` or `rbf`. Kernel methods use the feature axis and
    /// the default RBF bandwidth.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pca" => Ok(SubspaceMethod::Pca),
            "linear" => Ok(SubspaceMethod::kernel(Kernel::Linear)),
            "rbf" => Ok(SubspaceMethod::kernel(Kernel::Rbf {
                gamma: DEFAULT_RBF_GAMMA,
            })),
            other => Err(FaceSpaceError::InvalidParameter(format!(
                "unknown method '{}', expected 'pca', 'linear' or 'rbf'",
                other
            ))),
        }
    }
}

impl fmt::Display for SubspaceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubspaceMethod::Pca => write!(f, "PCA"),
            SubspaceMethod::KernelPca { kernel, axis } => {
                let axis = match axis {
                    KernelAxis::Features => "feature axis",
                    KernelAxis::Samples => "sample axis",
                };
                match kernel {
                    Kernel::Linear => write!(f, "kernel PCA (linear, {})", axis),
                    Kernel::Rbf { gamma } => write!(f, "kernel PCA (rbf, gamma={:e}, {})", gamma, axis),
                }
            }
        }
    }
}

/// Sample-axis kernel PCA model.
///
/// Keeps the training rows and their raw kernel so new samples can be
/// centered against the training distribution.
#[derive(Debug, Clone)]
pub struct KernelSubspace {
    kernel: Kernel,
    training_samples: Array2<f64>,
    training_kernel: Array2<f64>,
    /// Eigenvectors of the centered kernel scaled by `1 / sqrt(lambda)`. Shape (N, k).
    dual_coefficients: Array2<f64>,
    eigen: EigenBasis,
}

impl KernelSubspace {
    fn fit(x: ArrayView2<f64>, kernel: Kernel, n_components: usize) -> Result<Self> {
        let training_kernel = kernel.gram(x)?;
        let centered = center_kernel(training_kernel.view())?;
        let eigen = top_k_eigenvectors(centered.view(), n_components)?;

        let mut dual_coefficients = eigen.vectors.clone();
        for (i, (mut column, &lambda)) in dual_coefficients
            .columns_mut()
            .into_iter()
            .zip(eigen.values.iter())
            .enumerate()
        {
            if lambda <= EIGENVALUE_FLOOR {
                return Err(FaceSpaceError::InvalidParameter(format!(
                    "component {} has eigenvalue {:e}; the centered kernel has rank below {}",
                    i, lambda, n_components
                )));
            }
            column /= lambda.sqrt();
        }

        Ok(Self {
            kernel,
            training_samples: x.to_owned(),
            training_kernel,
            dual_coefficients,
            eigen,
        })
    }

    /// Kernel PCA scores of `x`, shape (M, k).
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.training_samples.ncols() {
            return Err(FaceSpaceError::Dimension(format!(
                "samples have {} features but the model was fitted on {}",
                x.ncols(),
                self.training_samples.ncols()
            )));
        }
        if x.nrows() == 0 {
            return Ok(Array2::zeros((0, self.dual_coefficients.ncols())));
        }
        let k_cross = self.kernel.cross(x, self.training_samples.view())?;
        let centered = center_cross_kernel(k_cross.view(), self.training_kernel.view())?;
        Ok(centered.dot(&self.dual_coefficients))
    }

    pub fn eigen(&self) -> &EigenBasis {
        &self.eigen
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }
}

/// A fitted subspace, ready to project train and test samples alike.
#[derive(Debug, Clone)]
pub enum FittedSubspace {
    /// Explicit D x k basis (PCA and feature-axis kernel PCA).
    Primal(EigenBasis),
    /// Sample-axis kernel PCA.
    Dual(KernelSubspace),
}

impl FittedSubspace {
    /// Reduced representation of `x`, shape (N, k).
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedSubspace::Primal(basis) => projection::project(x, basis.vectors.view()),
            FittedSubspace::Dual(model) => model.transform(x),
        }
    }

    /// Approximate feature-space reconstruction of reduced data, shape (N, D).
    ///
    /// # Errors
    /// `InvalidParameter` for sample-axis kernel PCA, which has no explicit basis.
    pub fn reconstruct(&self, z: ArrayView2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedSubspace::Primal(basis) => projection::reconstruct(z, basis.vectors.view()),
            FittedSubspace::Dual(_) => Err(FaceSpaceError::InvalidParameter(
                "sample-axis kernel PCA has no feature-space basis to reconstruct from".to_string(),
            )),
        }
    }

    /// Feature-space basis, if this subspace has one.
    pub fn basis(&self) -> Option<&EigenBasis> {
        match self {
            FittedSubspace::Primal(basis) => Some(basis),
            FittedSubspace::Dual(_) => None,
        }
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        match self {
            FittedSubspace::Primal(basis) => &basis.values,
            FittedSubspace::Dual(model) => &model.eigen.values,
        }
    }

    pub fn n_components(&self) -> usize {
        self.eigenvalues().len()
    }

    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        match self {
            FittedSubspace::Primal(basis) => basis.explained_variance_ratio(),
            FittedSubspace::Dual(model) => model.eigen.explained_variance_ratio(),
        }
    }
}

/// Fits an eigen-subspace with a fixed method and component count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubspaceExtractor {
    method: SubspaceMethod,
    n_components: usize,
}

impl Default for SubspaceExtractor {
    fn default() -> Self {
        Self::new(SubspaceMethod::Pca, DEFAULT_N_COMPONENTS)
    }
}

impl SubspaceExtractor {
    pub fn new(method: SubspaceMethod, n_components: usize) -> Self {
        Self {
            method,
            n_components,
        }
    }

    pub fn method(&self) -> SubspaceMethod {
        self.method
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Fits the subspace to an N x D sample matrix.
    ///
    /// # Errors
    /// - `Dimension` for an empty sample matrix (or N < 2 for PCA).
    /// - `InvalidParameter` if `n_components` is 0 or exceeds the size of the
    ///   decomposed matrix, or the kernel parameters are invalid.
    /// - `NotSymmetric` / `Decomposition` from the eigensolver.
    pub fn fit(&self, x: ArrayView2<f64>) -> Result<FittedSubspace> {
        matrix::ensure_non_empty(x, "training sample matrix")?;
        self.method.validate()?;
        if self.n_components == 0 {
            return Err(FaceSpaceError::InvalidParameter(
                "number of components must be at least 1".to_string(),
            ));
        }

        let (n_samples, n_features) = x.dim();
        info!(
            "Fitting {} with {} components on {} samples x {} features.",
            self.method, self.n_components, n_samples, n_features
        );
        let start = Instant::now();

        let fitted = match self.method {
            SubspaceMethod::Pca => {
                let cov = matrix::covariance(x)?;
                debug!("Covariance matrix: {:?}", cov.dim());
                FittedSubspace::Primal(top_k_eigenvectors(cov.view(), self.n_components)?)
            }
            SubspaceMethod::KernelPca {
                kernel,
                axis: KernelAxis::Features,
            } => {
                let gram = match kernel {
                    Kernel::Linear => matrix::gram_matrix_linear(x)?,
                    Kernel::Rbf { .. } => kernel.gram(x.t())?,
                };
                let centered = center_kernel(gram.view())?;
                debug!("Centered feature-axis kernel: {:?}", centered.dim());
                FittedSubspace::Primal(top_k_eigenvectors(centered.view(), self.n_components)?)
            }
            SubspaceMethod::KernelPca {
                kernel,
                axis: KernelAxis::Samples,
            } => FittedSubspace::Dual(KernelSubspace::fit(x, kernel, self.n_components)?),
        };

        let ratio = fitted.explained_variance_ratio();
        info!(
            "Extracted {} components in {:?}; they carry {:.2}% of the eigenvalue mass.",
            fitted.n_components(),
            start.elapsed(),
            100.0 * ratio.sum()
        );
        debug!(
            "Leading explained-variance ratios: {:?}",
            ratio.iter().take(5).collect::<Vec<_>>()
        );
        Ok(fitted)
    }

    /// Fits and returns the reduced training representation alongside the model.
    pub fn fit_transform(&self, x: ArrayView2<f64>) -> Result<(FittedSubspace, Array2<f64>)> {
        let fitted = self.fit(x)?;
        let reduced = fitted.transform(x)?;
        Ok((fitted, reduced))
    }
}
