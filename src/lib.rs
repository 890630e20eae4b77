// Eigenface recognition with PCA and kernel PCA

#![doc = include_str!("../README.md")]

pub mod classifier;
pub mod dataset;
pub mod eigen;
pub mod error;
pub mod kernel;
pub mod linalg_backends;
pub mod matrix;
pub mod pipeline;
pub mod projection;
pub mod subspace;
pub mod visualization;

#[cfg(test)]
mod subspace_tests;

pub use classifier::{accuracy, classify, nearest_neighbors, Label, Neighbor};
pub use dataset::{load_directory, FeatureDimension, SampleSet};
pub use eigen::{top_k_eigenvectors, EigenBasis};
pub use error::{FaceSpaceError, Result, Stage, StageContext};
pub use kernel::{center_kernel, Kernel};
pub use pipeline::{FaceRecognizer, RecognitionConfig, RecognitionReport};
pub use projection::{project, reconstruct};
pub use subspace::{FittedSubspace, KernelAxis, SubspaceExtractor, SubspaceMethod};
