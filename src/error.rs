// src/error.rs

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FaceSpaceError>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadTraining,
    Fit,
    ProjectTraining,
    Reconstruct,
    Visualize,
    LoadTesting,
    ProjectTesting,
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadTraining => "loading training images",
            Stage::Fit => "fitting the subspace",
            Stage::ProjectTraining => "projecting training images",
            Stage::Reconstruct => "reconstructing training images",
            Stage::Visualize => "writing images",
            Stage::LoadTesting => "loading testing images",
            Stage::ProjectTesting => "projecting testing images",
            Stage::Classify => "classifying testing images",
        };
        f.write_str(name)
    }
}

/// Errors produced by the eigenface engine and its loaders.
#[derive(Debug, thiserror::Error)]
pub enum FaceSpaceError {
    /// Mismatched, empty or ragged array shapes.
    #[error("Dimension error: {0}")]
    Dimension(String),

    /// The decomposer was given a matrix that is not symmetric within tolerance.
    #[error("Matrix is not symmetric: max |S_ij - S_ji| = {max_asymmetry:e} exceeds tolerance {tolerance:e}")]
    NotSymmetric { max_asymmetry: f64, tolerance: f64 },

    /// A parameter is out of range (component count, kernel bandwidth, method name, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The LAPACK eigensolver reported a failure.
    #[error("Eigendecomposition failed: {0}")]
    Decomposition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A failure annotated with the pipeline stage it happened in.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<FaceSpaceError>,
    },
}

impl FaceSpaceError {
    /// Wraps `self` with the stage it occurred in. Already tagged errors keep their original stage.
    pub fn at(self, stage: Stage) -> Self {
        match self {
            tagged @ FaceSpaceError::Stage { .. } => tagged,
            other => FaceSpaceError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Stage the error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            FaceSpaceError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Extension for tagging a `Result` with the stage that produced it.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.at(stage))
    }
}
