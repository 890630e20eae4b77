// src/pipeline.rs

//! End-to-end recognition: fit on a training set, match a testing set.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::classifier::{accuracy, nearest_neighbors, Label};
use crate::dataset::{self, FeatureDimension, SampleSet};
use crate::error::{FaceSpaceError, Result, Stage, StageContext};
use crate::projection;
use crate::subspace::{FittedSubspace, SubspaceExtractor, SubspaceMethod, DEFAULT_N_COMPONENTS};
use crate::visualization;

/// Parameters of a recognition run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Retained-component count (k).
    pub n_components: usize,
    pub method: SubspaceMethod,
    /// Size every image is resized to before flattening.
    pub dimension: FeatureDimension,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            n_components: DEFAULT_N_COMPONENTS,
            method: SubspaceMethod::Pca,
            dimension: FeatureDimension::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(FaceSpaceError::InvalidParameter(
                "n_components must be at least 1".to_string(),
            ));
        }
        self.dimension.validate()?;
        self.method.validate()
    }

    /// Reads a JSON configuration; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn extractor(&self) -> SubspaceExtractor {
        SubspaceExtractor::new(self.method, self.n_components)
    }
}

/// Outcome of matching a testing set.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionReport {
    pub method: String,
    pub n_components: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub predictions: Vec<Label>,
    pub expected: Vec<Label>,
    pub accuracy: f64,
    /// Mean squared reconstruction error of the training images, when the
    /// subspace has a feature-space basis.
    pub train_reconstruction_error: Option<f64>,
}

/// A subspace fitted on a training set plus the training set's reduced coordinates.
#[derive(Debug, Clone)]
pub struct FaceRecognizer {
    config: RecognitionConfig,
    subspace: FittedSubspace,
    train_reduced: Array2<f64>,
    train_labels: Vec<Label>,
    dimension: FeatureDimension,
}

impl FaceRecognizer {
    /// Fits the subspace on `train` and projects the training images into it.
    pub fn fit(config: RecognitionConfig, train: &SampleSet) -> Result<Self> {
        config.validate().stage(Stage::Fit)?;
        if train.dimension() != config.dimension {
            warn!(
                "Training images are {}x{} but the configuration asks for {}x{}; using the images' size.",
                train.dimension().width,
                train.dimension().height,
                config.dimension.width,
                config.dimension.height
            );
        }
        let subspace = config.extractor().fit(train.data()).stage(Stage::Fit)?;
        let train_reduced = subspace.transform(train.data()).stage(Stage::ProjectTraining)?;
        debug!("Training representation: {:?}", train_reduced.dim());
        Ok(Self {
            config,
            subspace,
            train_reduced,
            train_labels: train.labels().to_vec(),
            dimension: train.dimension(),
        })
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn subspace(&self) -> &FittedSubspace {
        &self.subspace
    }

    pub fn training_reduced(&self) -> ArrayView2<f64> {
        self.train_reduced.view()
    }

    /// Reconstructs the training images from their reduced coordinates.
    pub fn reconstruct_training(&self) -> Result<Array2<f64>> {
        self.subspace
            .reconstruct(self.train_reduced.view())
            .stage(Stage::Reconstruct)
    }

    /// Predicts a label for every image of `test`.
    pub fn predict(&self, test: &SampleSet) -> Result<Vec<Label>> {
        if test.dimension() != self.dimension {
            return Err(FaceSpaceError::Dimension(format!(
                "testing images are {}x{} but the model was fitted on {}x{}",
                test.dimension().width,
                test.dimension().height,
                self.dimension.width,
                self.dimension.height
            ))
            .at(Stage::ProjectTesting));
        }
        let test_reduced = self
            .subspace
            .transform(test.data())
            .stage(Stage::ProjectTesting)?;
        let neighbors = nearest_neighbors(self.train_reduced.view(), test_reduced.view(), &self.train_labels)
            .stage(Stage::Classify)?;
        for (name, n) in test.identifiers().iter().zip(&neighbors) {
            debug!(
                "{} -> label {} (training row {}, distance {:.3})",
                name, n.label, n.index, n.distance
            );
        }
        Ok(neighbors.into_iter().map(|n| n.label).collect())
    }

    /// Predicts `test` and scores the predictions against its labels.
    pub fn evaluate(&self, test: &SampleSet) -> Result<RecognitionReport> {
        let predictions = self.predict(test)?;
        let acc = accuracy(&predictions, test.labels()).stage(Stage::Classify)?;
        info!(
            "Accuracy of {} = {:.4} ({} testing images).",
            self.config.method,
            acc,
            test.len()
        );
        Ok(RecognitionReport {
            method: self.config.method.to_string(),
            n_components: self.subspace.n_components(),
            n_train: self.train_labels.len(),
            n_test: test.len(),
            predictions,
            expected: test.labels().to_vec(),
            accuracy: acc,
            train_reconstruction_error: None,
        })
    }
}

/// Loads both directories, fits, optionally writes reconstructions and
/// eigenfaces to `output`, and evaluates on the testing directory.
pub fn run(
    config: RecognitionConfig,
    train_dir: &Path,
    test_dir: &Path,
    output: Option<&Path>,
) -> Result<RecognitionReport> {
    let start = Instant::now();
    let train = dataset::load_directory(train_dir, config.dimension).stage(Stage::LoadTraining)?;
    let recognizer = FaceRecognizer::fit(config, &train)?;

    let mut train_reconstruction_error = None;
    if recognizer.subspace().basis().is_some() {
        let reconstruction = recognizer.reconstruct_training()?;
        let err = projection::reconstruction_error(train.data(), reconstruction.view())
            .stage(Stage::Reconstruct)?;
        info!("Training reconstruction MSE: {:.3}", err);
        train_reconstruction_error = Some(err);

        if let (Some(dir), Some(basis)) = (output, recognizer.subspace().basis()) {
            visualization::save_reconstructions(dir, train.identifiers(), reconstruction.view(), train.dimension())
                .stage(Stage::Visualize)?;
            visualization::save_eigenfaces(dir, basis.vectors.view(), train.dimension())
                .stage(Stage::Visualize)?;
        }
    } else if output.is_some() {
        warn!("{} has no feature-space basis; skipping image output.", config.method);
    }

    let test = dataset::load_directory(test_dir, config.dimension).stage(Stage::LoadTesting)?;
    let mut report = recognizer.evaluate(&test)?;
    report.train_reconstruction_error = train_reconstruction_error;
    info!("Finished in {:?}", start.elapsed());
    Ok(report)
}
