// src/classifier.rs

//! 1-nearest-neighbor matching in the reduced space.

use log::trace;
use ndarray::ArrayView2;

use crate::error::{FaceSpaceError, Result};

/// Identity label attached to every sample.
pub type Label = u32;

/// Closest training sample for one query row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index into the training set.
    pub index: usize,
    pub label: Label,
    /// Euclidean distance in the reduced space.
    pub distance: f64,
}

/// Finds the nearest training row for every test row.
///
/// Distances are plain Euclidean. On ties the earliest training row wins, so
/// the result only depends on the training order.
///
/// # Errors
/// `Dimension` if the training set is empty, the label count differs from
/// the number of training rows, or the reduced widths differ.
pub fn nearest_neighbors(
    train_reduced: ArrayView2<f64>,
    test_reduced: ArrayView2<f64>,
    train_labels: &[Label],
) -> Result<Vec<Neighbor>> {
    if train_reduced.nrows() == 0 {
        return Err(FaceSpaceError::Dimension("training set is empty".to_string()));
    }
    if train_labels.len() != train_reduced.nrows() {
        return Err(FaceSpaceError::Dimension(format!(
            "{} training labels for {} training rows",
            train_labels.len(),
            train_reduced.nrows()
        )));
    }
    if train_reduced.ncols() != test_reduced.ncols() {
        return Err(FaceSpaceError::Dimension(format!(
            "training rows have {} components, test rows have {}",
            train_reduced.ncols(),
            test_reduced.ncols()
        )));
    }

    let neighbors = test_reduced
        .rows()
        .into_iter()
        .map(|test_row| {
            let mut best = Neighbor {
                index: 0,
                label: train_labels[0],
                distance: f64::INFINITY,
            };
            for (idx, train_row) in train_reduced.rows().into_iter().enumerate() {
                let sq: f64 = test_row
                    .iter()
                    .zip(train_row.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                let distance = sq.sqrt();
                if distance < best.distance {
                    best = Neighbor {
                        index: idx,
                        label: train_labels[idx],
                        distance,
                    };
                }
            }
            trace!("Nearest training row {} (label {}) at {:.4}", best.index, best.label, best.distance);
            best
        })
        .collect();
    Ok(neighbors)
}

/// Assigns each test row the label of its nearest training row.
pub fn classify(
    train_reduced: ArrayView2<f64>,
    test_reduced: ArrayView2<f64>,
    train_labels: &[Label],
) -> Result<Vec<Label>> {
    Ok(nearest_neighbors(train_reduced, test_reduced, train_labels)?
        .into_iter()
        .map(|n| n.label)
        .collect())
}

/// Fraction of predictions that exactly match the expected labels.
///
/// # Errors
/// `Dimension` if the lengths differ or both are empty.
pub fn accuracy(predicted: &[Label], actual: &[Label]) -> Result<f64> {
    if predicted.len() != actual.len() {
        return Err(FaceSpaceError::Dimension(format!(
            "{} predictions for {} expected labels",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(FaceSpaceError::Dimension(
            "accuracy of an empty prediction set is undefined".to_string(),
        ));
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(correct as f64 / actual.len() as f64)
}
