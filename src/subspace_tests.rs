// src/subspace_tests.rs
#![cfg(test)]

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::FaceSpaceError;
use crate::kernel::{center_kernel, Kernel, DEFAULT_RBF_GAMMA};
use crate::matrix;
use crate::projection::{project, reconstruct, reconstruction_error};
use crate::subspace::*;

/// N x D Gaussian samples; column j has standard deviation `j + 1` so the
/// covariance spectrum is well separated.
fn generate_scaled_data(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    Array2::from_shape_fn((n_samples, n_features), |(_, j)| {
        normal.sample(&mut rng) * (j + 1) as f64 + 3.0
    })
}

/// Removes row and column means so every row and every column sums to zero.
fn double_center(x: &Array2<f64>) -> Array2<f64> {
    let row_means = x.mean_axis(Axis(1)).unwrap();
    let col_means = x.mean_axis(Axis(0)).unwrap();
    let grand = x.mean().unwrap();
    let mut out = x - &row_means.insert_axis(Axis(1));
    out -= &col_means.insert_axis(Axis(0));
    out += grand;
    out
}

/// Average ranks (0-based); ties share the mean of their positions.
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap());
    let mut out = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let avg_rank = (start + end - 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            out[idx] = avg_rank;
        }
        start = end;
    }
    out
}

/// Spearman rank correlation of two equally long sequences.
fn rank_correlation(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "sequences differ in length");
    assert!(a.len() >= 2, "rank correlation needs at least two values");
    let ra = Array1::from(ranks(a));
    let rb = Array1::from(ranks(b));
    let ra = &ra - ra.mean().unwrap();
    let rb = &rb - rb.mean().unwrap();
    let denom = (ra.dot(&ra) * rb.dot(&rb)).sqrt();
    if denom <= 0.0 {
        return 0.0;
    }
    ra.dot(&rb) / denom
}

/// Upper-triangle pairwise Euclidean distances between rows.
fn condensed_distances(x: &Array2<f64>) -> Vec<f64> {
    let sq = matrix::pairwise_sq_euclidean(x.view()).unwrap();
    let mut out = Vec::new();
    for (i, row) in sq.axis_iter(Axis(0)).enumerate() {
        out.extend(row.iter().skip(i + 1).map(|d| d.sqrt()));
    }
    out
}

fn linear_kernel_pca(axis: KernelAxis) -> SubspaceMethod {
    SubspaceMethod::kernel(Kernel::Linear).with_axis(axis)
}

#[cfg(test)]
mod symmetry_and_ordering {
    use super::*;

    #[test]
    fn test_covariance_and_centered_gram_are_symmetric() {
        let x = generate_scaled_data(12, 6, 7);
        let cov = matrix::covariance(x.view()).unwrap();
        assert!(matrix::is_symmetric(cov.view(), 1e-8));

        let gram = matrix::gram_matrix_linear(x.view()).unwrap();
        let centered = center_kernel(gram.view()).unwrap();
        assert!(matrix::max_asymmetry(centered.view()).unwrap() <= 1e-8 * matrix::magnitude(centered.view()));
    }

    #[test]
    fn test_pca_eigenvalues_descending() {
        let x = generate_scaled_data(40, 5, 11);
        let fitted = SubspaceExtractor::new(SubspaceMethod::Pca, 5).fit(x.view()).unwrap();
        let values = fitted.eigenvalues();
        for pair in values.as_slice().unwrap().windows(2) {
            assert!(pair[0] >= pair[1], "eigenvalues out of order: {:?}", values);
        }
        // full spectrum of the covariance is its trace
        assert_abs_diff_eq!(fitted.explained_variance_ratio().sum(), 1.0, epsilon = 1e-9);
    }
}

#[cfg(test)]
mod projection_properties {
    use super::*;

    #[test]
    fn test_projection_is_linear() {
        let x = generate_scaled_data(30, 6, 3);
        let fitted = SubspaceExtractor::new(SubspaceMethod::Pca, 3).fit(x.view()).unwrap();
        let basis = fitted.basis().unwrap().vectors.view();

        let a = generate_scaled_data(4, 6, 101);
        let b = generate_scaled_data(4, 6, 202);
        let (alpha, beta) = (2.5, -0.75);
        let combined = &a * alpha + &b * beta;

        let lhs = project(combined.view(), basis).unwrap();
        let rhs = project(a.view(), basis).unwrap() * alpha + project(b.view(), basis).unwrap() * beta;
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-9);
    }

    #[test]
    fn test_full_rank_round_trip() {
        let x = generate_scaled_data(20, 5, 5);
        let fitted = SubspaceExtractor::new(SubspaceMethod::Pca, 5).fit(x.view()).unwrap();
        let z = fitted.transform(x.view()).unwrap();
        let x_hat = fitted.reconstruct(z.view()).unwrap();
        assert_abs_diff_eq!(x_hat, x, epsilon = 1e-8);
        assert!(reconstruction_error(x.view(), x_hat.view()).unwrap() < 1e-16);
    }

    #[test]
    fn test_reconstruction_error_non_increasing_in_k() {
        let x = generate_scaled_data(25, 7, 9);
        let mut previous = f64::INFINITY;
        for k in 1..=7 {
            let fitted = SubspaceExtractor::new(SubspaceMethod::Pca, k).fit(x.view()).unwrap();
            let basis = fitted.basis().unwrap().vectors.view();
            let x_hat = reconstruct(project(x.view(), basis).unwrap().view(), basis).unwrap();
            let err = reconstruction_error(x.view(), x_hat.view()).unwrap();
            assert!(err <= previous + 1e-9, "k = {}: {} > {}", k, err, previous);
            previous = err;
        }
    }

    #[test]
    fn test_feature_axis_rbf_basis_is_orthonormal() {
        let x = generate_scaled_data(15, 6, 21);
        let method = SubspaceMethod::kernel(Kernel::rbf(0.05).unwrap());
        let fitted = SubspaceExtractor::new(method, 4).fit(x.view()).unwrap();
        let basis = &fitted.basis().unwrap().vectors;
        assert_eq!(basis.dim(), (6, 4));
        assert_abs_diff_eq!(basis.t().dot(basis), Array2::<f64>::eye(4), epsilon = 1e-9);
    }
}

#[cfg(test)]
mod kernel_pca_equivalence {
    use super::*;

    fn distance_correlation(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        rank_correlation(&condensed_distances(a), &condensed_distances(b))
    }

    #[test]
    fn test_sample_axis_linear_kernel_matches_pca_distances() {
        let x = generate_scaled_data(30, 8, 42);
        let (_, pca_scores) = SubspaceExtractor::new(SubspaceMethod::Pca, 3)
            .fit_transform(x.view())
            .unwrap();
        let (fitted, kpca_scores) = SubspaceExtractor::new(linear_kernel_pca(KernelAxis::Samples), 3)
            .fit_transform(x.view())
            .unwrap();
        assert!(matches!(fitted, FittedSubspace::Dual(_)));
        assert_eq!(kpca_scores.dim(), (30, 3));

        let rho = distance_correlation(&pca_scores, &kpca_scores);
        assert!(rho >= 0.95, "rank correlation {}", rho);
    }

    #[test]
    fn test_feature_axis_linear_kernel_matches_pca_on_doubly_centered_input() {
        let x = double_center(&generate_scaled_data(30, 8, 43));
        let (_, pca_scores) = SubspaceExtractor::new(SubspaceMethod::Pca, 3)
            .fit_transform(x.view())
            .unwrap();
        let (_, kpca_scores) = SubspaceExtractor::new(linear_kernel_pca(KernelAxis::Features), 3)
            .fit_transform(x.view())
            .unwrap();

        let rho = distance_correlation(&pca_scores, &kpca_scores);
        assert!(rho >= 0.95, "rank correlation {}", rho);
    }

    #[test]
    fn test_sample_axis_transform_of_training_rows_is_consistent() {
        let x = generate_scaled_data(20, 4, 8);
        let method = SubspaceMethod::kernel(Kernel::rbf(0.01).unwrap()).with_axis(KernelAxis::Samples);
        let (fitted, reduced) = SubspaceExtractor::new(method, 3).fit_transform(x.view()).unwrap();

        let again = fitted.transform(x.slice(ndarray::s![5..9, ..])).unwrap();
        assert_abs_diff_eq!(again, reduced.slice(ndarray::s![5..9, ..]).to_owned(), epsilon = 1e-10);

        // training scores are centered in kernel space
        let means: Array1<f64> = reduced.mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(means, Array1::<f64>::zeros(3), epsilon = 1e-9);
    }
}

#[cfg(test)]
mod errors {
    use super::*;

    #[test]
    fn test_sample_axis_cannot_reconstruct() {
        let x = generate_scaled_data(10, 3, 1);
        let (fitted, reduced) = SubspaceExtractor::new(linear_kernel_pca(KernelAxis::Samples), 2)
            .fit_transform(x.view())
            .unwrap();
        assert!(fitted.basis().is_none());
        assert!(matches!(
            fitted.reconstruct(reduced.view()),
            Err(FaceSpaceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sample_axis_rejects_rank_deficient_kernel() {
        let x = ndarray::array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0], [1.0, 3.0]];
        let result = SubspaceExtractor::new(linear_kernel_pca(KernelAxis::Samples), 3).fit(x.view());
        assert!(matches!(result, Err(FaceSpaceError::InvalidParameter(_))));
    }

    #[test]
    fn test_component_count_bounds() {
        let x = generate_scaled_data(10, 4, 2);
        assert!(matches!(
            SubspaceExtractor::new(SubspaceMethod::Pca, 0).fit(x.view()),
            Err(FaceSpaceError::InvalidParameter(_))
        ));
        assert!(matches!(
            SubspaceExtractor::new(SubspaceMethod::Pca, 5).fit(x.view()),
            Err(FaceSpaceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_empty_and_single_sample_inputs() {
        let empty = Array2::<f64>::zeros((0, 4));
        assert!(matches!(
            SubspaceExtractor::default().fit(empty.view()),
            Err(FaceSpaceError::Dimension(_))
        ));
        let single = Array2::<f64>::ones((1, 4));
        assert!(matches!(
            SubspaceExtractor::new(SubspaceMethod::Pca, 1).fit(single.view()),
            Err(FaceSpaceError::Dimension(_))
        ));
    }

    #[test]
    fn test_transform_width_mismatch() {
        let x = generate_scaled_data(10, 4, 3);
        let wrong = Array2::<f64>::zeros((2, 5));
        for method in [SubspaceMethod::Pca, linear_kernel_pca(KernelAxis::Samples)] {
            let fitted = SubspaceExtractor::new(method, 2).fit(x.view()).unwrap();
            assert!(matches!(fitted.transform(wrong.view()), Err(FaceSpaceError::Dimension(_))));
        }
    }

    #[test]
    fn test_invalid_gamma_rejected_at_fit() {
        let x = generate_scaled_data(10, 4, 4);
        let method = SubspaceMethod::kernel(Kernel::Rbf { gamma: -1.0 });
        assert!(matches!(
            SubspaceExtractor::new(method, 2).fit(x.view()),
            Err(FaceSpaceError::InvalidParameter(_))
        ));
    }
}

#[cfg(test)]
mod method_parsing {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("pca".parse::<SubspaceMethod>().unwrap(), SubspaceMethod::Pca);
        assert_eq!(
            " RBF ".parse::<SubspaceMethod>().unwrap(),
            SubspaceMethod::KernelPca {
                kernel: Kernel::Rbf {
                    gamma: DEFAULT_RBF_GAMMA
                },
                axis: KernelAxis::Features,
            }
        );
        assert_eq!(
            "linear".parse::<SubspaceMethod>().unwrap(),
            linear_kernel_pca(KernelAxis::Features)
        );
        assert!(matches!(
            "lda".parse::<SubspaceMethod>(),
            Err(FaceSpaceError::InvalidParameter(_))
        ));
        assert_eq!("samples".parse::<KernelAxis>().unwrap(), KernelAxis::Samples);
        assert!("rows".parse::<KernelAxis>().is_err());
    }

    #[test]
    fn test_with_axis_leaves_pca_unchanged() {
        assert_eq!(SubspaceMethod::Pca.with_axis(KernelAxis::Samples), SubspaceMethod::Pca);
    }

    #[test]
    fn test_method_serde() {
        let method = SubspaceMethod::kernel(Kernel::rbf(2e-5).unwrap()).with_axis(KernelAxis::Samples);
        let json = serde_json::to_string(&method).unwrap();
        assert_eq!(serde_json::from_str::<SubspaceMethod>(&json).unwrap(), method);

        let implicit_axis: SubspaceMethod =
            serde_json::from_str(r#"{"method":"kernel_pca","kernel":{"type":"linear"}}"#).unwrap();
        assert_eq!(implicit_axis, linear_kernel_pca(KernelAxis::Features));

        let pca: SubspaceMethod = serde_json::from_str(r#"{"method":"pca"}"#).unwrap();
        assert_eq!(pca, SubspaceMethod::Pca);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SubspaceMethod::Pca.to_string(), "PCA");
        assert_eq!(
            linear_kernel_pca(KernelAxis::Samples).to_string(),
            "kernel PCA (linear, sample axis)"
        );
    }
}

#[cfg(test)]
mod rank_helpers {
    use super::*;

    #[test]
    fn test_rank_correlation() {
        assert_abs_diff_eq!(rank_correlation(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rank_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0, epsilon = 1e-12);
        // monotone but non-linear still ranks perfectly
        assert_abs_diff_eq!(rank_correlation(&[1.0, 2.0, 3.0, 4.0], &[1.0, 8.0, 27.0, 64.0]), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rank_correlation_with_ties() {
        assert_eq!(ranks(&[3.0, 1.0, 1.0, 2.0]), vec![3.0, 0.5, 0.5, 2.0]);
        let rho = rank_correlation(&[1.0, 1.0, 2.0, 3.0], &[5.0, 5.0, 6.0, 7.0]);
        assert_abs_diff_eq!(rho, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_condensed_distances() {
        let x = ndarray::array![[0.0, 0.0], [3.0, 4.0], [0.0, 1.0]];
        let d = condensed_distances(&x);
        assert_eq!(d.len(), 3);
        assert_abs_diff_eq!(d[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d[2], 18.0f64.sqrt(), epsilon = 1e-12);
    }
}
