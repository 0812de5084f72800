//! Tests for the loss functions

use super::*;
use crate::error::Error;
use crate::linalg::{orbital_energies, SpectrumOrdering};
use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0))
}

fn random_batch(seed: u64, batch: usize, n: usize) -> Vec<DMatrix<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..batch).map(|_| random_matrix(&mut rng, n)).collect()
}

fn identity_batch(batch: usize, n: usize) -> Vec<DMatrix<f64>> {
    vec![DMatrix::identity(n, n); batch]
}

fn zero_batch(batch: usize, n: usize) -> Vec<DMatrix<f64>> {
    vec![DMatrix::zeros(n, n); batch]
}

#[test]
fn mse_of_identical_batches_is_zero() {
    let batch = random_batch(1, 3, 4);
    assert_eq!(mean_squared_error(&batch, &batch, 4).unwrap(), 0.0);
}

#[test]
fn mse_simple_value() {
    // Zeros against ones: every squared difference is 1, so Σ/N² = 1
    let pred = zero_batch(2, 2);
    let targets = vec![DMatrix::from_element(2, 2, 1.0); 2];
    assert_abs_diff_eq!(
        mean_squared_error(&pred, &targets, 2).unwrap(),
        1.0,
        epsilon = 1e-14
    );
}

#[test]
fn mse_rejects_shape_mismatch() {
    let pred = vec![DMatrix::zeros(3, 3)];
    let targets = vec![DMatrix::zeros(3, 3)];
    match mean_squared_error(&pred, &targets, 4) {
        Err(Error::Shape { expected: 4, .. }) => {}
        other => panic!("expected Shape error, got {:?}", other),
    }
}

#[test]
fn mse_rejects_batch_mismatch() {
    let pred = random_batch(2, 3, 2);
    let targets = random_batch(3, 2, 2);
    match mean_squared_error(&pred, &targets, 2) {
        Err(Error::BatchMismatch {
            expected: 3,
            got: 2,
            ..
        }) => {}
        other => panic!("expected BatchMismatch, got {:?}", other),
    }
}

#[test]
fn mse_rejects_empty_batch() {
    let empty: Vec<DMatrix<f64>> = Vec::new();
    assert!(matches!(
        mean_squared_error(&empty, &empty, 2),
        Err(Error::EmptyBatch)
    ));
}

#[test]
fn weighted_mse_with_unit_weights_matches_mse() {
    let pred = random_batch(4, 3, 3);
    let targets = random_batch(5, 3, 3);
    let ones = DMatrix::from_element(3, 3, 1.0);

    let weighted = weighted_mean_squared_error(&pred, &targets, &ones, 3).unwrap();
    let plain = mean_squared_error(&pred, &targets, 3).unwrap();
    assert_abs_diff_eq!(weighted, plain, epsilon = 1e-12);
}

#[test]
fn weighted_mse_with_zero_weights_is_zero() {
    let pred = random_batch(6, 2, 3);
    let targets = random_batch(7, 2, 3);
    let zeros = DMatrix::zeros(3, 3);
    assert_eq!(
        weighted_mean_squared_error(&pred, &targets, &zeros, 3).unwrap(),
        0.0
    );
}

#[test]
fn overlap_loss_sums_over_batch() {
    // Doubling the batch doubles the value: a sum, not a mean
    let pred = random_batch(8, 1, 3);
    let targets = random_batch(9, 1, 3);
    let s = vec![DMatrix::identity(3, 3)];

    let single = overlap_loss(&pred, &targets, &s, 3, 1.0).unwrap();

    let pred2 = vec![pred[0].clone(), pred[0].clone()];
    let targets2 = vec![targets[0].clone(), targets[0].clone()];
    let s2 = vec![s[0].clone(), s[0].clone()];
    let double = overlap_loss(&pred2, &targets2, &s2, 3, 1.0).unwrap();

    assert_abs_diff_eq!(double, 2.0 * single, epsilon = 1e-12);
}

#[test]
fn rotated_mse_with_zero_generator_reduces_to_mse() {
    let generators = zero_batch(3, 4);
    let targets = random_batch(10, 3, 4);
    let refs = random_batch(11, 3, 4);

    let rotated = rotated_mean_squared_error(&generators, &targets, &refs, 4).unwrap();
    let plain = mean_squared_error(&refs, &targets, 4).unwrap();
    assert_abs_diff_eq!(rotated, plain, epsilon = 1e-12);
}

#[test]
fn rotated_mse_recovers_quarter_turn_target() {
    // A ±π/2 planar generator applied to identity references lands exactly
    // on the corresponding rotation matrix
    let theta = std::f64::consts::FRAC_PI_2;
    let generators = vec![DMatrix::from_row_slice(2, 2, &[0.0, theta, -theta, 0.0])];
    let refs = identity_batch(1, 2);
    let targets = vec![DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0])];

    let loss = rotated_mean_squared_error(&generators, &targets, &refs, 2).unwrap();
    assert!(loss < 1e-20, "expected ≈0, got {}", loss);
}

#[test]
fn rotated_dot_product_of_matching_identities_is_unity() {
    // Candidate = target = I, so the flattened inner product is N and the
    // (batch · N) normalization brings it to 1
    let generators = zero_batch(2, 3);
    let refs = identity_batch(2, 3);
    let targets = identity_batch(2, 3);

    let score = rotated_dot_product(&generators, &targets, &refs, 3).unwrap();
    assert_abs_diff_eq!(score, 1.0, epsilon = 1e-14);
}

#[test]
fn rotated_overlap_with_zero_generator_matches_overlap_loss() {
    let generators = zero_batch(2, 3);
    let targets = random_batch(12, 2, 3);
    let refs = random_batch(13, 2, 3);
    let overlaps = vec![DMatrix::identity(3, 3); 2];

    let rotated = rotated_overlap(&generators, &targets, &refs, &overlaps, 3, 1.0).unwrap();
    let direct = overlap_loss(&refs, &targets, &overlaps, 3, 1.0).unwrap();
    assert_abs_diff_eq!(rotated, direct / (2.0 * 3.0), epsilon = 1e-12);
}

#[test]
fn rotated_projection_of_identity_orbitals() {
    // C = I, S = I, two doubly occupied orbitals: the projection measure is
    // Σ occᵢ² = 8, so the reciprocal loss is 1/8
    let n = 4;
    let generators = zero_batch(1, n);
    let refs = identity_batch(1, n);
    let targets = identity_batch(1, n);
    let overlaps = identity_batch(1, n);
    let occ = vec![DVector::from_vec(vec![2.0, 2.0, 0.0, 0.0])];

    let loss =
        rotated_projection(&generators, &targets, &refs, &overlaps, &occ, &occ, n, 1e-8).unwrap();
    assert_abs_diff_eq!(loss, 1.0 / 8.0, epsilon = 1e-12);
}

#[test]
fn rotated_projection_guards_against_degenerate_projection() {
    // Zero occupations give a zero density matrix and a zero projection
    let n = 3;
    let generators = zero_batch(1, n);
    let refs = identity_batch(1, n);
    let targets = identity_batch(1, n);
    let overlaps = identity_batch(1, n);
    let occ = vec![DVector::zeros(n)];

    match rotated_projection(&generators, &targets, &refs, &overlaps, &occ, &occ, n, 1e-8) {
        Err(Error::DegenerateProjection { index: 0, .. }) => {}
        other => panic!("expected DegenerateProjection, got {:?}", other),
    }
}

#[test]
fn hamiltonian_mse_of_identity_with_itself_is_zero() {
    let batch = identity_batch(1, 2);
    assert_eq!(
        hamiltonian_mean_squared_error(&batch, &batch, 2).unwrap(),
        0.0
    );
}

#[test]
fn hamiltonian_mse_symmetrizes_the_prediction() {
    // The asymmetric prediction symmetrizes onto the target exactly
    let pred = vec![DMatrix::from_row_slice(2, 2, &[0.0, 2.0, 0.0, 0.0])];
    let targets = vec![DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0])];
    assert_abs_diff_eq!(
        hamiltonian_mean_squared_error(&pred, &targets, 2).unwrap(),
        0.0,
        epsilon = 1e-14
    );
}

#[test]
fn hamiltonian_mse_with_energies_is_zero_for_consistent_inputs() {
    let h = DMatrix::from_row_slice(3, 3, &[1.0, 0.2, 0.0, 0.2, 2.0, 0.1, 0.0, 0.1, 3.0]);
    let s = DMatrix::identity(3, 3);
    let e = orbital_energies(&h, &s, SpectrumOrdering::Sorted).unwrap();

    let loss = hamiltonian_mse_with_energies(
        &[h.clone()],
        &[h.clone()],
        &[s],
        &[e],
        3,
        SpectrumOrdering::Sorted,
    )
    .unwrap();
    assert!(loss < 1e-16, "expected ≈0, got {}", loss);
}

#[test]
fn mo_energy_loss_of_identical_operators_is_zero() {
    let h = DMatrix::from_row_slice(2, 2, &[1.0, 0.3, 0.3, 2.0]);
    let s = DMatrix::identity(2, 2);
    let loss = mo_energy_loss(
        &[h.clone()],
        &[h],
        &[s],
        2,
        SpectrumOrdering::Sorted,
    )
    .unwrap();
    assert!(loss < 1e-12);
}

#[test]
fn mo_energy_loss_measures_spectral_shift() {
    // Shifting an operator by the identity shifts every eigenvalue by one,
    // so Σ|Δe| equals the basis size
    let h = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0, 3.0]));
    let shifted = &h + DMatrix::identity(3, 3);
    let s = DMatrix::identity(3, 3);

    let loss = mo_energy_loss(&[shifted], &[h], &[s], 3, SpectrumOrdering::Sorted).unwrap();
    assert_abs_diff_eq!(loss, 3.0, epsilon = 1e-9);
}

#[test]
fn sorted_ordering_ignores_eigenvalue_permutation() {
    // Same spectrum, different diagonal order: sorted comparison sees no
    // difference
    let pred = vec![DMatrix::from_diagonal(&DVector::from_vec(vec![
        3.0, 1.0, 2.0,
    ]))];
    let targets = vec![DMatrix::from_diagonal(&DVector::from_vec(vec![
        1.0, 2.0, 3.0,
    ]))];
    let s = vec![DMatrix::identity(3, 3)];

    let loss = mo_energy_loss(&pred, &targets, &s, 3, SpectrumOrdering::Sorted).unwrap();
    assert!(loss < 1e-9, "expected ≈0 under sorted ordering, got {}", loss);
}

#[test]
fn loss_kind_round_trips_through_from_str() {
    for &kind in LossKind::all() {
        let parsed: LossKind = kind.name().parse().unwrap();
        assert_eq!(parsed, kind);
    }
    assert!(matches!(
        "no_such_loss".parse::<LossKind>(),
        Err(Error::UnknownLoss(_))
    ));
}

#[test]
fn evaluate_rejects_missing_inputs() {
    let pred = random_batch(14, 2, 3);
    let targets = random_batch(15, 2, 3);
    let inputs = LossInputs::new(&pred, &targets);
    let settings = LossSettings {
        basis_size: 3,
        ..LossSettings::default()
    };

    match evaluate(LossKind::RotatedMeanSquaredError, &inputs, &settings) {
        Err(Error::MissingInput { input: "refs", .. }) => {}
        other => panic!("expected MissingInput, got {:?}", other),
    }
}

#[test]
fn evaluate_dispatch_matches_direct_call() {
    let pred = random_batch(16, 2, 3);
    let targets = random_batch(17, 2, 3);
    let inputs = LossInputs::new(&pred, &targets);
    let settings = LossSettings {
        basis_size: 3,
        ..LossSettings::default()
    };

    let dispatched = evaluate(LossKind::MeanSquaredError, &inputs, &settings).unwrap();
    let direct = mean_squared_error(&pred, &targets, 3).unwrap();
    assert_eq!(dispatched, direct);
}

#[test]
fn losses_are_deterministic_across_repeated_evaluation() {
    let generators = random_batch(18, 3, 4);
    let targets = random_batch(19, 3, 4);
    let refs = random_batch(20, 3, 4);
    let overlaps = identity_batch(3, 4);

    let first = rotated_overlap(&generators, &targets, &refs, &overlaps, 4, 1.0).unwrap();
    let second = rotated_overlap(&generators, &targets, &refs, &overlaps, 4, 1.0).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
}
