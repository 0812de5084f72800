//! Losses over learned molecular-orbital coefficient matrices

use nalgebra::DMatrix;

use super::{check_batch, check_nonempty, check_square};
use crate::error::Result;
use crate::linalg::mo_overlap_determinant;

/// Mean squared elementwise error between predicted and reference matrices.
///
/// Per batch element: Σ(Δ²)/N², then averaged over the batch.
pub fn mean_squared_error(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    basis_size: usize,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    let n2 = (basis_size * basis_size) as f64;

    let mut loss = 0.0;
    for (i, (p, t)) in pred.iter().zip(targets).enumerate() {
        check_square("pred", i, p, basis_size)?;
        check_square("targets", i, t, basis_size)?;
        loss += (t - p).norm_squared() / n2;
    }
    Ok(loss / pred.len() as f64)
}

/// Physically weighted mean squared error.
///
/// `weights` multiplies the squared differences entrywise before summation;
/// the total is divided by (batch · N²). Weights must be non-negative — a
/// caller contract, as they encode the physical importance of each matrix
/// entry.
pub fn weighted_mean_squared_error(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    weights: &DMatrix<f64>,
    basis_size: usize,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_square("weights", 0, weights, basis_size)?;
    debug_assert!(weights.iter().all(|&w| w >= 0.0), "negative weight");
    let n2 = (basis_size * basis_size) as f64;

    let mut loss = 0.0;
    for (i, (p, t)) in pred.iter().zip(targets).enumerate() {
        check_square("pred", i, p, basis_size)?;
        check_square("targets", i, t, basis_size)?;
        let diff = t - p;
        loss += diff.component_mul(weights).dot(&diff);
    }
    Ok(loss / (pred.len() as f64 * n2))
}

/// Wavefunction-overlap metric between predicted and reference orbital sets.
///
/// Per batch element, the full N×N overlap determinant in the geometry's own
/// S metric. Summed over the batch, NOT averaged: the downstream consumer
/// divides externally when a mean is wanted.
pub fn overlap_loss(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    overlaps: &[DMatrix<f64>],
    basis_size: usize,
    scale: f64,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("overlaps", pred.len(), overlaps.len())?;

    let mut loss = 0.0;
    for (i, ((p, t), s)) in pred.iter().zip(targets).zip(overlaps).enumerate() {
        check_square("pred", i, p, basis_size)?;
        check_square("targets", i, t, basis_size)?;
        check_square("overlaps", i, s, basis_size)?;
        loss += mo_overlap_determinant(p, t, s, scale);
    }
    Ok(loss)
}
