//! Losses over learned orbital-rotation generators
//!
//! Each variant shares the same prelude per batch element: the raw predicted
//! matrix is antisymmetrized into a rotation generator, exponentiated into an
//! orthogonal rotation R, and applied to the reference coefficients to form
//! the candidate orbital set R·C_ref. The variants differ only in how the
//! candidate is compared against the target.
//!
//! The matrix exponential dominates the per-element cost, so the batch loops
//! run in parallel; batch elements are independent and the first failing
//! element aborts the evaluation.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use super::{check_batch, check_nonempty, check_square, check_vector};
use crate::error::{Error, Result};
use crate::linalg::{density_matrix, mo_overlap_determinant, orbital_rotation};

/// Elementwise squared error between rotated reference and target
/// coefficients, normalized by N² and averaged over the batch.
///
/// With a zero generator the rotation is the identity and this reduces
/// exactly to `mean_squared_error(refs, targets, basis_size)`.
pub fn rotated_mean_squared_error(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    refs: &[DMatrix<f64>],
    basis_size: usize,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("refs", pred.len(), refs.len())?;
    let n2 = (basis_size * basis_size) as f64;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(refs.par_iter())
        .enumerate()
        .map(|(i, ((p, t), r))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("refs", i, r, basis_size)?;
            let candidate = orbital_rotation(p) * r;
            Ok((t - &candidate).norm_squared() / n2)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / pred.len() as f64)
}

/// Inner product between flattened target and candidate coefficients,
/// averaged over (batch · N).
///
/// A similarity score: larger is better. The caller is responsible for the
/// sign convention when using this as a training objective.
pub fn rotated_dot_product(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    refs: &[DMatrix<f64>],
    basis_size: usize,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("refs", pred.len(), refs.len())?;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(refs.par_iter())
        .enumerate()
        .map(|(i, ((p, t), r))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("refs", i, r, basis_size)?;
            let candidate = orbital_rotation(p) * r;
            Ok(t.dot(&candidate))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / (pred.len() * basis_size) as f64)
}

/// Wavefunction-overlap measure between candidate and target orbital sets,
/// normalized by (batch · N).
pub fn rotated_overlap(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    refs: &[DMatrix<f64>],
    overlaps: &[DMatrix<f64>],
    basis_size: usize,
    scale: f64,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("refs", pred.len(), refs.len())?;
    check_batch("overlaps", pred.len(), overlaps.len())?;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(refs.par_iter())
        .zip(overlaps.par_iter())
        .enumerate()
        .map(|(i, (((p, t), r), s))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("refs", i, r, basis_size)?;
            check_square("overlaps", i, s, basis_size)?;
            let candidate = orbital_rotation(p) * r;
            Ok(mo_overlap_determinant(&candidate, t, s, scale))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / (pred.len() * basis_size) as f64)
}

/// Reciprocal density-matrix projection loss, averaged over the batch.
///
/// Per element: density matrices are built from the candidate (with the guess
/// occupations) and the target (with the converged occupations), and the
/// projection measure trace(P_cand·S·P_target·S) quantifies wavefunction
/// similarity through the metric. The loss accumulates its reciprocal, so it
/// decreases as the projection grows.
///
/// A projection with magnitude below `guard` is reported as
/// [`Error::DegenerateProjection`] instead of being inverted; clamping would
/// silently corrupt a gradient signal.
#[allow(clippy::too_many_arguments)]
pub fn rotated_projection(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    refs: &[DMatrix<f64>],
    overlaps: &[DMatrix<f64>],
    guess_occs: &[DVector<f64>],
    conv_occs: &[DVector<f64>],
    basis_size: usize,
    guard: f64,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("refs", pred.len(), refs.len())?;
    check_batch("overlaps", pred.len(), overlaps.len())?;
    check_batch("guess_occs", pred.len(), guess_occs.len())?;
    check_batch("conv_occs", pred.len(), conv_occs.len())?;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(refs.par_iter())
        .zip(overlaps.par_iter())
        .zip(guess_occs.par_iter())
        .zip(conv_occs.par_iter())
        .enumerate()
        .map(|(i, (((((p, t), r), s), g_occ), c_occ))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("refs", i, r, basis_size)?;
            check_square("overlaps", i, s, basis_size)?;
            check_vector("guess_occs", i, g_occ, basis_size)?;
            check_vector("conv_occs", i, c_occ, basis_size)?;

            let candidate = orbital_rotation(p) * r;
            let p_candidate = density_matrix(&candidate, g_occ);
            let p_target = density_matrix(t, c_occ);
            let projection = (&p_candidate * s * &p_target * s).trace();

            if projection.abs() < guard {
                return Err(Error::DegenerateProjection {
                    index: i,
                    value: projection,
                    guard,
                });
            }
            Ok(projection.recip())
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / pred.len() as f64)
}
