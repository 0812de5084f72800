//! Losses over learned Hamiltonian/Fock operator matrices
//!
//! Predicted operator matrices are symmetrized with ½(H + Hᵀ) before any
//! comparison; a physical one-electron operator is symmetric and the network
//! output carries no such constraint. Reference operators are assumed
//! symmetric already (they come from converged electronic-structure
//! calculations).

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use super::{check_batch, check_nonempty, check_square, check_vector};
use crate::error::Result;
use crate::linalg::{orbital_energies, sort_spectrum, symmetrize, SpectrumOrdering};

/// Mean squared elementwise error between the symmetrized prediction and the
/// target operator, normalized by N² and averaged over the batch.
pub fn hamiltonian_mean_squared_error(
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
        let h = symmetrize(p);
        loss += (t - &h).norm_squared() / n2;
    }
    Ok(loss / pred.len() as f64)
}

/// Elementwise operator error plus orbital-energy spectrum error.
///
/// Per batch element, the elementwise term of
/// [`hamiltonian_mean_squared_error`] is augmented with the squared error
/// between the predicted spectrum — the symmetrized prediction transformed
/// into the orthogonalized basis and eigendecomposed — and the reference
/// spectrum, normalized by N. Both spectra are ordered according to
/// `ordering` before differencing.
pub fn hamiltonian_mse_with_energies(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    overlaps: &[DMatrix<f64>],
    energies: &[DVector<f64>],
    basis_size: usize,
    ordering: SpectrumOrdering,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("overlaps", pred.len(), overlaps.len())?;
    check_batch("energies", pred.len(), energies.len())?;
    let n = basis_size as f64;
    let n2 = n * n;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(overlaps.par_iter())
        .zip(energies.par_iter())
        .enumerate()
        .map(|(i, (((p, t), s), e_ref))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("overlaps", i, s, basis_size)?;
            check_vector("energies", i, e_ref, basis_size)?;

            let h = symmetrize(p);
            let mut loss = (t - &h).norm_squared() / n2;

            let e_pred = orbital_energies(&h, s, ordering)?;
            let e_ref = match ordering {
                SpectrumOrdering::Sorted => sort_spectrum(e_ref),
                SpectrumOrdering::Raw => e_ref.clone(),
            };
            loss += (e_ref - e_pred).norm_squared() / n;
            Ok(loss)
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / pred.len() as f64)
}

/// Total orbital-energy difference between predicted and target operators.
///
/// Both operators run through the same orthogonalize-then-eigendecompose
/// pipeline and the loss is Σ|Δe| over the full spectrum — summed across
/// eigenvalues, averaged over the batch.
pub fn mo_energy_loss(
    pred: &[DMatrix<f64>],
    targets: &[DMatrix<f64>],
    overlaps: &[DMatrix<f64>],
    basis_size: usize,
    ordering: SpectrumOrdering,
) -> Result<f64> {
    check_nonempty(pred.len())?;
    check_batch("targets", pred.len(), targets.len())?;
    check_batch("overlaps", pred.len(), overlaps.len())?;

    let per_element: Vec<f64> = pred
        .par_iter()
        .zip(targets.par_iter())
        .zip(overlaps.par_iter())
        .enumerate()
        .map(|(i, ((p, t), s))| {
            check_square("pred", i, p, basis_size)?;
            check_square("targets", i, t, basis_size)?;
            check_square("overlaps", i, s, basis_size)?;

            let h = symmetrize(p);
            let e_pred = orbital_energies(&h, s, ordering)?;
            let e_target = orbital_energies(t, s, ordering)?;
            Ok((e_target - e_pred).abs().sum())
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(per_element.iter().sum::<f64>() / pred.len() as f64)
}
