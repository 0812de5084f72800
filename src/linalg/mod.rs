//! Matrix utilities for operator comparison
//!
//! Shared building blocks for the loss functions: density matrices from
//! orbital coefficients, the symmetric inverse-square-root orthogonalization
//! basis, overlap determinants in the S metric, and the skew-symmetric
//! orbital-rotation parameterization.
//!
//! All routines operate on square matrices of the atomic-orbital basis size
//! and are pure given their inputs.

extern crate nalgebra as na;

use na::{DMatrix, DVector};

use crate::error::{Error, Result};


/// Scaling applied to the molecular-orbital overlap determinant.
///
/// Overlap determinants of 36-orbital sets are tiny; this empirical factor
/// brings them into a trainable numeric range. The value is kept for
/// compatibility with previously trained checkpoints. It is a tunable, not a
/// physical constant; every overlap routine takes it as an explicit argument.
pub const MO_OVERLAP_SCALE: f64 = 1e14;

/// Tolerance for the symmetric eigensolver
const EIG_EPS: f64 = 1.0e-10;
/// Iteration budget for the symmetric eigensolver
const EIG_MAX_NITER: usize = 1000;

/// Ordering applied to eigen-spectra before they are compared.
///
/// Energy-comparison losses difference two spectra element by element. The
/// eigensolver does not guarantee any particular order, so `Sorted` (the
/// default) sorts both spectra ascending before differencing. `Raw` preserves
/// the solver's order; it exists for parity experiments and is fragile under
/// degenerate or reordered eigenvalues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectrumOrdering {
    #[default]
    Sorted,
    Raw,
}

/// Builds the density matrix P = Σᵢ occᵢ · C[:,i] · C[:,i]ᵀ.
///
/// Columns of `orbitals` are molecular orbitals; `occ` holds the electron
/// count per orbital (typically 0, 1 or 2). The result is symmetric by
/// construction. Pure arithmetic, no error conditions; the caller guarantees
/// the shape match.
pub fn density_matrix(orbitals: &DMatrix<f64>, occ: &DVector<f64>) -> DMatrix<f64> {
    debug_assert_eq!(orbitals.ncols(), occ.len());
    orbitals * DMatrix::from_diagonal(occ) * orbitals.transpose()
}

/// Builds the symmetric orthogonalization basis X = S^(-1/2).
///
/// Eigendecomposes S = U·diag(e)·Uᵀ and returns X = U·diag(e^(-1/2))·Uᵀ, so
/// that XᵀSX = I. S must be symmetric positive-definite: a non-positive
/// eigenvalue (typically numerical noise in a near-singular overlap) is
/// reported as [`Error::NotPositiveDefinite`] instead of letting NaNs
/// propagate into the loss.
pub fn orthogonalization_basis(s: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let eig = s
        .clone()
        .try_symmetric_eigen(EIG_EPS, EIG_MAX_NITER)
        .ok_or(Error::EigenConvergence)?;

    if let Some(index) = eig.eigenvalues.iter().position(|&e| e <= 0.0) {
        return Err(Error::NotPositiveDefinite {
            index,
            eigenvalue: eig.eigenvalues[index],
        });
    }

    let inv_sqrt = DMatrix::from_diagonal(&eig.eigenvalues.map(|e| 1.0 / e.sqrt()));
    Ok(&eig.eigenvectors * inv_sqrt * eig.eigenvectors.transpose())
}

/// Physical inner product ⟨c₁|c₂⟩ between two orbitals in the S metric:
/// ½·c₁ᵀ·S·c₂.
pub fn mo_overlap(c1: &DVector<f64>, c2: &DVector<f64>, s: &DMatrix<f64>) -> f64 {
    0.5 * (s * c2).dot(c1)
}

/// Generalized wavefunction-overlap determinant between two orbital sets.
///
/// Builds the matrix M with Mᵢⱼ = ⟨C_pred[:,i] | C_target[:,j]⟩_S
/// (equivalently M = ½·C_predᵀ·S·C_target) and returns |det M| · `scale`.
/// Pass [`MO_OVERLAP_SCALE`] for the checkpoint-compatible scaling.
pub fn mo_overlap_determinant(
    c_pred: &DMatrix<f64>,
    c_target: &DMatrix<f64>,
    s: &DMatrix<f64>,
    scale: f64,
) -> f64 {
    let m = 0.5 * (c_pred.transpose() * s * c_target);
    m.determinant().abs() * scale
}

/// Symmetric part ½(A + Aᵀ). Operator matrices are symmetrized with this
/// before any comparison.
pub fn symmetrize(a: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (a + a.transpose())
}

/// Antisymmetric part ½(A − Aᵀ), the generator of an orbital rotation.
pub fn antisymmetrize(a: &DMatrix<f64>) -> DMatrix<f64> {
    0.5 * (a - a.transpose())
}

/// Maps a raw predicted generator to an orthogonal orbital rotation:
/// R = exp(½(X_raw − X_rawᵀ)).
///
/// The exponential of an antisymmetric matrix is orthogonal by construction,
/// so R·C preserves orthonormality of the rotated orbital set.
pub fn orbital_rotation(x_raw: &DMatrix<f64>) -> DMatrix<f64> {
    antisymmetrize(x_raw).exp()
}

/// Eigen-spectrum of a symmetric operator in the orthogonalized basis.
///
/// Transforms H into F' = Xᵀ·H·X with X = S^(-1/2) and returns the
/// eigenvalues of F' — the orbital energies of the operator. `h` must already
/// be symmetric (callers symmetrize predictions first). The returned spectrum
/// is ordered according to `ordering`.
pub fn orbital_energies(
    h: &DMatrix<f64>,
    s: &DMatrix<f64>,
    ordering: SpectrumOrdering,
) -> Result<DVector<f64>> {
    let x = orthogonalization_basis(s)?;
    let f_prime = x.transpose() * h * &x;
    let eig = f_prime
        .try_symmetric_eigen(EIG_EPS, EIG_MAX_NITER)
        .ok_or(Error::EigenConvergence)?;

    match ordering {
        SpectrumOrdering::Sorted => Ok(sort_spectrum(&eig.eigenvalues)),
        SpectrumOrdering::Raw => Ok(eig.eigenvalues),
    }
}

/// Returns a copy of the spectrum sorted ascending.
pub fn sort_spectrum(energies: &DVector<f64>) -> DVector<f64> {
    let mut values: Vec<f64> = energies.iter().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    DVector::from_vec(values)
}
