//! Loss and metric functions over batches of operator matrices
//!
//! This module provides the numerical comparison layer between predicted and
//! reference quantum-chemical matrices: elementwise and physically weighted
//! errors for molecular-orbital coefficients, rotation-parameterized losses
//! for learned orbital transformations, and spectral losses for learned
//! Hamiltonian/Fock operators.
//!
//! All functions are pure, stateless, single-pass transformations over a
//! batch. Batch elements carry implicit index correspondence: `pred[i]`,
//! `targets[i]`, `refs[i]`, `overlaps[i]` all refer to the same geometry.

mod coeffs;
mod hamiltonian;
mod rotation;

#[cfg(test)]
mod tests;

pub use coeffs::{mean_squared_error, overlap_loss, weighted_mean_squared_error};
pub use hamiltonian::{
    hamiltonian_mean_squared_error, hamiltonian_mse_with_energies, mo_energy_loss,
};
pub use rotation::{
    rotated_dot_product, rotated_mean_squared_error, rotated_overlap, rotated_projection,
};

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::linalg::{SpectrumOrdering, MO_OVERLAP_SCALE};

/// Default atomic-orbital basis size of the fulvene geometry-scan datasets
pub const DEFAULT_BASIS_SIZE: usize = 36;

/// Default guard threshold below which a reciprocal projection measure is
/// treated as degenerate rather than inverted
pub const DEFAULT_PROJECTION_GUARD: f64 = 1e-8;

/// The loss/metric functions selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    MeanSquaredError,
    WeightedMeanSquaredError,
    OverlapLoss,
    RotatedMeanSquaredError,
    RotatedDotProduct,
    RotatedOverlap,
    RotatedProjection,
    HamiltonianMeanSquaredError,
    HamiltonianMseWithEnergies,
    MoEnergyLoss,
}

impl LossKind {
    /// Configuration spelling of this loss
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::MeanSquaredError => "mse",
            LossKind::WeightedMeanSquaredError => "weighted_mse",
            LossKind::OverlapLoss => "overlap",
            LossKind::RotatedMeanSquaredError => "rotated_mse",
            LossKind::RotatedDotProduct => "rotated_dot",
            LossKind::RotatedOverlap => "rotated_overlap",
            LossKind::RotatedProjection => "rotated_projection",
            LossKind::HamiltonianMeanSquaredError => "hamiltonian_mse",
            LossKind::HamiltonianMseWithEnergies => "hamiltonian_mse_energies",
            LossKind::MoEnergyLoss => "mo_energy",
        }
    }

    /// All selectable kinds, in configuration order
    pub fn all() -> &'static [LossKind] {
        &[
            LossKind::MeanSquaredError,
            LossKind::WeightedMeanSquaredError,
            LossKind::OverlapLoss,
            LossKind::RotatedMeanSquaredError,
            LossKind::RotatedDotProduct,
            LossKind::RotatedOverlap,
            LossKind::RotatedProjection,
            LossKind::HamiltonianMeanSquaredError,
            LossKind::HamiltonianMseWithEnergies,
            LossKind::MoEnergyLoss,
        ]
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LossKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mse" => Ok(LossKind::MeanSquaredError),
            "weighted_mse" => Ok(LossKind::WeightedMeanSquaredError),
            "overlap" => Ok(LossKind::OverlapLoss),
            "rotated_mse" => Ok(LossKind::RotatedMeanSquaredError),
            "rotated_dot" => Ok(LossKind::RotatedDotProduct),
            "rotated_overlap" => Ok(LossKind::RotatedOverlap),
            "rotated_projection" => Ok(LossKind::RotatedProjection),
            "hamiltonian_mse" => Ok(LossKind::HamiltonianMeanSquaredError),
            "hamiltonian_mse_energies" => Ok(LossKind::HamiltonianMseWithEnergies),
            "mo_energy" => Ok(LossKind::MoEnergyLoss),
            _ => Err(Error::UnknownLoss(s.to_string())),
        }
    }
}

/// Tunables shared by the loss functions
#[derive(Debug, Clone)]
pub struct LossSettings {
    /// Atomic-orbital basis size N; every batch element must be N×N
    pub basis_size: usize,
    /// Scaling applied to overlap determinants (see [`MO_OVERLAP_SCALE`])
    pub overlap_scale: f64,
    /// Guard threshold for the reciprocal projection loss
    pub projection_guard: f64,
    /// Ordering applied to eigen-spectra before differencing
    pub ordering: SpectrumOrdering,
}

impl Default for LossSettings {
    fn default() -> Self {
        LossSettings {
            basis_size: DEFAULT_BASIS_SIZE,
            overlap_scale: MO_OVERLAP_SCALE,
            projection_guard: DEFAULT_PROJECTION_GUARD,
            ordering: SpectrumOrdering::Sorted,
        }
    }
}

/// Borrowed batch inputs for loss dispatch.
///
/// `pred` and `targets` are always required; the remaining inputs are only
/// needed by some loss kinds and are validated at dispatch time. All slices
/// share implicit index correspondence.
pub struct LossInputs<'a> {
    /// Predicted matrices (coefficients, raw rotation generators, or
    /// operator matrices, depending on the loss kind)
    pub pred: &'a [DMatrix<f64>],
    /// Reference matrices the predictions are compared against
    pub targets: &'a [DMatrix<f64>],
    /// Reference coefficient matrices rotations are applied to
    pub refs: Option<&'a [DMatrix<f64>]>,
    /// Per-geometry overlap matrices S
    pub overlaps: Option<&'a [DMatrix<f64>]>,
    /// Entrywise weights for the weighted elementwise loss
    pub weights: Option<&'a DMatrix<f64>>,
    /// Occupations of the predicted (guess) orbitals
    pub guess_occs: Option<&'a [DVector<f64>]>,
    /// Occupations of the converged reference orbitals
    pub conv_occs: Option<&'a [DVector<f64>]>,
    /// Reference orbital-energy spectra
    pub energies: Option<&'a [DVector<f64>]>,
}

impl<'a> LossInputs<'a> {
    pub fn new(pred: &'a [DMatrix<f64>], targets: &'a [DMatrix<f64>]) -> Self {
        LossInputs {
            pred,
            targets,
            refs: None,
            overlaps: None,
            weights: None,
            guess_occs: None,
            conv_occs: None,
            energies: None,
        }
    }

    fn require<T>(option: Option<T>, kind: LossKind, input: &'static str) -> Result<T> {
        option.ok_or(Error::MissingInput {
            kind: kind.name(),
            input,
        })
    }
}

/// Evaluates the selected loss over the batch.
///
/// Validates that every batch input required by `kind` is present, then
/// forwards to the corresponding loss function with the tunables from
/// `settings`.
pub fn evaluate(kind: LossKind, inputs: &LossInputs<'_>, settings: &LossSettings) -> Result<f64> {
    let n = settings.basis_size;
    match kind {
        LossKind::MeanSquaredError => mean_squared_error(inputs.pred, inputs.targets, n),
        LossKind::WeightedMeanSquaredError => {
            let weights = LossInputs::require(inputs.weights, kind, "weights")?;
            weighted_mean_squared_error(inputs.pred, inputs.targets, weights, n)
        }
        LossKind::OverlapLoss => {
            let overlaps = LossInputs::require(inputs.overlaps, kind, "overlaps")?;
            overlap_loss(inputs.pred, inputs.targets, overlaps, n, settings.overlap_scale)
        }
        LossKind::RotatedMeanSquaredError => {
            let refs = LossInputs::require(inputs.refs, kind, "refs")?;
            rotated_mean_squared_error(inputs.pred, inputs.targets, refs, n)
        }
        LossKind::RotatedDotProduct => {
            let refs = LossInputs::require(inputs.refs, kind, "refs")?;
            rotated_dot_product(inputs.pred, inputs.targets, refs, n)
        }
        LossKind::RotatedOverlap => {
            let refs = LossInputs::require(inputs.refs, kind, "refs")?;
            let overlaps = LossInputs::require(inputs.overlaps, kind, "overlaps")?;
            rotated_overlap(
                inputs.pred,
                inputs.targets,
                refs,
                overlaps,
                n,
                settings.overlap_scale,
            )
        }
        LossKind::RotatedProjection => {
            let refs = LossInputs::require(inputs.refs, kind, "refs")?;
            let overlaps = LossInputs::require(inputs.overlaps, kind, "overlaps")?;
            let guess_occs = LossInputs::require(inputs.guess_occs, kind, "guess_occs")?;
            let conv_occs = LossInputs::require(inputs.conv_occs, kind, "conv_occs")?;
            rotated_projection(
                inputs.pred,
                inputs.targets,
                refs,
                overlaps,
                guess_occs,
                conv_occs,
                n,
                settings.projection_guard,
            )
        }
        LossKind::HamiltonianMeanSquaredError => {
            hamiltonian_mean_squared_error(inputs.pred, inputs.targets, n)
        }
        LossKind::HamiltonianMseWithEnergies => {
            let overlaps = LossInputs::require(inputs.overlaps, kind, "overlaps")?;
            let energies = LossInputs::require(inputs.energies, kind, "energies")?;
            hamiltonian_mse_with_energies(
                inputs.pred,
                inputs.targets,
                overlaps,
                energies,
                n,
                settings.ordering,
            )
        }
        LossKind::MoEnergyLoss => {
            let overlaps = LossInputs::require(inputs.overlaps, kind, "overlaps")?;
            mo_energy_loss(inputs.pred, inputs.targets, overlaps, n, settings.ordering)
        }
    }
}

// Shared batch validation helpers. Every loss entry point runs these before
// touching any element, so a malformed batch fails fast instead of partway
// through a parallel evaluation.

pub(crate) fn check_nonempty(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyBatch);
    }
    Ok(())
}

pub(crate) fn check_batch(what: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::BatchMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

pub(crate) fn check_square(
    what: &'static str,
    index: usize,
    m: &DMatrix<f64>,
    n: usize,
) -> Result<()> {
    if m.nrows() != n || m.ncols() != n {
        return Err(Error::Shape {
            what,
            index,
            expected: n,
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(())
}

pub(crate) fn check_vector(
    what: &'static str,
    index: usize,
    v: &DVector<f64>,
    n: usize,
) -> Result<()> {
    if v.len() != n {
        return Err(Error::VectorShape {
            what,
            index,
            expected: n,
            len: v.len(),
        });
    }
    Ok(())
}
