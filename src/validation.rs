//! Numerical self-checks for the comparison metrics
//!
//! Runs the library's invariants over seeded synthetic batches: the
//! orthogonalization basis inverts its metric, density matrices are
//! symmetric, identity inputs produce zero losses, a zero rotation generator
//! reduces the rotated loss to the plain elementwise loss, and orbital
//! rotations are orthogonal. Intended as a runtime sanity gate before the
//! metrics are trusted inside a longer evaluation pipeline.

use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::linalg::{
    density_matrix, orbital_energies, orbital_rotation, orthogonalization_basis, symmetrize,
    SpectrumOrdering,
};
use crate::loss::{
    hamiltonian_mean_squared_error, hamiltonian_mse_with_energies, mean_squared_error,
    mo_energy_loss, rotated_mean_squared_error, rotated_overlap,
};

/// Outcome of a single property check
#[derive(Debug, Clone, Serialize)]
pub struct PropertyCheck {
    pub name: String,
    pub max_deviation: f64,
    pub tolerance: f64,
    pub passed: bool,
}

/// Collected outcomes of one self-check run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub basis_size: usize,
    pub batch_size: usize,
    pub seed: u64,
    pub checks: Vec<PropertyCheck>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

/// A seeded batch of synthetic inputs shaped like one geometry-scan batch
pub struct SyntheticBatch {
    /// Random coefficient matrices standing in for predicted orbitals
    pub coeffs: Vec<DMatrix<f64>>,
    /// Random reference matrices the losses compare against
    pub targets: Vec<DMatrix<f64>>,
    /// Reference coefficients the rotation losses rotate
    pub refs: Vec<DMatrix<f64>>,
    /// Raw (unconstrained) rotation generators
    pub generators: Vec<DMatrix<f64>>,
    /// Well-conditioned symmetric positive-definite overlap matrices
    pub overlaps: Vec<DMatrix<f64>>,
    /// Symmetric operator matrices
    pub hamiltonians: Vec<DMatrix<f64>>,
    /// Closed-shell occupation vectors (2 electrons in the lower half)
    pub occupations: Vec<DVector<f64>>,
    /// Orbital-energy spectra consistent with the hamiltonians
    pub energies: Vec<DVector<f64>>,
    /// Non-negative entrywise weights
    pub weights: DMatrix<f64>,
}

/// Validates the metric library against its numerical invariants
pub struct MetricValidator {
    basis_size: usize,
    batch_size: usize,
    seed: u64,
    tolerance: f64,
}

impl MetricValidator {
    pub fn new(basis_size: usize, batch_size: usize, seed: u64, tolerance: f64) -> Self {
        MetricValidator {
            basis_size,
            batch_size,
            seed,
            tolerance,
        }
    }

    /// Generate a deterministic synthetic batch from the validator's seed.
    ///
    /// Overlap matrices are built as I + εAAᵀ so they are symmetric
    /// positive-definite and close to an orthonormal basis metric; reference
    /// energies are derived from the generated hamiltonians so the
    /// energy-comparison checks have a consistent ground truth.
    pub fn synthetic_batch(&self) -> Result<SyntheticBatch> {
        let n = self.basis_size;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut random = |rng: &mut StdRng| -> DMatrix<f64> {
            DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..1.0))
        };

        let mut coeffs = Vec::with_capacity(self.batch_size);
        let mut targets = Vec::with_capacity(self.batch_size);
        let mut refs = Vec::with_capacity(self.batch_size);
        let mut generators = Vec::with_capacity(self.batch_size);
        let mut overlaps = Vec::with_capacity(self.batch_size);
        let mut hamiltonians = Vec::with_capacity(self.batch_size);
        let mut occupations = Vec::with_capacity(self.batch_size);
        let mut energies = Vec::with_capacity(self.batch_size);

        let occ = DVector::from_fn(n, |i, _| if i < n / 2 { 2.0 } else { 0.0 });

        for _ in 0..self.batch_size {
            let a = random(&mut rng);
            let s = DMatrix::identity(n, n) + &a * a.transpose() * (0.1 / n as f64);
            let h = symmetrize(&random(&mut rng));
            let e = orbital_energies(&h, &s, SpectrumOrdering::Sorted)?;

            coeffs.push(random(&mut rng));
            targets.push(random(&mut rng));
            refs.push(random(&mut rng));
            generators.push(random(&mut rng));
            overlaps.push(s);
            hamiltonians.push(h);
            occupations.push(occ.clone());
            energies.push(e);
        }

        let weights = DMatrix::from_fn(n, n, |_, _| rng.gen_range(0.0..1.0));

        Ok(SyntheticBatch {
            coeffs,
            targets,
            refs,
            generators,
            overlaps,
            hamiltonians,
            occupations,
            energies,
            weights,
        })
    }

    /// Run every property check and collect the outcomes
    pub fn run(&self) -> Result<ValidationReport> {
        let n = self.basis_size;
        let batch = self.synthetic_batch()?;
        let identity = DMatrix::identity(n, n);
        let mut checks = Vec::new();

        info!(
            "Running metric self-checks (basis={}, batch={}, seed={})",
            n, self.batch_size, self.seed
        );

        // X = S^(-1/2) must invert its metric: XᵀSX ≈ I
        let mut deviation: f64 = 0.0;
        for s in &batch.overlaps {
            let x = orthogonalization_basis(s)?;
            deviation = deviation.max((x.transpose() * s * &x - &identity).amax());
        }
        checks.push(self.check("orthogonalization_identity", deviation));

        // Density matrices are symmetric by construction
        let mut deviation: f64 = 0.0;
        for (c, occ) in batch.coeffs.iter().zip(&batch.occupations) {
            let p = density_matrix(c, occ);
            deviation = deviation.max((&p - p.transpose()).amax());
        }
        checks.push(self.check("density_matrix_symmetry", deviation));

        // Orbital rotations are orthogonal: RᵀR ≈ I
        let mut deviation: f64 = 0.0;
        for g in &batch.generators {
            let r = orbital_rotation(g);
            deviation = deviation.max((r.transpose() * &r - &identity).amax());
        }
        checks.push(self.check("rotation_orthogonality", deviation));

        // Comparing a batch against itself yields a zero loss
        let self_mse = mean_squared_error(&batch.coeffs, &batch.coeffs, n)?;
        checks.push(self.check("mse_self_zero", self_mse.abs()));

        let self_hamiltonian = hamiltonian_mean_squared_error(
            &batch.hamiltonians,
            &batch.hamiltonians,
            n,
        )?;
        checks.push(self.check("hamiltonian_mse_self_zero", self_hamiltonian.abs()));

        let self_energy = mo_energy_loss(
            &batch.hamiltonians,
            &batch.hamiltonians,
            &batch.overlaps,
            n,
            SpectrumOrdering::Sorted,
        )?;
        checks.push(self.check("mo_energy_self_zero", self_energy.abs()));

        let self_energies = hamiltonian_mse_with_energies(
            &batch.hamiltonians,
            &batch.hamiltonians,
            &batch.overlaps,
            &batch.energies,
            n,
            SpectrumOrdering::Sorted,
        )?;
        checks.push(self.check("hamiltonian_energies_self_zero", self_energies.abs()));

        // A zero generator makes the rotated loss collapse onto the plain one
        let zero_generators = vec![DMatrix::zeros(n, n); self.batch_size];
        let rotated = rotated_mean_squared_error(&zero_generators, &batch.targets, &batch.refs, n)?;
        let plain = mean_squared_error(&batch.refs, &batch.targets, n)?;
        checks.push(self.check("zero_generator_reduction", (rotated - plain).abs()));

        // Pure functions: repeated evaluation is bit-identical
        let first = rotated_overlap(
            &batch.generators,
            &batch.targets,
            &batch.refs,
            &batch.overlaps,
            n,
            1.0,
        )?;
        let second = rotated_overlap(
            &batch.generators,
            &batch.targets,
            &batch.refs,
            &batch.overlaps,
            n,
            1.0,
        )?;
        checks.push(self.check("repeated_evaluation_identical", (first - second).abs()));

        for check in &checks {
            info!(
                "  {}: max deviation {:.4e} ({})",
                check.name,
                check.max_deviation,
                if check.passed { "pass" } else { "FAIL" }
            );
        }

        Ok(ValidationReport {
            basis_size: n,
            batch_size: self.batch_size,
            seed: self.seed,
            checks,
        })
    }

    fn check(&self, name: &str, max_deviation: f64) -> PropertyCheck {
        PropertyCheck {
            name: name.to_string(),
            max_deviation,
            tolerance: self.tolerance,
            passed: max_deviation <= self.tolerance,
        }
    }
}
