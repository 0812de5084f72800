//! Configuration management for metric evaluation
//!
//! This module handles configuration structures, defaults, and validation
//! for loss selection and the numerical self-check suite.

mod args;

pub use args::Args;

use serde::{Deserialize, Serialize};

use crate::linalg::{SpectrumOrdering, MO_OVERLAP_SCALE};
use crate::loss::{LossSettings, DEFAULT_BASIS_SIZE, DEFAULT_PROJECTION_GUARD};

/// Main configuration structure for metric evaluation
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub basis_set_size: Option<usize>,
    pub loss: Option<LossParams>,
    pub validation: Option<ValidationParams>,
}

/// Loss-specific tunables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LossParams {
    /// Loss selected for evaluation over the synthetic batch (optional)
    pub kind: Option<String>,
    pub overlap_scale: Option<f64>,
    pub projection_guard: Option<f64>,
    /// Compare eigen-spectra in the solver's raw order instead of sorted
    pub raw_spectrum: Option<bool>,
}

impl Default for LossParams {
    fn default() -> Self {
        LossParams {
            kind: None,
            overlap_scale: Some(MO_OVERLAP_SCALE),
            projection_guard: Some(DEFAULT_PROJECTION_GUARD),
            raw_spectrum: Some(false),
        }
    }
}

impl LossParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.overlap_scale.is_none() {
            self.overlap_scale = defaults.overlap_scale;
        }
        if self.projection_guard.is_none() {
            self.projection_guard = defaults.projection_guard;
        }
        if self.raw_spectrum.is_none() {
            self.raw_spectrum = defaults.raw_spectrum;
        }
        self
    }
}

/// Self-check suite parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ValidationParams {
    pub batch_size: Option<usize>,
    pub seed: Option<u64>,
    pub tolerance: Option<f64>,
}

impl Default for ValidationParams {
    fn default() -> Self {
        ValidationParams {
            batch_size: Some(8),
            seed: Some(42),
            tolerance: Some(1e-5),
        }
    }
}

impl ValidationParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.batch_size.is_none() {
            self.batch_size = defaults.batch_size;
        }
        if self.seed.is_none() {
            self.seed = defaults.seed;
        }
        if self.tolerance.is_none() {
            self.tolerance = defaults.tolerance;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.loss = Some(self.loss.take().unwrap_or_default().with_defaults());
        self.validation = Some(
            self.validation
                .take()
                .unwrap_or_default()
                .with_defaults(),
        );
        self
    }

    /// Atomic-orbital basis size N
    pub fn basis_set_size(&self) -> usize {
        self.basis_set_size.unwrap_or(DEFAULT_BASIS_SIZE)
    }

    /// Name of the loss selected for evaluation, if any
    pub fn loss_kind(&self) -> Option<&str> {
        self.loss.as_ref().and_then(|l| l.kind.as_deref())
    }

    /// Loss tunables merged with their defaults
    pub fn loss_settings(&self) -> LossSettings {
        let params = self.loss.clone().unwrap_or_default();
        let ordering = if params.raw_spectrum.unwrap_or(false) {
            SpectrumOrdering::Raw
        } else {
            SpectrumOrdering::Sorted
        };
        LossSettings {
            basis_size: self.basis_set_size(),
            overlap_scale: params.overlap_scale.unwrap_or(MO_OVERLAP_SCALE),
            projection_guard: params.projection_guard.unwrap_or(DEFAULT_PROJECTION_GUARD),
            ordering,
        }
    }

    /// Synthetic batch size for the self-check suite
    pub fn validation_batch_size(&self) -> usize {
        self.validation
            .as_ref()
            .and_then(|v| v.batch_size)
            .unwrap_or(8)
    }

    /// Random seed for the self-check suite
    pub fn validation_seed(&self) -> u64 {
        self.validation.as_ref().and_then(|v| v.seed).unwrap_or(42)
    }

    /// Numerical tolerance for the self-check suite
    pub fn validation_tolerance(&self) -> f64 {
        self.validation
            .as_ref()
            .and_then(|v| v.tolerance)
            .unwrap_or(1e-5)
    }
}
