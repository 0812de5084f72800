//! Metric Self-Check Command-Line Interface
//!
//! This is the main entry point for validating the comparison metrics and
//! evaluating a selected loss over a synthetic batch with YAML configuration.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::DMatrix;
use std::fs;
use tracing::info;

use mo_metrics::config::{Args, Config};
use mo_metrics::io::{print_validation_report, setup_output};
use mo_metrics::loss::{self, LossInputs, LossKind};
use mo_metrics::validation::MetricValidator;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_output(args.output.as_ref());

    // Load and parse configuration
    info!("Reading configuration from: {}", args.config_file);
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config: Config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    info!("Configuration loaded:\n{:?}", config);

    // Resolve parameters, command-line arguments taking precedence
    let mut basis_size = config.basis_set_size();
    if let Some(b) = args.basis_size {
        info!("Overriding basis_set_size with: {}", b);
        basis_size = b;
    }
    let mut batch_size = config.validation_batch_size();
    if let Some(b) = args.batch_size {
        info!("Overriding batch_size with: {}", b);
        batch_size = b;
    }
    let mut seed = config.validation_seed();
    if let Some(s) = args.seed {
        info!("Overriding seed with: {}", s);
        seed = s;
    }
    let mut tolerance = config.validation_tolerance();
    if let Some(t) = args.tolerance {
        info!("Overriding tolerance with: {}", t);
        tolerance = t;
    }

    let mut settings = config.loss_settings();
    settings.basis_size = basis_size;
    if let Some(scale) = args.overlap_scale {
        info!("Overriding overlap_scale with: {}", scale);
        settings.overlap_scale = scale;
    }
    if let Some(guard) = args.projection_guard {
        info!("Overriding projection_guard with: {}", guard);
        settings.projection_guard = guard;
    }
    if args.raw_spectrum {
        info!("Comparing eigen-spectra in raw solver order");
        settings.ordering = mo_metrics::linalg::SpectrumOrdering::Raw;
    }

    // Run the self-check suite
    let validator = MetricValidator::new(basis_size, batch_size, seed, tolerance);
    let report = validator.run()?;
    print_validation_report(&mut std::io::stdout(), &report)?;

    // Optionally evaluate one selected loss over the synthetic batch
    let selected = args
        .loss
        .clone()
        .or_else(|| config.loss_kind().map(String::from));
    if let Some(name) = selected {
        let kind: LossKind = name.parse()?;
        let batch = validator.synthetic_batch()?;

        // Pick the prediction/target batches matching what the loss compares
        let (pred, targets): (&[DMatrix<f64>], &[DMatrix<f64>]) = match kind {
            LossKind::RotatedMeanSquaredError
            | LossKind::RotatedDotProduct
            | LossKind::RotatedOverlap
            | LossKind::RotatedProjection => (&batch.generators, &batch.targets),
            LossKind::HamiltonianMeanSquaredError
            | LossKind::HamiltonianMseWithEnergies
            | LossKind::MoEnergyLoss => (&batch.hamiltonians, &batch.hamiltonians),
            _ => (&batch.coeffs, &batch.targets),
        };

        let mut inputs = LossInputs::new(pred, targets);
        inputs.refs = Some(&batch.refs);
        inputs.overlaps = Some(&batch.overlaps);
        inputs.weights = Some(&batch.weights);
        inputs.guess_occs = Some(&batch.occupations);
        inputs.conv_occs = Some(&batch.occupations);
        inputs.energies = Some(&batch.energies);

        let value = loss::evaluate(kind, &inputs, &settings)?;
        info!("Loss '{}' over the synthetic batch: {:.6e}", kind, value);
    }

    if !report.all_passed() {
        return Err(eyre!(
            "{} of {} self-checks failed",
            report.failed_count(),
            report.checks.len()
        ));
    }

    info!("All self-checks passed.");
    Ok(())
}
