//! Command-line argument parsing for metric evaluation

use clap::Parser;

/// Operator comparison metrics with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override the atomic-orbital basis size
    #[arg(long)]
    pub basis_size: Option<usize>,

    /// Override the synthetic batch size
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override the random seed for synthetic batches
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the self-check numerical tolerance
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Evaluate a single loss over the synthetic batch
    /// (mse, weighted_mse, overlap, rotated_mse, rotated_dot,
    /// rotated_overlap, rotated_projection, hamiltonian_mse,
    /// hamiltonian_mse_energies, mo_energy)
    #[arg(long)]
    pub loss: Option<String>,

    /// Override the overlap-determinant scaling factor
    #[arg(long)]
    pub overlap_scale: Option<f64>,

    /// Override the projection guard threshold
    #[arg(long)]
    pub projection_guard: Option<f64>,

    /// Compare eigen-spectra in raw solver order instead of sorted
    #[arg(long)]
    pub raw_spectrum: bool,

    /// Override output file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
