use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use simd_calc::ElementType;
use simd_calc::harness::config::VerifyConfig;

#[derive(Parser)]
#[command(name = "simd_calc", version, about = "128-bit SIMD small-matrix kernels")]
pub struct Cli {
    /// JSON file with an optional `verify` section; flags override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print detected CPU features and the compiled register backend
    Info,
    /// Check every kernel against scalar references on random inputs
    Verify(VerifyArgs),
    /// Multiply two matrices read from a JSON file
    Multiply(MultiplyArgs),
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long)]
    pub trials: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Largest row/column count for random shapes
    #[arg(long)]
    pub max_dim: Option<usize>,

    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl VerifyArgs {
    pub fn apply(&self, mut config: VerifyConfig) -> VerifyConfig {
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_dim) = self.max_dim {
            config.max_dim = max_dim;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        config
    }
}

#[derive(Args)]
pub struct MultiplyArgs {
    /// `{ "lhs": {rows, cols, data}, "rhs": {rows, cols, data} }`
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = ElementType::F32)]
    pub precision: ElementType,
}
