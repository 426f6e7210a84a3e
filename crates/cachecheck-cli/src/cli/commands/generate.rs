//! Generate random workload files.
//!
//! # Usage
//! ```bash
//! cachecheck generate --outdir tests/tests --tests 50 --seed 7
//! cachecheck generate --min-cache 2 --max-cache 8 --min-n 0 --max-n 20
//! ```

use anyhow::Context;
use cachecheck_core::GeneratorConfig;
use clap::Args;
use std::path::PathBuf;

use crate::exit_codes::EXIT_SUCCESS;

#[derive(Args, Debug, Clone)]
#[command(about = "Generate random workload files")]
pub struct GenerateArgs {
    /// Output directory, created if missing
    #[arg(long, default_value = "tests/tests")]
    pub outdir: PathBuf,

    /// Number of workloads to write
    #[arg(long = "tests", default_value_t = 10)]
    pub count: usize,

    #[arg(long, default_value_t = 1)]
    pub min_cache: u64,

    #[arg(long, default_value_t = 64)]
    pub max_cache: u64,

    /// Minimum sequence length
    #[arg(long, default_value_t = 50)]
    pub min_n: u64,

    /// Maximum sequence length
    #[arg(long, default_value_t = 500)]
    pub max_n: u64,

    /// Minimum key-space size (keys are drawn from [0, space))
    #[arg(long, default_value_t = 4)]
    pub min_key: u64,

    #[arg(long, default_value_t = 200)]
    pub max_key: u64,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

impl GenerateArgs {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            count: self.count,
            cache: (self.min_cache, self.max_cache),
            len: (self.min_n, self.max_n),
            key_space: (self.min_key, self.max_key),
            seed: self.seed,
        }
    }
}

pub fn run(args: GenerateArgs) -> anyhow::Result<i32> {
    let written = cachecheck_core::generate(&args.config(), &args.outdir)
        .with_context(|| format!("failed to write workloads to {}", args.outdir.display()))?;
    println!(
        "Generated {} tests in {}",
        written.len(),
        args.outdir.display()
    );
    Ok(EXIT_SUCCESS)
}
