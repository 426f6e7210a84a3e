use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod run;
pub use run::*;

use super::commands::generate::GenerateArgs;

#[derive(Parser)]
#[command(
    name = "cachecheck",
    version,
    about = "Black-box correctness harness for cache-policy simulators"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every policy on every workload and compare with the recorded keys
    Run(RunArgs),
    /// Record key files from reference executables
    Record(RecordArgs),
    /// Generate random workload files
    Generate(GenerateArgs),
    /// Check workload files with the strict parser
    Lint(LintArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LintArgs {
    /// Directory containing test_*.txt workloads
    #[arg(long, default_value = "tests/tests")]
    pub tests_dir: PathBuf,
}
