//! Synthetic workload generator.
//!
//! Writes `count` uniformly random workloads as `test_000001.txt` onward.
//! With a seed the output is reproducible byte for byte.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::workload::{workload_file_name, Workload};

/// Inclusive `(min, max)` ranges for the generated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub count: usize,
    pub cache: (u64, u64),
    pub len: (u64, u64),
    /// Size of the key space; keys are drawn from `[0, space)`.
    pub key_space: (u64, u64),
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 10,
            cache: (1, 64),
            len: (50, 500),
            key_space: (4, 200),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Swap inverted ranges and lift cache and key-space minimums to 1.
    pub fn sanitized(&self) -> Self {
        let ordered = |(lo, hi): (u64, u64)| if lo > hi { (hi, lo) } else { (lo, hi) };
        let at_least_one = |(lo, hi): (u64, u64)| (lo.max(1), hi.max(1));
        Self {
            count: self.count,
            cache: at_least_one(ordered(self.cache)),
            len: ordered(self.len),
            key_space: at_least_one(ordered(self.key_space)),
            seed: self.seed,
        }
    }
}

/// One random workload drawn from already-sanitized ranges.
pub fn generate_workload<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Workload {
    let capacity = rng.gen_range(config.cache.0..=config.cache.1);
    let len = rng.gen_range(config.len.0..=config.len.1);
    let space = rng.gen_range(config.key_space.0..=config.key_space.1);
    let keys = (0..len).map(|_| rng.gen_range(0..space)).collect();
    Workload::new(capacity, keys)
}

/// Write the workloads into `outdir`, creating it if needed.
pub fn generate(config: &GeneratorConfig, outdir: &Path) -> io::Result<Vec<PathBuf>> {
    let config = config.sanitized();
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    fs::create_dir_all(outdir)?;
    let mut written = Vec::with_capacity(config.count);
    for i in 1..=config.count {
        let workload = generate_workload(&config, &mut rng);
        let path = outdir.join(workload_file_name(i));
        fs::write(&path, workload.to_line())?;
        debug!(path = %path.display(), capacity = workload.capacity, len = workload.len(), "wrote workload");
        written.push(path);
    }
    Ok(written)
}
