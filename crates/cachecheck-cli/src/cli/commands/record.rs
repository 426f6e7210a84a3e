use anyhow::Context;
use cachecheck_core::{record_keys, RecordError, WorkloadListing};

use super::report_fatal;
use crate::cli::args::RecordArgs;
use crate::exit_codes::{EXIT_CASE_FAILURES, EXIT_SUCCESS};

pub async fn run(args: RecordArgs) -> anyhow::Result<i32> {
    let config = args.harness.harness_config();
    if let Err(e) = config.validate() {
        return Ok(report_fatal(&e));
    }

    let workloads = match WorkloadListing::discover(&config.tests_dir) {
        Ok(listing) => listing,
        Err(e) => return Ok(report_fatal(&e)),
    };
    let bindings = match args
        .harness
        .resolver()
        .resolve_all(&args.harness.policy_requests())
    {
        Ok(bindings) => bindings,
        Err(e) => return Ok(report_fatal(&e)),
    };

    println!(
        "Recording keys for {} tests into {}",
        workloads.len(),
        config.keys_dir.display()
    );
    let mut stdout = std::io::stdout().lock();
    match record_keys(
        &workloads,
        &bindings,
        &config.keys_dir,
        config.timeout,
        &mut stdout,
    )
    .await
    {
        Ok(_) => Ok(EXIT_SUCCESS),
        Err(e @ (RecordError::CaseFailed { .. } | RecordError::MultiLine { .. })) => {
            eprintln!("[ERROR] {e}");
            eprintln!("Hint: fix the reference executable; no key file was written for it.");
            Ok(EXIT_CASE_FAILURES)
        }
        Err(e) => Err(e).context("failed to record keys"),
    }
}
