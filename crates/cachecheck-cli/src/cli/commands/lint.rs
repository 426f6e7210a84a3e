use cachecheck_core::WorkloadListing;

use super::report_fatal;
use crate::cli::args::LintArgs;
use crate::exit_codes::{EXIT_CASE_FAILURES, EXIT_SUCCESS};

pub fn run(args: LintArgs) -> anyhow::Result<i32> {
    let listing = match WorkloadListing::discover(&args.tests_dir) {
        Ok(listing) => listing,
        Err(e) => return Ok(report_fatal(&e)),
    };

    let mut invalid = 0usize;
    for file in &listing {
        let parsed = match file.load() {
            Ok(parsed) => parsed,
            Err(e) => return Ok(report_fatal(&e)),
        };
        if let Err(e) = parsed {
            invalid += 1;
            println!("{}: {}", file.name, e);
        }
    }

    if invalid == 0 {
        println!("{} workloads OK", listing.len());
        Ok(EXIT_SUCCESS)
    } else {
        println!("{} of {} workloads invalid", invalid, listing.len());
        Ok(EXIT_CASE_FAILURES)
    }
}
