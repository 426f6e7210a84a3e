use anyhow::Context;
use cachecheck_core::{Harness, RunReport};
use tracing::info;

use super::report_fatal;
use crate::cli::args::RunArgs;

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let config = cachecheck_core::HarnessConfig {
        stop_on_fail: args.stop_on_fail,
        verbose: args.verbose,
        ..args.harness.harness_config()
    };
    let requests = args.harness.policy_requests();
    let resolver = args.harness.resolver();

    let harness = match Harness::prepare(config, &requests, &resolver) {
        Ok(harness) => harness,
        Err(e) => return Ok(report_fatal(&e)),
    };

    let mut stdout = std::io::stdout().lock();
    let summary = harness
        .run(&mut stdout)
        .await
        .context("failed to write report")?;

    if let Some(path) = &args.json {
        RunReport::new(&summary, harness.bindings(), harness.config())
            .write(path)
            .with_context(|| format!("failed to write JSON summary to {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON summary");
    }

    Ok(summary.exit_code())
}
