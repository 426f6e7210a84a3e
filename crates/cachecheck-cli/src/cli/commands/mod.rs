use super::args::*;

pub mod generate;
pub mod lint;
pub mod record;
pub(crate) mod run;

use cachecheck_core::HarnessError;

use crate::exit_codes::EXIT_SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Record(args) => record::run(args).await,
        Command::Generate(args) => generate::run(args),
        Command::Lint(args) => lint::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Print a fatal configuration error with its hint and map it to its exit code.
pub(crate) fn report_fatal(err: &HarnessError) -> i32 {
    eprintln!("[ERROR] {err}");
    if let Some(hint) = err.hint() {
        eprintln!("{hint}");
    }
    err.exit_code()
}
