use clap::Parser;
use namedrop::cli::{Args, RunRequest, run_cli};
use namedrop::logging;
use namedrop::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    match run_cli(args.command(), &RunRequest::from(&args)) {
        Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
