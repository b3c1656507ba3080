//! CLI entrypoint for the dissemination engine.
//!
//! The binary delegates to [`dissem_cli::run`], which loads configuration,
//! parses the command, and writes the dissemination or method listing to
//! stdout.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    dissem_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
