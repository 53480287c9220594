//! Entry point for the `searchgated` gateway daemon.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match searchgated::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "searchgated::process", %error, "gateway terminated");
            // Telemetry may not be installed when bootstrap fails early.
            drop(writeln!(io::stderr(), "searchgated: {error}"));
            ExitCode::FAILURE
        }
    }
}
