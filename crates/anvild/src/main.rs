//! Entry point for the `anvild` tool server.

use std::io::{self, Write};
use std::process::ExitCode;

use anvild::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let daemon = match bootstrap_with(&SystemConfigLoader, &StructuredHealthReporter::new(), &[]) {
        Ok(daemon) => daemon,
        Err(error) => {
            // Telemetry may not be installed yet.
            report(&error);
            return ExitCode::FAILURE;
        }
    };

    match daemon.serve() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "anvild::main", %error, "tool server stopped");
            report(&error);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &dyn std::error::Error) {
    let _write_result = writeln!(io::stderr().lock(), "anvild: {error}");
}
