//! flow - edit production flow sheets

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = flowsheet::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
