//! Binary entrypoint for the `wardview` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is fine; the endpoint can also come from flags.
    dotenvy::dotenv().ok();
    match wardview::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
