//! Joins a facility/department/bed location tree with workspace records into
//! one denormalized view, fetching both through a pluggable query client.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod extract;
pub mod gate;
pub mod join;
pub mod logging;
pub mod model;
pub mod options;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod queries;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    logging::init(cli.verbose);
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_missing_payload() {
        let result = run(["wardview", "compose", "--locations", "/nonexistent/locations.json"]);
        assert!(result.unwrap_err().contains("Failed to read"));
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["wardview", "unknown"]);
        assert!(result.is_err());
    }
}
