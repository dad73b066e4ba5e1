//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `wardview`.
#[derive(Debug, Parser)]
#[command(name = "wardview", version, about = "Join bed locations with workspaces")]
pub struct Cli {
    /// Log at debug level unless `WARDVIEW_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Join a location payload with a workspace payload and print the rows.
    Compose {
        /// Location query payload (`{"facilities": [...]}`).
        #[arg(long)]
        locations: PathBuf,
        /// Workspace query payload (`{"workspaces": [...]}`).
        #[arg(long)]
        workspaces: Option<PathBuf>,
    },
    /// Print the visit ids a workspace query would ask for.
    VisitIds {
        /// Location query payload (`{"facilities": [...]}`).
        #[arg(long)]
        locations: PathBuf,
        /// Only beds that have conflicting visits.
        #[arg(long)]
        conflicting_only: bool,
        /// Include conflicting visit ids alongside each bed's own.
        #[arg(long)]
        add_conflicting: bool,
    },
    /// Run both queries and print the joined view once it settles.
    Fetch {
        /// GraphQL endpoint URL.
        #[arg(long, env = "WARDVIEW_ENDPOINT")]
        endpoint: Option<String>,
        /// Replay responses from this cassette instead of the network.
        #[arg(long, conflicts_with = "record")]
        cassette: Option<PathBuf>,
        /// Record responses from the endpoint to this cassette.
        #[arg(long)]
        record: Option<PathBuf>,
        /// Pipeline argument (`{locationQuery?, workspaceQuery?, options}`), YAML or JSON.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Input context object, applied as the last option source.
        #[arg(long)]
        context: Option<PathBuf>,
        /// How long to wait for outstanding queries before printing.
        #[arg(long, default_value_t = 10_000)]
        idle_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_compose_subcommand() {
        let cli = Cli::parse_from(["wardview", "compose", "--locations", "l.json"]);
        match cli.command {
            Command::Compose { locations, workspaces } => {
                assert_eq!(locations.to_str(), Some("l.json"));
                assert!(workspaces.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_visit_ids_flags() {
        let cli = Cli::parse_from([
            "wardview",
            "visit-ids",
            "--locations",
            "l.json",
            "--conflicting-only",
        ]);
        assert!(matches!(
            cli.command,
            Command::VisitIds { conflicting_only: true, add_conflicting: false, .. }
        ));
    }

    #[test]
    fn fetch_defaults_idle_timeout() {
        let cli = Cli::parse_from(["wardview", "-v", "fetch", "--cassette", "c.yaml"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Fetch { idle_ms, cassette, .. } => {
                assert_eq!(idle_ms, 10_000);
                assert!(cassette.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cassette_and_record_conflict() {
        let result = Cli::try_parse_from([
            "wardview",
            "fetch",
            "--cassette",
            "a.yaml",
            "--record",
            "b.yaml",
        ]);
        assert!(result.is_err());
    }
}
