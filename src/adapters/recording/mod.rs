//! Recording adapters that capture interactions to cassettes.

pub mod graphql;

pub use graphql::RecordingQueryClient;
