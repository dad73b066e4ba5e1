//! Live adapters for real external interactions.

pub mod graphql;

pub use graphql::LiveQueryClient;
