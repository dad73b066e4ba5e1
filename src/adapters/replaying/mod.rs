//! Replaying adapters that replay recorded interactions.

pub mod graphql;

pub use graphql::ReplayingQueryClient;
