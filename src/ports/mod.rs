//! Port traits defining external boundaries.
//!
//! The only boundary this crate crosses is the GraphQL fetch layer.
//! Implementations live in `src/adapters/`.

pub mod query;

pub use query::{FetchPolicy, Operation, QueryClient, QueryFuture, QueryRequest};
