//! Adapters implementing the query port.

pub mod live;
pub mod recording;
pub mod replaying;
