//! Frontend: HTTP surface, LRU lookup cache, and the Order cluster's
//! leader/replication manager (spec §4.3).

pub mod cache;
pub mod handlers;
pub mod replication;
pub mod server;
pub mod types;

pub use server::{AppState, build};
