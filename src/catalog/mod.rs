//! Catalog service: the single authoritative store of stock records.
//!
//! See spec §4.1. Two operations, `LookupStock` and `UpdateStock`, backed by
//! a map guarded by a multi-reader/single-writer lock, with a background
//! flush and a flush-before-acknowledging-write durability floor.

pub mod client;
pub mod model;
pub mod server;
pub mod store;

pub use client::CatalogClient;
pub use model::Stock;
pub use store::{CatalogError, CatalogStore, UpdateOutcome};
