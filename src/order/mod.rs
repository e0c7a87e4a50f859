//! Order service: a statically-configured set of replicas, one leader at
//! a time, kept in sync by the Frontend (spec §4.2, §5).

pub mod client;
pub mod model;
pub mod server;
pub mod store;

pub use client::OrderClient;
pub use model::{OrderRecord, OrderType};
pub use store::{OrderError, OrderStore};
