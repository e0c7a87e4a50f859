//! Error types shared across service boundaries.
//!
//! Each service module additionally defines its own narrow `thiserror` enum
//! for its internal failure modes (`catalog::CatalogError`,
//! `order::OrderError`); this module holds only [`RpcError`], the
//! classification the frontend's replication coordinator needs to decide
//! between "retry against a new leader" and "surface 500 to the client".

use thiserror::Error;

/// Outcome of an internal RPC call (frontend → catalog/order, or
/// order → catalog).
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection refused / reset / DNS failure — the peer process is down.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete within the configured deadline.
    #[error("upstream call timed out")]
    Timeout,

    /// The peer answered but with a non-success HTTP status or a body that
    /// doesn't decode — the peer is alive but something is logically wrong.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl RpcError {
    /// Transient failures (§4.3, §7): these and only these trigger
    /// leader re-election and a single retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, RpcError::Unavailable(_) | RpcError::Timeout)
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RpcError::Timeout
        } else if err.is_connect() {
            RpcError::Unavailable(err.to_string())
        } else {
            RpcError::Upstream(err.to_string())
        }
    }
}
