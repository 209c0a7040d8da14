//! Sentinel query capability.
//!
//! Sentinels monitor the cluster and answer "which replicas does cluster X
//! have right now?". This crate consumes that capability through the traits
//! here; the wire protocol behind them belongs to the implementation.
//!
//! Discovery opens one short-lived session per sentinel, issues a single
//! replica query, and closes the session on success and failure alike.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{endpoint::SentinelAddr, error::Result};

/// Field key carrying a replica's host address in a [`ReplicaRecord`].
pub const FIELD_IP: &str = "ip";

/// Field key carrying a replica's port in a [`ReplicaRecord`].
pub const FIELD_PORT: &str = "port";

/// A single replica as reported by a sentinel.
///
/// Sentinels answer with open field maps; only [`FIELD_IP`] and
/// [`FIELD_PORT`] are consumed here and both are expected to be present.
/// Records missing either field, or carrying an unparseable port, are
/// malformed and skipped by discovery. Extra fields are ignored.
pub type ReplicaRecord = HashMap<String, String>;

/// Client capability for opening sessions to sentinels.
#[async_trait]
pub trait SentinelClient: Send + Sync {
    /// Session type produced by [`connect`](Self::connect).
    type Session: SentinelSession;

    /// Opens a short-lived session to the given sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Sentinel`](crate::PoolError::Sentinel) when the
    /// sentinel cannot be reached. Discovery logs the failure and moves on
    /// to the next sentinel.
    async fn connect(&self, address: &SentinelAddr) -> Result<Self::Session>;
}

/// One open session to a sentinel.
///
/// Sessions are single-use: discovery issues one [`replicas`](Self::replicas)
/// query and then [`close`](Self::close)s the session, whether the query
/// succeeded or not.
#[async_trait]
pub trait SentinelSession: Send {
    /// Requests the replica records known for the named cluster.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Sentinel`](crate::PoolError::Sentinel) when the
    /// query fails; the session is still closed afterwards.
    async fn replicas(&mut self, cluster: &str) -> Result<Vec<ReplicaRecord>>;

    /// Closes the session, releasing its connection.
    async fn close(self);
}
