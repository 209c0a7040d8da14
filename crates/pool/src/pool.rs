//! Connection pool capabilities.
//!
//! Pooling itself is a commodity this crate does not implement. Three traits
//! cover what the orchestrator needs from a pool implementation:
//!
//! - [`ConnectionPool`]: checkout and teardown on an already-built pool.
//! - [`MasterPoolProvider`]: the failover-aware master pool, built once per
//!   orchestrator from the cluster name and sentinel set.
//! - [`ReplicaPoolFactory`]: a dedicated pool for one discovered replica
//!   endpoint.
//!
//! The provider and factory share one pool type so reads can alias the
//! master pool when no replica is usable.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    config::PoolSettings,
    endpoint::{Endpoint, SentinelAddr},
    error::Result,
};

/// An owned pool of connections to one node.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Checked-out connection type.
    type Conn: Send;

    /// Checks out a connection.
    ///
    /// Blocks or suspends per the implementation's own checkout contract.
    ///
    /// # Errors
    ///
    /// Pool-exhaustion and timeout errors surface here and are propagated
    /// unchanged by the orchestrator.
    async fn checkout(&self) -> Result<Self::Conn>;

    /// Releases the pool and every connection it owns.
    ///
    /// Consumes the pool: a released pool cannot be checked out from again.
    ///
    /// # Errors
    ///
    /// Teardown failures are reported so callers can log them; the
    /// orchestrator never propagates them.
    async fn shutdown(self) -> Result<()>;
}

/// Capability building the failover-aware master pool.
///
/// The implementation is expected to run its own master discovery against
/// the sentinel set and keep the pool pointed at the current master across
/// failovers. This crate treats that machinery as a black box.
#[async_trait]
pub trait MasterPoolProvider: Send + Sync {
    /// Pool type produced by [`open`](Self::open).
    type Pool: ConnectionPool;

    /// Builds the master pool for the named cluster.
    ///
    /// `connect_timeout` is passed explicitly because the orchestrator
    /// extends it beyond the configured default to tolerate sentinel
    /// round-trips during startup.
    ///
    /// # Errors
    ///
    /// Construction failure is fatal for the orchestrator and propagates
    /// unchanged.
    async fn open(
        &self,
        settings: &PoolSettings,
        cluster: &str,
        sentinels: &[SentinelAddr],
        connect_timeout: Duration,
    ) -> Result<Self::Pool>;
}

/// Capability building a dedicated pool for one replica endpoint.
#[async_trait]
pub trait ReplicaPoolFactory: Send + Sync {
    /// Pool type produced by [`create`](Self::create).
    type Pool: ConnectionPool;

    /// Builds a pool bound to the given endpoint.
    ///
    /// The settings are a clone of the master pool's settings with the
    /// diagnostic label stamped to the endpoint's rendering.
    ///
    /// # Errors
    ///
    /// Failing to build a pool for a selected endpoint is fatal for
    /// orchestrator construction.
    async fn create(&self, settings: &PoolSettings, endpoint: &Endpoint) -> Result<Self::Pool>;
}
