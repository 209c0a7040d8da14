//! Error types for discovery and pool orchestration.
//!
//! One enum covers both sides of the seam: variants this crate produces
//! (configuration, replica pool construction) and vocabulary the capability
//! implementations use to report their own failures (sentinel queries,
//! checkout, teardown). Context selectors are public so implementations
//! construct the same variants the orchestrator matches on.

use snafu::{Location, Snafu};

use crate::endpoint::{Endpoint, SentinelAddr};

/// Result type alias for discovery and pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors surfaced by discovery, construction, and checkout.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PoolError {
    /// Configuration validation error.
    #[snafu(display("Configuration error: {message}"))]
    Config {
        /// Error description.
        message: String,
    },

    /// Local address detection failed.
    ///
    /// Non-fatal: the orchestrator logs it and discovery degrades to the
    /// master fallback.
    #[snafu(display("Local address detection failed: {message}"))]
    LocalHost {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A sentinel could not be reached or its replica query failed.
    ///
    /// Produced by [`SentinelClient`](crate::SentinelClient) implementations;
    /// discovery logs the failure and moves on to the next sentinel.
    #[snafu(display("Sentinel {address} unavailable: {message}"))]
    Sentinel {
        /// The sentinel that failed.
        address: SentinelAddr,
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Generic pool failure (construction, checkout exhaustion, timeout).
    ///
    /// Produced by pool capability implementations and propagated unchanged
    /// through checkout accessors.
    #[snafu(display("Pool error: {message}"))]
    Pool {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A read pool could not be built for a selected replica.
    ///
    /// Fatal for construction: a discovered target could not be honored.
    #[snafu(display("Failed to build replica pool for {endpoint}: {message}"))]
    ReplicaPoolConstruction {
        /// The selected endpoint the factory rejected.
        endpoint: Endpoint,
        /// Underlying failure description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A pool release failed during teardown.
    ///
    /// Logged by the orchestrator; teardown continues best-effort.
    #[snafu(display("Pool teardown failed: {message}"))]
    Teardown {
        /// Error description.
        message: String,
    },
}
