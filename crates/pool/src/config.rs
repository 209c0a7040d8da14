//! Cluster and pool configuration with builder pattern.
//!
//! Two layers:
//! - [`PoolSettings`]: the opaque, cloneable settings handed to the pool
//!   capabilities. This crate never interprets them beyond reading the
//!   request timeout and stamping a diagnostic label on the read pool's
//!   clone.
//! - [`ClusterConfig`]: what the orchestrator needs — cluster name, sentinel
//!   set, database index, pool settings, and an optional local-address
//!   override for NAT/container deployments where self-detection reports
//!   the wrong address.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::{
    endpoint::SentinelAddr,
    error::{ConfigSnafu, Result},
};

/// Default request timeout for store operations (2 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default connection establishment timeout (2 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default maximum number of pooled connections.
const DEFAULT_MAX_SIZE: usize = 8;

/// Connect timeout multiplier for the master pool, tolerating sentinel
/// round-trips during startup failover discovery.
pub(crate) const MASTER_CONNECT_TIMEOUT_MULT: u32 = 5;

/// Opaque connection pool settings consumed by the pool capabilities.
///
/// Cloneable by design: the orchestrator clones these for the read pool and
/// stamps the clone with a diagnostic label, leaving the master pool's
/// settings untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct PoolSettings {
    /// Maximum number of pooled connections.
    #[builder(default = DEFAULT_MAX_SIZE)]
    pub max_size: usize,

    /// Connections kept open while idle.
    #[builder(default = 0)]
    pub min_idle: usize,

    /// Request timeout for operations on checked-out connections.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Connection establishment timeout.
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,

    /// Diagnostic name for the pool, surfaced in the collaborator's own
    /// instrumentation. Set by the orchestrator on the read pool's clone.
    pub label: Option<String>,
}

impl PoolSettings {
    /// Returns a copy of these settings carrying the given diagnostic label.
    #[must_use]
    pub fn labeled(&self, label: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.label = Some(label.into());
        copy
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for a [`MasterReplicaPool`](crate::MasterReplicaPool).
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Logical name of the monitored master/replica group.
    pub(crate) cluster: String,

    /// Sentinels to query, in stable scan order.
    pub(crate) sentinels: Vec<SentinelAddr>,

    /// Logical database index baked into every discovered endpoint.
    pub(crate) database: u32,

    /// Settings for both the master pool and the read pool clone.
    pub(crate) pool: PoolSettings,

    /// Local address override; `None` means detect automatically.
    pub(crate) local_host: Option<String>,
}

impl ClusterConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ClusterConfigBuilder {
        ClusterConfigBuilder::default()
    }

    /// Returns the monitored cluster name.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Returns the sentinel addresses in scan order (sorted, deduplicated).
    #[must_use]
    pub fn sentinels(&self) -> &[SentinelAddr] {
        &self.sentinels
    }

    /// Returns the logical database index.
    #[must_use]
    pub fn database(&self) -> u32 {
        self.database
    }

    /// Returns the pool settings.
    #[must_use]
    pub fn pool(&self) -> &PoolSettings {
        &self.pool
    }

    /// Returns the local address override, if configured.
    #[must_use]
    pub fn local_host(&self) -> Option<&str> {
        self.local_host.as_deref()
    }
}

/// Builder for [`ClusterConfig`].
#[derive(Debug, Default)]
pub struct ClusterConfigBuilder {
    cluster: Option<String>,
    sentinels: Vec<SentinelAddr>,
    database: u32,
    pool: Option<PoolSettings>,
    local_host: Option<String>,
}

impl ClusterConfigBuilder {
    /// Sets the monitored cluster name.
    #[must_use]
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Adds one sentinel address.
    #[must_use]
    pub fn with_sentinel(mut self, address: SentinelAddr) -> Self {
        self.sentinels.push(address);
        self
    }

    /// Adds sentinel addresses.
    ///
    /// The input is treated as a set: `build` sorts and deduplicates, so
    /// insertion order carries no meaning.
    #[must_use]
    pub fn with_sentinels<I>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = SentinelAddr>,
    {
        self.sentinels.extend(addresses);
        self
    }

    /// Sets the logical database index (defaults to 0).
    #[must_use]
    pub fn with_database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    /// Sets the pool settings (defaults to [`PoolSettings::default`]).
    #[must_use]
    pub fn with_pool_settings(mut self, pool: PoolSettings) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Overrides local address detection with a fixed address.
    #[must_use]
    pub fn with_local_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = Some(host.into());
        self
    }

    /// Validates and builds the configuration.
    ///
    /// Sorts and deduplicates the sentinel addresses into the stable scan
    /// order discovery relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The cluster name is missing or empty
    /// - No sentinel address was provided
    /// - A pool timeout is zero
    /// - The local-host override is empty
    pub fn build(self) -> Result<ClusterConfig> {
        let cluster = self
            .cluster
            .ok_or_else(|| ConfigSnafu { message: "cluster name is required" }.build())?;
        ensure!(!cluster.is_empty(), ConfigSnafu { message: "cluster name cannot be empty" });

        ensure!(
            !self.sentinels.is_empty(),
            ConfigSnafu { message: "at least one sentinel address is required" }
        );

        let mut sentinels = self.sentinels;
        sentinels.sort();
        sentinels.dedup();

        let pool = self.pool.unwrap_or_default();
        ensure!(!pool.timeout.is_zero(), ConfigSnafu { message: "pool timeout cannot be zero" });
        ensure!(
            !pool.connect_timeout.is_zero(),
            ConfigSnafu { message: "pool connect_timeout cannot be zero" }
        );

        if let Some(host) = &self.local_host {
            ensure!(
                !host.is_empty(),
                ConfigSnafu { message: "local host override cannot be empty" }
            );
        }

        Ok(ClusterConfig {
            cluster,
            sentinels,
            database: self.database,
            pool,
            local_host: self.local_host,
        })
    }
}
