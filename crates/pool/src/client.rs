//! Master/replica pool orchestration.
//!
//! [`MasterReplicaPool`] wires the capabilities together at construction
//! time: the provider builds the failover-aware master pool, discovery runs
//! exactly once, and the factory builds a dedicated read pool when a replica
//! was selected. When discovery comes back empty, reads alias the master
//! pool — construction never fails on a degraded discovery.

use tracing::{debug, info, warn};

use crate::{
    config::{ClusterConfig, MASTER_CONNECT_TIMEOUT_MULT},
    discovery::{discover_replicas, local_host_address},
    endpoint::Endpoint,
    error::{ReplicaPoolConstructionSnafu, Result},
    pool::{ConnectionPool, MasterPoolProvider, ReplicaPoolFactory},
    sentinel::SentinelClient,
};

/// Where read checkouts go.
///
/// `Master` carries no pool of its own, so an aliased read target cannot be
/// torn down twice by construction.
#[derive(Debug)]
enum ReadTarget<P> {
    /// Dedicated pool bound to a discovered replica.
    Replica(P),
    /// Fallback: reads share the master pool.
    Master,
}

/// Connection pool pair for one sentinel-coordinated cluster: the
/// failover-aware master pool for writes plus a locality-preferred replica
/// pool for reads.
///
/// Construction performs the single discovery scan of this object's
/// lifetime; there is no re-selection afterwards. If no replica is usable,
/// reads transparently fall back to the master pool.
///
/// # Example
///
/// ```no_run
/// use vedette_pool::mock::{
///     MockMasterProvider, MockPoolFactory, MockSentinel, SentinelScript, replica_record,
/// };
/// use vedette_pool::{ClusterConfig, MasterReplicaPool, SentinelAddr};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> vedette_pool::Result<()> {
/// let config = ClusterConfig::builder()
///     .with_cluster("sessions")
///     .with_sentinel(SentinelAddr::new("sentinel-a.internal", 26379))
///     .with_local_host("10.0.0.9")
///     .build()?;
///
/// let sentinel = MockSentinel::new();
/// sentinel.script(
///     SentinelAddr::new("sentinel-a.internal", 26379),
///     SentinelScript::Replicas(vec![replica_record("10.0.0.9", 6380)]),
/// );
///
/// let pool = MasterReplicaPool::connect(
///     config,
///     &sentinel,
///     &MockMasterProvider::new(),
///     &MockPoolFactory::new(),
/// )
/// .await?;
///
/// let conn = pool.read_connection().await?;
/// pool.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MasterReplicaPool<P> {
    master: P,
    read: ReadTarget<P>,
    replica: Option<Endpoint>,
}

impl<P: ConnectionPool> MasterReplicaPool<P> {
    /// Builds the pool pair for the configured cluster.
    ///
    /// The master pool is opened first, with a connect timeout of five times
    /// the configured request timeout to tolerate sentinel round-trips
    /// during startup. Discovery then runs once; every degraded outcome
    /// (unresolved local address, unreachable sentinels, no replicas)
    /// collapses to the master fallback and never fails construction.
    ///
    /// # Errors
    ///
    /// - Master pool construction errors propagate unchanged.
    /// - [`PoolError::ReplicaPoolConstruction`](crate::PoolError::ReplicaPoolConstruction)
    ///   when a replica was selected but the factory could not build its
    ///   pool — a discovered target could not be honored.
    pub async fn connect<C, M, F>(
        config: ClusterConfig,
        sentinel: &C,
        provider: &M,
        factory: &F,
    ) -> Result<Self>
    where
        C: SentinelClient,
        M: MasterPoolProvider<Pool = P>,
        F: ReplicaPoolFactory<Pool = P>,
    {
        let connect_timeout = config.pool().timeout * MASTER_CONNECT_TIMEOUT_MULT;
        debug!(cluster = config.cluster(), ?connect_timeout, "Opening master pool");
        let master = provider
            .open(config.pool(), config.cluster(), config.sentinels(), connect_timeout)
            .await?;

        let local_host = match local_host_address(config.local_host()).await {
            Ok(host) => Some(host),
            Err(e) => {
                warn!(error = %e, "Local address detection failed; reads will use the master pool");
                None
            },
        };

        let discovery = discover_replicas(
            sentinel,
            config.cluster(),
            config.sentinels(),
            local_host.as_deref(),
            config.database(),
        )
        .await;

        let (read, replica) = match discovery.preferred() {
            Some(endpoint) => {
                let endpoint = endpoint.clone();
                info!(replica = %endpoint, cluster = config.cluster(), "Connecting read pool");
                let settings = config.pool().labeled(endpoint.to_string());
                let pool = factory.create(&settings, &endpoint).await.map_err(|e| {
                    ReplicaPoolConstructionSnafu {
                        endpoint: endpoint.clone(),
                        message: e.to_string(),
                    }
                    .build()
                })?;
                (ReadTarget::Replica(pool), Some(endpoint))
            },
            None => {
                info!(cluster = config.cluster(), "No replica selected; reads use the master pool");
                (ReadTarget::Master, None)
            },
        };

        Ok(Self { master, read, replica })
    }

    /// Returns the replica endpoint reads are bound to, if discovery
    /// selected one.
    ///
    /// Diagnostic accessor: no side effects, stable for the object's
    /// lifetime.
    #[inline]
    #[must_use]
    pub fn replica_endpoint(&self) -> Option<&Endpoint> {
        self.replica.as_ref()
    }

    /// Returns true when reads go to a dedicated replica pool rather than
    /// aliasing the master pool.
    #[must_use]
    pub fn has_replica_pool(&self) -> bool {
        matches!(self.read, ReadTarget::Replica(_))
    }

    /// Checks out a connection for reads, from the replica pool when one
    /// exists and from the master pool otherwise.
    ///
    /// # Errors
    ///
    /// Checkout errors (exhaustion, timeout) propagate unchanged from the
    /// underlying pool.
    pub async fn read_connection(&self) -> Result<P::Conn> {
        match &self.read {
            ReadTarget::Replica(pool) => pool.checkout().await,
            ReadTarget::Master => self.master.checkout().await,
        }
    }

    /// Checks out a connection from the master pool.
    ///
    /// # Errors
    ///
    /// Checkout errors propagate unchanged from the underlying pool.
    pub async fn master_connection(&self) -> Result<P::Conn> {
        self.master.checkout().await
    }

    /// Releases both pools.
    ///
    /// The master pool is released first, then the read pool when it is a
    /// distinct replica pool. Either release failing is logged and never
    /// prevents the other. Consuming `self` makes a second teardown
    /// unrepresentable; an aliased read target holds no pool of its own, so
    /// the shared pool is released exactly once.
    pub async fn shutdown(self) {
        if let Err(e) = self.master.shutdown().await {
            warn!(error = %e, "Master pool teardown failed");
        }

        if let ReadTarget::Replica(pool) = self.read
            && let Err(e) = pool.shutdown().await
        {
            warn!(error = %e, "Replica pool teardown failed");
        }
    }
}
