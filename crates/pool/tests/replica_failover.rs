//! End-to-end orchestration tests against the bundled mock capabilities.
//!
//! Every test drives `MasterReplicaPool::connect` through scripted
//! sentinels and counting pools, covering the full selection/fallback
//! matrix without touching the network.
//!
//! ## Test Categories
//!
//! - **Selection**: local-host priority, short-circuiting, deterministic
//!   candidate fallback
//! - **Degradation**: failing sentinels, empty discovery, master aliasing
//! - **Construction**: settings cloning/labeling, extended master connect
//!   timeout, fatal factory failures
//! - **Lifecycle**: checkout routing, teardown ordering and exactly-once
//!   release

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use vedette_pool::{
    ClusterConfig, Endpoint, MasterReplicaPool, PoolError, PoolSettings, SentinelAddr,
    mock::{
        MASTER_ORIGIN, MockMasterProvider, MockPool, MockPoolFactory, MockSentinel,
        SentinelScript, replica_record,
    },
};

// ============================================================================
// Helpers
// ============================================================================

/// Address sentinels report for the replica colocated with the test client.
const LOCAL: &str = "10.0.0.9";

fn sentinel_a() -> SentinelAddr {
    SentinelAddr::new("sentinel-a.internal", 26379)
}

fn sentinel_b() -> SentinelAddr {
    SentinelAddr::new("sentinel-b.internal", 26379)
}

fn sentinel_c() -> SentinelAddr {
    SentinelAddr::new("sentinel-c.internal", 26379)
}

/// One mock of each capability, wired through `connect`.
struct Fixture {
    sentinel: MockSentinel,
    provider: MockMasterProvider,
    factory: MockPoolFactory,
}

impl Fixture {
    fn new() -> Self {
        Self {
            sentinel: MockSentinel::new(),
            provider: MockMasterProvider::new(),
            factory: MockPoolFactory::new(),
        }
    }

    async fn connect(
        &self,
        config: ClusterConfig,
    ) -> vedette_pool::Result<MasterReplicaPool<MockPool>> {
        MasterReplicaPool::connect(config, &self.sentinel, &self.provider, &self.factory).await
    }
}

/// Config with the local-host override set, keeping tests hermetic.
fn config(sentinels: &[SentinelAddr]) -> ClusterConfig {
    ClusterConfig::builder()
        .with_cluster("sessions")
        .with_sentinels(sentinels.iter().cloned())
        .with_local_host(LOCAL)
        .build()
        .expect("valid config")
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn local_replica_preferred_over_candidates() {
    let fx = Fixture::new();
    fx.sentinel.script(
        sentinel_a(),
        SentinelScript::Replicas(vec![
            replica_record("10.0.0.5", 6380),
            replica_record(LOCAL, 6380),
        ]),
    );

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();

    assert_eq!(pool.replica_endpoint(), Some(&Endpoint::new(LOCAL, 6380, 0)));
    assert!(pool.has_replica_pool());
}

#[tokio::test]
async fn local_match_short_circuits_remaining_sentinels() {
    let fx = Fixture::new();
    fx.sentinel.script(sentinel_a(), SentinelScript::Unreachable("connection refused".into()));
    fx.sentinel.script(
        sentinel_b(),
        SentinelScript::Replicas(vec![
            replica_record(LOCAL, 6380),
            replica_record("10.0.0.5", 6380),
        ]),
    );
    fx.sentinel
        .script(sentinel_c(), SentinelScript::Replicas(vec![replica_record("10.0.0.6", 6380)]));

    let pool = fx.connect(config(&[sentinel_a(), sentinel_b(), sentinel_c()])).await.unwrap();

    assert_eq!(pool.replica_endpoint(), Some(&Endpoint::new(LOCAL, 6380, 0)));
    // A failed to connect, B answered, C was never contacted.
    assert_eq!(fx.sentinel.queried(), vec![sentinel_b()]);
    assert_eq!(fx.sentinel.connect_attempts(), vec![sentinel_a(), sentinel_b()]);
}

#[tokio::test]
async fn non_local_candidate_selected_when_no_local_match() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record("10.0.0.5", 6380)]));
    fx.sentinel
        .script(sentinel_b(), SentinelScript::Replicas(vec![replica_record("10.0.0.6", 6380)]));

    let pool = fx.connect(config(&[sentinel_a(), sentinel_b()])).await.unwrap();

    // First candidate in scan order wins; the scan still visits every
    // sentinel because only a local match short-circuits.
    assert_eq!(pool.replica_endpoint(), Some(&Endpoint::new("10.0.0.5", 6380, 0)));
    assert_eq!(fx.sentinel.queried(), vec![sentinel_a(), sentinel_b()]);

    let conn = pool.read_connection().await.unwrap();
    assert_eq!(conn.origin(), "10.0.0.5:6380/0");
}

#[tokio::test]
async fn database_index_flows_into_selected_endpoint() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let cfg = ClusterConfig::builder()
        .with_cluster("sessions")
        .with_sentinel(sentinel_a())
        .with_database(2)
        .with_local_host(LOCAL)
        .build()
        .unwrap();
    let pool = fx.connect(cfg).await.unwrap();

    let endpoint = pool.replica_endpoint().unwrap();
    assert_eq!(endpoint.database, 2);
    assert_eq!(endpoint.to_string(), "10.0.0.9:6380/2");
}

// ============================================================================
// Degradation
// ============================================================================

#[tokio::test]
async fn all_sentinels_failing_falls_back_to_master() {
    let fx = Fixture::new();
    fx.sentinel.script(sentinel_a(), SentinelScript::Unreachable("connection refused".into()));
    fx.sentinel.script(sentinel_b(), SentinelScript::Unreachable("connection refused".into()));

    let pool = fx.connect(config(&[sentinel_a(), sentinel_b()])).await.unwrap();

    assert_eq!(pool.replica_endpoint(), None);
    assert!(!pool.has_replica_pool());
    assert!(fx.factory.requests().is_empty());

    let conn = pool.read_connection().await.unwrap();
    assert_eq!(conn.origin(), MASTER_ORIGIN);
}

#[tokio::test]
async fn replica_endpoint_is_stable_across_calls() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();
    let queried = fx.sentinel.queried().len();

    let first = pool.replica_endpoint().cloned();
    let _ = pool.read_connection().await.unwrap();
    let second = pool.replica_endpoint().cloned();
    let third = pool.replica_endpoint().cloned();

    assert_eq!(first, second);
    assert_eq!(second, third);
    // No re-discovery after construction.
    assert_eq!(fx.sentinel.queried().len(), queried);
}

#[tokio::test]
async fn sentinel_sessions_closed_after_discovery() {
    let fx = Fixture::new();
    fx.sentinel.script(sentinel_a(), SentinelScript::QueryError("read timed out".into()));
    fx.sentinel
        .script(sentinel_b(), SentinelScript::Replicas(vec![replica_record("10.0.0.5", 6380)]));

    fx.connect(config(&[sentinel_a(), sentinel_b()])).await.unwrap();

    assert_eq!(fx.sentinel.sessions_opened(), 2);
    assert_eq!(fx.sentinel.sessions_closed(), 2);
}

// ============================================================================
// Construction
// ============================================================================

#[tokio::test]
async fn read_pool_settings_labeled_with_endpoint() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let cfg = ClusterConfig::builder()
        .with_cluster("sessions")
        .with_sentinel(sentinel_a())
        .with_pool_settings(PoolSettings::builder().max_size(16).build())
        .with_local_host(LOCAL)
        .build()
        .unwrap();
    fx.connect(cfg).await.unwrap();

    // The factory gets a labeled clone; the master provider's settings stay
    // untouched.
    let request = &fx.factory.requests()[0];
    assert_eq!(request.endpoint, Endpoint::new(LOCAL, 6380, 0));
    assert_eq!(request.settings.label.as_deref(), Some("10.0.0.9:6380/0"));
    assert_eq!(request.settings.max_size, 16);
    assert_eq!(fx.provider.request().unwrap().settings.label, None);
}

#[tokio::test]
async fn master_pool_uses_extended_connect_timeout() {
    let fx = Fixture::new();
    fx.sentinel.script(sentinel_a(), SentinelScript::Unreachable("connection refused".into()));

    let cfg = ClusterConfig::builder()
        .with_cluster("sessions")
        .with_sentinel(sentinel_a())
        .with_pool_settings(PoolSettings::builder().timeout(Duration::from_secs(3)).build())
        .with_local_host(LOCAL)
        .build()
        .unwrap();
    fx.connect(cfg).await.unwrap();

    let request = fx.provider.request().unwrap();
    assert_eq!(request.cluster, "sessions");
    assert_eq!(request.sentinels, vec![sentinel_a()]);
    assert_eq!(request.connect_timeout, Duration::from_secs(15));
}

#[tokio::test]
async fn factory_failure_after_selection_is_fatal() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));
    fx.factory.fail_with("connection refused");

    let err = fx.connect(config(&[sentinel_a()])).await.unwrap_err();

    match err {
        PoolError::ReplicaPoolConstruction { endpoint, message, .. } => {
            assert_eq!(endpoint, Endpoint::new(LOCAL, 6380, 0));
            assert!(message.contains("connection refused"));
        },
        other => panic!("expected ReplicaPoolConstruction, got: {other}"),
    }
}

#[tokio::test]
async fn master_provider_failure_propagates() {
    let fx = Fixture::new();
    fx.provider.fail_with("sentinel quorum unavailable");

    let err = fx.connect(config(&[sentinel_a()])).await.unwrap_err();

    assert!(matches!(err, PoolError::Pool { .. }));
    // The master pool opens before discovery, so no sentinel was contacted.
    assert!(fx.sentinel.connect_attempts().is_empty());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn reads_route_to_replica_pool_when_selected() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();
    let master = fx.provider.pool().unwrap();

    let read = pool.read_connection().await.unwrap();
    assert_eq!(read.origin(), "10.0.0.9:6380/0");
    assert_eq!(master.checkouts(), 0);

    let write = pool.master_connection().await.unwrap();
    assert_eq!(write.origin(), MASTER_ORIGIN);
    assert_eq!(master.checkouts(), 1);
}

#[tokio::test]
async fn checkout_errors_propagate_unchanged() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();
    fx.factory.last_pool().unwrap().fail_checkout("pool exhausted");

    let err = pool.read_connection().await.unwrap_err();
    match err {
        PoolError::Pool { message, .. } => assert_eq!(message, "pool exhausted"),
        other => panic!("expected Pool, got: {other}"),
    }

    // The master pool is unaffected.
    assert!(pool.master_connection().await.is_ok());
}

#[tokio::test]
async fn aliased_shutdown_releases_master_exactly_once() {
    let fx = Fixture::new();
    fx.sentinel.script(sentinel_a(), SentinelScript::Unreachable("connection refused".into()));

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();
    let master = fx.provider.pool().unwrap();
    assert!(fx.factory.last_pool().is_none());

    pool.shutdown().await;

    assert_eq!(master.shutdowns(), 1);
}

#[tokio::test]
async fn dedicated_shutdown_releases_both_pools() {
    let fx = Fixture::new();
    fx.sentinel
        .script(sentinel_a(), SentinelScript::Replicas(vec![replica_record(LOCAL, 6380)]));

    let pool = fx.connect(config(&[sentinel_a()])).await.unwrap();
    let master = fx.provider.pool().unwrap();
    let replica = fx.factory.last_pool().unwrap();

    pool.shutdown().await;

    assert_eq!(master.shutdowns(), 1);
    assert_eq!(replica.shutdowns(), 1);
}
