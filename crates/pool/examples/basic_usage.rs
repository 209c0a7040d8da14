//! Basic usage example demonstrating discovery and read/write checkout.
//!
//! Run: `cargo run -p vedette-pool --example basic_usage`
//!
//! This example drives the orchestrator with the bundled mock capabilities:
//! one sentinel is down, one reports a replica colocated with this client,
//! and a third never gets queried thanks to the local-match short-circuit.
//! Swap the mocks for your store client's implementations of the capability
//! traits to run against a real cluster.

// Examples are allowed to use expect/unwrap for brevity
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::disallowed_methods)]

use vedette_pool::{
    ClusterConfig, MasterReplicaPool, SentinelAddr,
    mock::{MockMasterProvider, MockPoolFactory, MockSentinel, SentinelScript, replica_record},
};

#[tokio::main]
async fn main() -> vedette_pool::Result<()> {
    let local_host = "10.0.0.9";

    // -------------------------------------------------------------------------
    // Configuration: cluster name, sentinel set, and the local address the
    // selection should prefer.
    // -------------------------------------------------------------------------
    let config = ClusterConfig::builder()
        .with_cluster("sessions")
        .with_sentinels([
            SentinelAddr::new("sentinel-a.internal", 26379),
            SentinelAddr::new("sentinel-b.internal", 26379),
            SentinelAddr::new("sentinel-c.internal", 26379),
        ])
        .with_database(2)
        .with_local_host(local_host)
        .build()?;

    // -------------------------------------------------------------------------
    // Scripted capabilities: sentinel A is down, B knows a colocated replica,
    // C will never be asked.
    // -------------------------------------------------------------------------
    let sentinel = MockSentinel::new();
    sentinel.script(
        SentinelAddr::new("sentinel-a.internal", 26379),
        SentinelScript::Unreachable("connection refused".into()),
    );
    sentinel.script(
        SentinelAddr::new("sentinel-b.internal", 26379),
        SentinelScript::Replicas(vec![
            replica_record("10.0.0.5", 6380),
            replica_record(local_host, 6380),
        ]),
    );
    sentinel.script(
        SentinelAddr::new("sentinel-c.internal", 26379),
        SentinelScript::Replicas(vec![replica_record("10.0.0.6", 6380)]),
    );

    let provider = MockMasterProvider::new();
    let factory = MockPoolFactory::new();

    // -------------------------------------------------------------------------
    // Construction runs the one-shot discovery scan.
    // -------------------------------------------------------------------------
    let pool = MasterReplicaPool::connect(config, &sentinel, &provider, &factory).await?;

    match pool.replica_endpoint() {
        Some(endpoint) => println!("Reads bound to replica {endpoint}"),
        None => println!("No replica usable; reads fall back to the master pool"),
    }
    println!("Sentinels queried: {:?}", sentinel.queried());

    // -------------------------------------------------------------------------
    // Checkout: reads come from the replica pool, writes from the master.
    // -------------------------------------------------------------------------
    let read = pool.read_connection().await?;
    println!("Read connection from {}", read.origin());

    let write = pool.master_connection().await?;
    println!("Write connection from {}", write.origin());

    pool.shutdown().await;
    println!("Pools released");

    Ok(())
}
