//! Locality-preferring replica discovery and read pooling for
//! sentinel-coordinated key-value clusters.
//!
//! Given a logical cluster name and a set of sentinel addresses, this crate
//! discovers the cluster's read replicas, selects one preferring a replica
//! on the caller's own host, and orchestrates a dedicated read pool next to
//! the failover-aware master pool. When no replica is usable, reads fall
//! back to the master pool transparently — partial sentinel or replica
//! unavailability never takes the client down.
//!
//! # Features
//!
//! - **Locality-first selection**: a replica on the local host beats every
//!   remote candidate and short-circuits the sentinel scan
//! - **Deterministic fallback**: sentinels are scanned in stable sorted
//!   order and the first non-local candidate wins when nothing is local
//! - **Graceful degradation**: per-sentinel failures are logged and
//!   skipped; a fully failed discovery aliases reads to the master pool
//! - **Capability seams**: sentinel access and pooling are traits, so any
//!   store client plugs in and the bundled mocks drive tests
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vedette_pool::{ClusterConfig, MasterReplicaPool, SentinelAddr};
//!
//! #[tokio::main]
//! async fn main() -> vedette_pool::Result<()> {
//!     let config = ClusterConfig::builder()
//!         .with_cluster("sessions")
//!         .with_sentinels([
//!             SentinelAddr::new("sentinel-a.internal", 26379),
//!             SentinelAddr::new("sentinel-b.internal", 26379),
//!         ])
//!         .with_database(2)
//!         .build()?;
//!
//!     // sentinel client, master provider, and pool factory come from your
//!     // store client crate
//!     let pool = MasterReplicaPool::connect(config, &sentinel, &provider, &factory).await?;
//!
//!     let read = pool.read_connection().await?;
//!     let write = pool.master_connection().await?;
//!
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                MasterReplicaPool (Public API)               │
//! │  .read_connection() │ .master_connection() │ .shutdown()    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Replica Discovery                         │
//! │   Sequential sentinel scan │ Local-host preference          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   Capability Traits                         │
//! │   SentinelClient │ MasterPoolProvider │ ReplicaPoolFactory  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod discovery;
mod endpoint;
mod error;
pub mod mock;
mod pool;
mod sentinel;

// Public API exports
pub use client::MasterReplicaPool;
pub use config::{ClusterConfig, ClusterConfigBuilder, PoolSettings};
pub use discovery::{DiscoveryResult, discover_replicas, local_host_address};
pub use endpoint::{Endpoint, SentinelAddr};
pub use error::{PoolError, Result};
pub use pool::{ConnectionPool, MasterPoolProvider, ReplicaPoolFactory};
pub use sentinel::{FIELD_IP, FIELD_PORT, ReplicaRecord, SentinelClient, SentinelSession};
