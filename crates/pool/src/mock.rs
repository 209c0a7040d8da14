//! Mock capabilities for exercising discovery and orchestration in tests.
//!
//! Implements every capability trait against scripted in-memory state:
//! sentinels answer from per-address scripts and record the order they were
//! contacted in; pools count checkouts and teardowns and can be told to
//! fail. The mocks live in the library (not behind `cfg(test)`) so
//! downstream crates can drive the orchestrator in their own tests.
//!
//! # Example
//!
//! ```no_run
//! use vedette_pool::mock::{MockSentinel, SentinelScript, replica_record};
//! use vedette_pool::{SentinelAddr, discover_replicas};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sentinel = MockSentinel::new();
//! sentinel.script(
//!     SentinelAddr::new("sentinel-a.internal", 26379),
//!     SentinelScript::Replicas(vec![replica_record("10.0.0.5", 6380)]),
//! );
//!
//! let result = discover_replicas(
//!     &sentinel,
//!     "sessions",
//!     &[SentinelAddr::new("sentinel-a.internal", 26379)],
//!     Some("10.0.0.9"),
//!     0,
//! )
//! .await;
//!
//! assert_eq!(result.candidates().len(), 1);
//! # }
//! ```

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{
    config::PoolSettings,
    endpoint::{Endpoint, SentinelAddr},
    error::{PoolSnafu, Result, SentinelSnafu, TeardownSnafu},
    pool::{ConnectionPool, MasterPoolProvider, ReplicaPoolFactory},
    sentinel::{FIELD_IP, FIELD_PORT, ReplicaRecord, SentinelClient, SentinelSession},
};

/// Origin label carried by connections checked out of a provider-built
/// master pool.
pub const MASTER_ORIGIN: &str = "master";

/// Builds a well-formed replica record for the given host and port.
#[must_use]
pub fn replica_record(ip: &str, port: u16) -> ReplicaRecord {
    ReplicaRecord::from([
        (FIELD_IP.to_string(), ip.to_string()),
        (FIELD_PORT.to_string(), port.to_string()),
    ])
}

/// Scripted outcome for one sentinel address.
#[derive(Debug, Clone)]
pub enum SentinelScript {
    /// The session opens and the replica query reports these records.
    Replicas(Vec<ReplicaRecord>),
    /// The session opens but the replica query fails.
    QueryError(String),
    /// Connecting to the sentinel fails outright.
    Unreachable(String),
}

#[derive(Debug, Default)]
struct SentinelState {
    scripts: HashMap<SentinelAddr, SentinelScript>,
    connect_attempts: Vec<SentinelAddr>,
    queries: Vec<SentinelAddr>,
    sessions_opened: usize,
    sessions_closed: usize,
}

/// Scripted [`SentinelClient`].
///
/// Addresses without a script behave as unreachable, so a forgotten script
/// shows up as a skipped sentinel rather than a panic.
#[derive(Debug, Clone, Default)]
pub struct MockSentinel {
    state: Arc<RwLock<SentinelState>>,
}

impl MockSentinel {
    /// Creates a mock with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the outcome for one sentinel address, replacing any earlier
    /// script for it.
    pub fn script(&self, address: SentinelAddr, script: SentinelScript) {
        self.state.write().scripts.insert(address, script);
    }

    /// Returns every address a connect was attempted to, in order.
    #[must_use]
    pub fn connect_attempts(&self) -> Vec<SentinelAddr> {
        self.state.read().connect_attempts.clone()
    }

    /// Returns every address whose session was actually queried, in order.
    #[must_use]
    pub fn queried(&self) -> Vec<SentinelAddr> {
        self.state.read().queries.clone()
    }

    /// Returns how many sessions were opened.
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.state.read().sessions_opened
    }

    /// Returns how many sessions were closed.
    #[must_use]
    pub fn sessions_closed(&self) -> usize {
        self.state.read().sessions_closed
    }
}

#[async_trait]
impl SentinelClient for MockSentinel {
    type Session = MockSentinelSession;

    async fn connect(&self, address: &SentinelAddr) -> Result<MockSentinelSession> {
        let mut state = self.state.write();
        state.connect_attempts.push(address.clone());

        let script = state
            .scripts
            .get(address)
            .cloned()
            .unwrap_or_else(|| SentinelScript::Unreachable("no script for this sentinel".into()));

        match script {
            SentinelScript::Unreachable(message) => {
                SentinelSnafu { address: address.clone(), message }.fail()
            },
            script => {
                state.sessions_opened += 1;
                Ok(MockSentinelSession {
                    address: address.clone(),
                    script,
                    state: Arc::clone(&self.state),
                })
            },
        }
    }
}

/// One scripted sentinel session produced by [`MockSentinel`].
#[derive(Debug)]
pub struct MockSentinelSession {
    address: SentinelAddr,
    script: SentinelScript,
    state: Arc<RwLock<SentinelState>>,
}

#[async_trait]
impl SentinelSession for MockSentinelSession {
    async fn replicas(&mut self, _cluster: &str) -> Result<Vec<ReplicaRecord>> {
        self.state.write().queries.push(self.address.clone());

        match &self.script {
            SentinelScript::Replicas(records) => Ok(records.clone()),
            SentinelScript::QueryError(message) | SentinelScript::Unreachable(message) => {
                SentinelSnafu { address: self.address.clone(), message: message.clone() }.fail()
            },
        }
    }

    async fn close(self) {
        self.state.write().sessions_closed += 1;
    }
}

#[derive(Debug, Default)]
struct MockPoolState {
    checkouts: AtomicUsize,
    shutdowns: AtomicUsize,
    checkout_error: Mutex<Option<String>>,
    shutdown_error: Mutex<Option<String>>,
}

/// Counting [`ConnectionPool`] whose connections carry their origin label.
#[derive(Debug)]
pub struct MockPool {
    origin: String,
    state: Arc<MockPoolState>,
}

impl MockPool {
    /// Creates a pool whose connections report the given origin.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into(), state: Arc::default() }
    }

    /// Returns a handle observing this pool after ownership moves into the
    /// orchestrator.
    #[must_use]
    pub fn handle(&self) -> MockPoolHandle {
        MockPoolHandle { origin: self.origin.clone(), state: Arc::clone(&self.state) }
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    type Conn = MockConn;

    async fn checkout(&self) -> Result<MockConn> {
        if let Some(message) = self.state.checkout_error.lock().clone() {
            return PoolSnafu { message }.fail();
        }

        let serial = self.state.checkouts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockConn { origin: self.origin.clone(), serial })
    }

    async fn shutdown(self) -> Result<()> {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.state.shutdown_error.lock().clone() {
            return TeardownSnafu { message }.fail();
        }

        Ok(())
    }
}

/// Observer for a [`MockPool`], valid after the pool itself was moved into
/// an orchestrator or shut down.
#[derive(Debug, Clone)]
pub struct MockPoolHandle {
    origin: String,
    state: Arc<MockPoolState>,
}

impl MockPoolHandle {
    /// Returns the origin label of the observed pool.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns how many connections were checked out.
    #[must_use]
    pub fn checkouts(&self) -> usize {
        self.state.checkouts.load(Ordering::SeqCst)
    }

    /// Returns how many times teardown was attempted.
    #[must_use]
    pub fn shutdowns(&self) -> usize {
        self.state.shutdowns.load(Ordering::SeqCst)
    }

    /// Makes every subsequent checkout fail with the given message.
    pub fn fail_checkout(&self, message: impl Into<String>) {
        *self.state.checkout_error.lock() = Some(message.into());
    }

    /// Makes teardown fail with the given message (the attempt is still
    /// counted).
    pub fn fail_shutdown(&self, message: impl Into<String>) {
        *self.state.shutdown_error.lock() = Some(message.into());
    }
}

/// A checked-out mock connection, tagged with the pool it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConn {
    origin: String,
    serial: usize,
}

impl MockConn {
    /// Returns the origin label of the pool this connection came from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the 1-based checkout number within the origin pool.
    #[must_use]
    pub fn serial(&self) -> usize {
        self.serial
    }
}

/// Arguments captured from a [`MasterPoolProvider::open`] call.
#[derive(Debug, Clone)]
pub struct MasterRequest {
    /// Cluster name the master pool was requested for.
    pub cluster: String,
    /// Sentinel addresses handed to the provider.
    pub sentinels: Vec<SentinelAddr>,
    /// Connect timeout handed to the provider.
    pub connect_timeout: Duration,
    /// Pool settings handed to the provider.
    pub settings: PoolSettings,
}

#[derive(Debug, Default)]
struct MasterProviderState {
    request: Mutex<Option<MasterRequest>>,
    pool: Mutex<Option<MockPoolHandle>>,
    fail: Mutex<Option<String>>,
}

/// Scripted [`MasterPoolProvider`] producing [`MockPool`]s labeled
/// [`MASTER_ORIGIN`].
#[derive(Debug, Clone, Default)]
pub struct MockMasterProvider {
    state: Arc<MasterProviderState>,
}

impl MockMasterProvider {
    /// Creates a provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `open` call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.state.fail.lock() = Some(message.into());
    }

    /// Returns the arguments of the `open` call, if one happened.
    #[must_use]
    pub fn request(&self) -> Option<MasterRequest> {
        self.state.request.lock().clone()
    }

    /// Returns a handle to the master pool built by `open`, if any.
    #[must_use]
    pub fn pool(&self) -> Option<MockPoolHandle> {
        self.state.pool.lock().clone()
    }
}

#[async_trait]
impl MasterPoolProvider for MockMasterProvider {
    type Pool = MockPool;

    async fn open(
        &self,
        settings: &PoolSettings,
        cluster: &str,
        sentinels: &[SentinelAddr],
        connect_timeout: Duration,
    ) -> Result<MockPool> {
        if let Some(message) = self.state.fail.lock().clone() {
            return PoolSnafu { message }.fail();
        }

        *self.state.request.lock() = Some(MasterRequest {
            cluster: cluster.to_string(),
            sentinels: sentinels.to_vec(),
            connect_timeout,
            settings: settings.clone(),
        });

        let pool = MockPool::new(MASTER_ORIGIN);
        *self.state.pool.lock() = Some(pool.handle());
        Ok(pool)
    }
}

/// Arguments captured from a [`ReplicaPoolFactory::create`] call.
#[derive(Debug, Clone)]
pub struct FactoryRequest {
    /// Endpoint the pool was requested for.
    pub endpoint: Endpoint,
    /// Pool settings handed to the factory.
    pub settings: PoolSettings,
}

#[derive(Debug, Default)]
struct FactoryState {
    requests: Mutex<Vec<FactoryRequest>>,
    pools: Mutex<Vec<MockPoolHandle>>,
    fail: Mutex<Option<String>>,
}

/// Scripted [`ReplicaPoolFactory`] producing [`MockPool`]s labeled with the
/// endpoint rendering.
#[derive(Debug, Clone, Default)]
pub struct MockPoolFactory {
    state: Arc<FactoryState>,
}

impl MockPoolFactory {
    /// Creates a factory that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create` call fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.state.fail.lock() = Some(message.into());
    }

    /// Returns the arguments of every `create` call, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<FactoryRequest> {
        self.state.requests.lock().clone()
    }

    /// Returns a handle to the most recently created pool, if any.
    #[must_use]
    pub fn last_pool(&self) -> Option<MockPoolHandle> {
        self.state.pools.lock().last().cloned()
    }
}

#[async_trait]
impl ReplicaPoolFactory for MockPoolFactory {
    type Pool = MockPool;

    async fn create(&self, settings: &PoolSettings, endpoint: &Endpoint) -> Result<MockPool> {
        self.state
            .requests
            .lock()
            .push(FactoryRequest { endpoint: endpoint.clone(), settings: settings.clone() });

        if let Some(message) = self.state.fail.lock().clone() {
            return PoolSnafu { message }.fail();
        }

        let pool = MockPool::new(endpoint.to_string());
        self.state.pools.lock().push(pool.handle());
        Ok(pool)
    }
}
