//! Address value types for replicas and sentinels.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigSnafu, PoolError};

/// A reachable store node: host, port, and the logical database index
/// connections to it should select.
///
/// `Endpoint` is a pure value. Equality and hashing consider only
/// `(host, port)` — the database index is carried for pool construction and
/// never discriminates identity, so two endpoints for the same node compare
/// equal even when they select different databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Logical database index selected by connections to this node.
    pub database: u32,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, database: u32) -> Self {
        Self { host: host.into(), port, database }
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Address of a sentinel to query during discovery.
///
/// Sentinel addresses are supplied as an unordered set; the configuration
/// boundary sorts them into a stable scan order, which is why the type is
/// fully ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SentinelAddr {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl SentinelAddr {
    /// Creates a sentinel address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for SentinelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for SentinelAddr {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s.rsplit_once(':').and_then(|(host, port)| {
            let port = port.parse::<u16>().ok()?;
            if host.is_empty() { None } else { Some(Self::new(host, port)) }
        });

        parsed.ok_or_else(|| {
            ConfigSnafu { message: format!("invalid sentinel address '{s}': expected host:port") }
                .build()
        })
    }
}
