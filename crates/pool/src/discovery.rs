//! Locality-preferring replica discovery.
//!
//! Discovery asks each configured sentinel which replicas the named cluster
//! has and reports a selection preferring the replica that lives on the same
//! host as the caller. Reads against a colocated replica skip the network
//! entirely, so a local match beats every remote candidate.
//!
//! Scan semantics:
//!
//! 1. Sentinels are visited strictly in the order given (the configuration
//!    boundary sorts them, making outcomes deterministic).
//! 2. A replica record whose host equals the local address ends the scan
//!    immediately. All sentinels in a healthy deployment report identical
//!    topology, so the first agreeing source is authoritative and further
//!    queries are wasted work.
//! 3. Non-local replicas accumulate as candidates, deduplicated by
//!    `(host, port)` in first-seen order.
//! 4. Per-sentinel failures (unreachable, query error, empty reply) are
//!    logged and skipped; partial sentinel unavailability never aborts the
//!    scan.
//!
//! Discovery is infallible by signature: every degraded outcome collapses to
//! an empty [`DiscoveryResult`], which callers answer with the master-pool
//! fallback. It runs once per orchestrator construction; there is no
//! periodic refresh.

use std::collections::HashSet;

use snafu::OptionExt;
use tokio::net::lookup_host;
use tracing::{debug, warn};

use crate::{
    endpoint::{Endpoint, SentinelAddr},
    error::{LocalHostSnafu, Result},
    sentinel::{FIELD_IP, FIELD_PORT, ReplicaRecord, SentinelClient, SentinelSession},
};

/// Outcome of one discovery scan.
///
/// `selected` is populated only when a replica on the local host was found;
/// it never appears among the candidates. Candidates are the non-local
/// replicas seen before the scan stopped, deduplicated by `(host, port)` in
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryResult {
    selected: Option<Endpoint>,
    candidates: Vec<Endpoint>,
}

impl DiscoveryResult {
    /// Returns the local-host replica, if one was found.
    #[must_use]
    pub fn selected(&self) -> Option<&Endpoint> {
        self.selected.as_ref()
    }

    /// Returns the non-local candidates in first-seen order.
    #[must_use]
    pub fn candidates(&self) -> &[Endpoint] {
        &self.candidates
    }

    /// Returns the endpoint a read pool should bind to: the local-host
    /// replica when one was found, otherwise the first candidate.
    #[must_use]
    pub fn preferred(&self) -> Option<&Endpoint> {
        self.selected.as_ref().or_else(|| self.candidates.first())
    }

    /// Returns true when the scan found nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_none() && self.candidates.is_empty()
    }
}

/// Scans sentinels for replicas of `cluster`, preferring one on `local_host`.
///
/// `local_host` is the already-resolved local address, or `None` when
/// resolution failed upstream — in that case the scan is skipped entirely
/// and the caller falls back to the master pool. That policy matches the
/// behavior this crate replaces: the local address is resolved before any
/// sentinel is contacted, so no candidate is ever collected under a failed
/// resolution.
///
/// `database` is baked into every constructed endpoint; it never affects
/// endpoint identity.
pub async fn discover_replicas<C>(
    client: &C,
    cluster: &str,
    sentinels: &[SentinelAddr],
    local_host: Option<&str>,
    database: u32,
) -> DiscoveryResult
where
    C: SentinelClient,
{
    let Some(local) = local_host else {
        warn!(cluster, "Local address unresolved; skipping replica discovery");
        return DiscoveryResult::default();
    };

    let mut candidates: Vec<Endpoint> = Vec::new();
    let mut seen: HashSet<Endpoint> = HashSet::new();

    for address in sentinels {
        let mut session = match client.connect(address).await {
            Ok(session) => session,
            Err(e) => {
                warn!(sentinel = %address, error = %e, "Sentinel unreachable; trying next");
                continue;
            },
        };

        let outcome = session.replicas(cluster).await;
        session.close().await;

        let records = match outcome {
            Ok(records) if records.is_empty() => {
                warn!(sentinel = %address, cluster, "Sentinel reported no replicas; trying next");
                continue;
            },
            Ok(records) => records,
            Err(e) => {
                warn!(sentinel = %address, error = %e, "Replica query failed; trying next");
                continue;
            },
        };

        for record in records {
            let Some(endpoint) = record_endpoint(&record, database) else {
                warn!(sentinel = %address, ?record, "Skipping malformed replica record");
                continue;
            };

            if endpoint.host == local {
                debug!(replica = %endpoint, cluster, "Found replica on the local host");
                return DiscoveryResult { selected: Some(endpoint), candidates };
            }

            if seen.insert(endpoint.clone()) {
                candidates.push(endpoint);
            }
        }
    }

    debug!(cluster, candidates = candidates.len(), "No local replica; scan exhausted");
    DiscoveryResult { selected: None, candidates }
}

/// Resolves the address replicas must match to count as local.
///
/// Resolution order: the `override_host` from configuration, then the
/// `HOSTNAME`/`HOST` environment variables resolved to an IP (IPv4
/// preferred). The override is taken verbatim — deployments behind NAT set
/// it to whatever address sentinels report for the colocated replica.
///
/// # Errors
///
/// Returns [`PoolError::LocalHost`](crate::PoolError::LocalHost) when no
/// source yields an address. Callers treat that as a degraded, non-fatal
/// outcome.
pub async fn local_host_address(override_host: Option<&str>) -> Result<String> {
    if let Some(host) = override_host {
        return Ok(host.to_owned());
    }

    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .ok()
        .filter(|name| !name.is_empty())
        .context(LocalHostSnafu { message: "neither HOSTNAME nor HOST is set" })?;

    let addresses: Vec<_> = lookup_host((hostname.as_str(), 0))
        .await
        .map_err(|e| {
            LocalHostSnafu { message: format!("cannot resolve local hostname '{hostname}': {e}") }
                .build()
        })?
        .map(|addr| addr.ip())
        .collect();

    let ip = addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .context(LocalHostSnafu {
            message: format!("no addresses found for local hostname '{hostname}'"),
        })?;

    Ok(ip.to_string())
}

/// Builds an endpoint from one replica record, or `None` when the record is
/// malformed (missing or empty host, missing or unparseable port).
fn record_endpoint(record: &ReplicaRecord, database: u32) -> Option<Endpoint> {
    let host = record.get(FIELD_IP).filter(|host| !host.is_empty())?;
    let port = record.get(FIELD_PORT)?.parse::<u16>().ok()?;

    Some(Endpoint::new(host.clone(), port, database))
}
