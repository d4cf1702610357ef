//! API connectivity diagnostics.
//!
//! Probes the endpoints the accounts view depends on and reports, for each,
//! the HTTP status or transport error and how long the round trip took.
//! Read-only: nothing here touches the sync hook's state.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::accounts::api::{AccountFilter, AccountsApi};
use crate::http::RequestBuilder;

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx response.
    Reachable { status: u16 },
    /// The server answered, but not with 2xx.
    Rejected { status: u16 },
    /// No response at all.
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Reachable { status } | Self::Rejected { status } => Some(*status),
            Self::Unreachable(_) => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable { status } => write!(f, "OK ({status})"),
            Self::Rejected { status } => write!(f, "HTTP {status}"),
            Self::Unreachable(err) => write!(f, "unreachable: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointProbe {
    /// Short label, e.g. `"list"`.
    pub endpoint: &'static str,
    pub url: String,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiAvailability {
    /// Every probe got a 2xx.
    Available,
    /// The server answered, but at least one endpoint did not succeed.
    Degraded,
    /// No probe got a response.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ConnectivityReport {
    pub checked_at: DateTime<Utc>,
    pub probes: Vec<EndpointProbe>,
}

impl ConnectivityReport {
    pub fn availability(&self) -> ApiAvailability {
        let reachable = self
            .probes
            .iter()
            .filter(|probe| matches!(probe.outcome, ProbeOutcome::Reachable { .. }))
            .count();
        let answered = self
            .probes
            .iter()
            .filter(|probe| probe.outcome.status().is_some())
            .count();

        if answered == 0 {
            ApiAvailability::Unavailable
        } else if reachable == self.probes.len() {
            ApiAvailability::Available
        } else {
            ApiAvailability::Degraded
        }
    }

    pub fn probe(&self, endpoint: &str) -> Option<&EndpointProbe> {
        self.probes.iter().find(|probe| probe.endpoint == endpoint)
    }
}

/// Probe the list and statistics endpoints, one after the other.
pub async fn probe(api: &AccountsApi) -> ConnectivityReport {
    let checked_at = Utc::now();
    let probes = vec![
        probe_endpoint("list", api.list_request(&AccountFilter::all())).await,
        probe_endpoint("stats", api.stats_request()).await,
    ];

    let report = ConnectivityReport { checked_at, probes };
    match report.availability() {
        ApiAvailability::Available => info!("Accounts API available"),
        availability => warn!("Accounts API {availability:?}"),
    }
    report
}

async fn probe_endpoint(endpoint: &'static str, request: RequestBuilder) -> EndpointProbe {
    let url = request.display_url();
    let started = Instant::now();
    let outcome = match request.send().await {
        Ok(response) if response.is_success() => ProbeOutcome::Reachable {
            status: response.status,
        },
        Ok(response) => ProbeOutcome::Rejected {
            status: response.status,
        },
        Err(err) => ProbeOutcome::Unreachable(err.message),
    };
    let elapsed = started.elapsed();
    info!("Probed {endpoint} at {url}: {outcome} in {elapsed:?}");

    EndpointProbe {
        endpoint,
        url,
        outcome,
        elapsed,
    }
}
