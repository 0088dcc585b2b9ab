//! Core data types for the sweep engine.
//!
//! This module defines the scan configuration, lookup outcomes, the
//! availability signal and the end-of-run summary.

use crate::error::SweepError;
use crate::utils::{normalize_alphabet, normalize_tld, parse_alphabet, MAX_LABEL_LEN};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Resolvers used when none are configured.
pub const DEFAULT_RESOLVERS: [Ipv4Addr; 4] = [
    Ipv4Addr::new(8, 8, 8, 8),
    Ipv4Addr::new(1, 1, 1, 1),
    Ipv4Addr::new(9, 9, 9, 9),
    Ipv4Addr::new(8, 8, 4, 4),
];

/// Configuration for one sweep.
///
/// Built once (defaults, then config file, environment and CLI layered on top)
/// and handed to the [`Scanner`](crate::Scanner), which owns it for the rest
/// of the run. Call [`ScanConfig::validate`] before use; the scanner does so
/// itself.
#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    /// TLD suffix without the leading dot (e.g. "com", "co.uk")
    pub tld: String,

    /// Fixed label length
    pub length: usize,

    /// Sorted, deduplicated label alphabet
    pub alphabet: Vec<char>,

    /// DNS servers, cycled round-robin
    pub resolvers: Vec<SocketAddr>,

    /// Per-endpoint query timeout
    pub timeout: Duration,

    /// Retries after the first attempt, per endpoint
    pub retries: usize,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Capacity of the bounded task queue between generator and workers
    pub queue_capacity: usize,

    /// Append-only file receiving one available domain per line
    pub output_path: PathBuf,

    /// Single-line file holding the last sampled candidate
    pub checkpoint_path: PathBuf,

    /// Where to read the resume marker from (defaults to `checkpoint_path`)
    pub resume_path: Option<PathBuf>,

    /// Whether to resume from an existing checkpoint
    pub resume: bool,

    /// Probability that a progress event is persisted
    pub sample_rate: f64,

    /// On resume, skip domains already present in the output file
    pub skip_recorded: bool,

    /// How often the progress reporter logs throughput
    #[serde(skip)]
    pub report_interval: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tld: "com".to_string(),
            length: 5,
            alphabet: ('a'..='z').collect(),
            resolvers: DEFAULT_RESOLVERS
                .iter()
                .map(|ip| SocketAddr::new(IpAddr::V4(*ip), 53))
                .collect(),
            timeout: Duration::from_secs(1),
            retries: 1,
            concurrency: 10_000,
            queue_capacity: 20_000,
            output_path: PathBuf::from("available.txt"),
            checkpoint_path: PathBuf::from("progress.txt"),
            resume_path: None,
            resume: true,
            sample_rate: 0.001,
            skip_recorded: false,
            report_interval: Some(Duration::from_secs(10)),
        }
    }
}

impl ScanConfig {
    /// Set the TLD suffix. Leading dots are stripped.
    pub fn with_tld<T: Into<String>>(mut self, tld: T) -> Self {
        self.tld = tld.into().trim().trim_start_matches('.').to_lowercase();
        self
    }

    /// Set the label length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the alphabet from a spec such as `"a-z0-9"`.
    pub fn with_alphabet(mut self, spec: &str) -> Result<Self, SweepError> {
        self.alphabet = parse_alphabet(spec)?;
        Ok(self)
    }

    pub fn with_resolvers(mut self, resolvers: Vec<SocketAddr>) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_checkpoint_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.checkpoint_path = path.into();
        self
    }

    pub fn with_resume_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.resume_path = Some(path.into());
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_skip_recorded(mut self, enabled: bool) -> Self {
        self.skip_recorded = enabled;
        self
    }

    /// Set the reporter interval. `None` disables periodic progress logs.
    pub fn with_report_interval(mut self, interval: Option<Duration>) -> Self {
        self.report_interval = interval;
        self
    }

    /// Path the resume marker is read from.
    pub fn effective_resume_path(&self) -> &PathBuf {
        self.resume_path.as_ref().unwrap_or(&self.checkpoint_path)
    }

    /// Per-endpoint settings for every configured resolver, in order.
    pub fn endpoints(&self) -> Vec<ResolverEndpoint> {
        self.resolvers
            .iter()
            .map(|address| ResolverEndpoint {
                address: *address,
                timeout: self.timeout,
                retries: self.retries,
            })
            .collect()
    }

    /// Validate every field and return a normalized copy.
    ///
    /// The alphabet is sorted and deduplicated and the TLD lowercased, so the
    /// generator can rely on strict lexicographic order.
    pub fn validate(mut self) -> Result<Self, SweepError> {
        self.tld = normalize_tld(&self.tld)?;

        if self.length == 0 || self.length > MAX_LABEL_LEN {
            return Err(SweepError::config(format!(
                "Label length must be between 1 and {}, got {}",
                MAX_LABEL_LEN, self.length
            )));
        }

        self.alphabet = normalize_alphabet(self.alphabet)?;

        if self.resolvers.is_empty() {
            return Err(SweepError::config("At least one resolver is required"));
        }

        if self.timeout.is_zero() {
            return Err(SweepError::config("Resolver timeout must be non-zero"));
        }

        if self.concurrency == 0 {
            return Err(SweepError::config("Concurrency must be at least 1"));
        }

        if self.queue_capacity == 0 {
            return Err(SweepError::config("Queue capacity must be at least 1"));
        }

        if !(self.sample_rate > 0.0 && self.sample_rate <= 1.0) {
            return Err(SweepError::config(format!(
                "Checkpoint sample rate must be in (0, 1], got {}",
                self.sample_rate
            )));
        }

        if self.report_interval.is_some_and(|d| d.is_zero()) {
            self.report_interval = None;
        }

        Ok(self)
    }
}

/// One DNS server plus the limits applied to every query sent to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverEndpoint {
    pub address: SocketAddr,
    pub timeout: Duration,
    pub retries: usize,
}

impl ResolverEndpoint {
    /// Worst-case time one lookup may take against this endpoint.
    ///
    /// Covers every attempt plus a small slack for scheduling, and is used
    /// as a hard deadline around the resolver call.
    pub fn deadline(&self) -> Duration {
        let attempts = u32::try_from(self.retries.saturating_add(1)).unwrap_or(u32::MAX);
        self.timeout
            .saturating_mul(attempts)
            .saturating_add(Duration::from_millis(250))
    }
}

/// Raw result of a single DNS query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The name exists (answers, or an empty NOERROR response)
    Resolved,

    /// The resolver affirmatively reported NXDOMAIN
    NonExistent,

    /// Timeout, network failure, malformed response or any other error
    TransientFailure(String),
}

/// Availability signal derived from a [`LookupOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// NXDOMAIN: probably unregistered
    Available,

    /// The name resolves
    Taken,

    /// The lookup failed; treated as not available
    Unknown,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Availability::Available
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Total size of the candidate space, if it fits in 128 bits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_size: Option<u128>,

    /// Resume marker the run started from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<String>,

    /// Candidates handed to the task queue
    pub dispatched: u64,

    /// Candidates fully processed by a worker
    pub checked: u64,

    /// Candidates classified available
    pub available: u64,

    /// Lookups that ended in a transient failure
    pub failures: u64,

    /// Unexpected worker faults (panics, closed sinks)
    pub faults: u64,

    /// Candidates skipped because they were already recorded
    pub skipped: u64,

    /// Whether the run stopped early on an interrupt
    pub interrupted: bool,

    /// Last checkpoint written, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,

    /// Wall-clock duration of the run
    pub elapsed_secs: f64,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Taken => write!(f, "taken"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}
