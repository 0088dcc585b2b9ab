//! Lookup protocol implementations.
//!
//! Workers only see the [`Lookup`] trait, so the resolver pool can hold real
//! DNS clients in production and scripted stubs in tests.

use crate::types::LookupOutcome;
use async_trait::async_trait;

/// DNS lookup via hickory-resolver
pub mod dns;

pub use dns::DnsLookup;

/// A single resolver endpoint able to answer "does this name exist?".
///
/// Implementations must fold every error into
/// [`LookupOutcome::TransientFailure`] and reserve
/// [`LookupOutcome::NonExistent`] for an explicit NXDOMAIN answer.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Query `domain` once, honoring the endpoint's own timeout and retries.
    async fn lookup(&self, domain: &str) -> LookupOutcome;

    /// Human-readable endpoint identifier for logs.
    fn endpoint(&self) -> String;
}
