//! Availability classification.
//!
//! Only an explicit NXDOMAIN counts as available. Timeouts, network errors
//! and malformed responses say nothing about registration, so they are
//! reported as [`Availability::Unknown`] and never written to the output.

use crate::types::{Availability, LookupOutcome};

/// Map a raw lookup outcome to an availability signal.
pub fn classify(outcome: &LookupOutcome) -> Availability {
    match outcome {
        LookupOutcome::Resolved => Availability::Taken,
        LookupOutcome::NonExistent => Availability::Available,
        LookupOutcome::TransientFailure(_) => Availability::Unknown,
    }
}
