//! # Domain Sweep Library
//!
//! An exhaustive DNS sweep engine: enumerate every label of a fixed length
//! over an alphabet, query each name against a rotating set of resolvers,
//! and record the names that return NXDOMAIN.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{ScanConfig, Scanner};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::default()
//!         .with_tld("io")
//!         .with_length(3)
//!         .with_alphabet("a-z0-9")?;
//!
//!     let summary = Scanner::new(config)?.run(CancellationToken::new()).await?;
//!     println!("{} candidates, {} available", summary.checked, summary.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Generator**: lazy lexicographic enumeration with inclusive resume
//! - **Workers**: bounded task queue, one lookup per candidate, hard deadline
//! - **Resolver pool**: lock-free round-robin over DNS endpoints
//! - **Sinks**: single-writer output log and sampled checkpoint
//! - **Shutdown**: pending counters per queue, drained in pipeline order

// Re-export main public API types and functions
pub use classify::classify;
pub use concurrent::PendingCounter;
pub use config::{
    load_env_config, parse_duration_string, parse_resolver_addr, parse_resolver_list,
    ConfigManager, EnvConfig, FileConfig, FilesSection, ResolverSection, ScanSection,
};
pub use error::SweepError;
pub use generate::{CandidateSpace, Candidates};
pub use pool::ResolverPool;
pub use protocols::{DnsLookup, Lookup};
pub use scanner::Scanner;
pub use sinks::{load_recorded, read_checkpoint, Checkpointer, ResultWriter};
pub use types::{
    Availability, LookupOutcome, ResolverEndpoint, ScanConfig, ScanSummary, DEFAULT_RESOLVERS,
};
pub use utils::{alphabet_to_string, normalize_tld, parse_alphabet, MAX_LABEL_LEN};

// Public modules
pub mod generate;

// Internal modules - these are not part of the public API
mod classify;
mod concurrent;
mod config;
mod error;
mod pool;
mod protocols;
mod scanner;
mod sinks;
mod types;
mod utils;
mod worker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SweepError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
