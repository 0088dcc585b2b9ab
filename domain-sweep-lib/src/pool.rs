//! Round-robin resolver pool.
//!
//! The rotation cursor is the only state every worker mutates. It is a
//! single atomic counter taken modulo the pool size: each call hands out
//! some endpoint, consecutive calls walk the list in order, and no endpoint
//! can be skipped indefinitely.

use crate::error::SweepError;
use crate::protocols::{DnsLookup, Lookup};
use crate::types::ScanConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fixed, ordered set of resolver endpoints shared by all workers.
pub struct ResolverPool {
    endpoints: Vec<Arc<dyn Lookup>>,
    cursor: AtomicUsize,
    deadline: Duration,
}

impl ResolverPool {
    /// Create a pool from prebuilt lookups.
    ///
    /// `deadline` is the hard upper bound a worker waits on one lookup.
    pub fn new(endpoints: Vec<Arc<dyn Lookup>>, deadline: Duration) -> Result<Self, SweepError> {
        if endpoints.is_empty() {
            return Err(SweepError::config("Resolver pool cannot be empty"));
        }

        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            deadline,
        })
    }

    /// Create one [`DnsLookup`] per configured resolver.
    pub fn from_config(config: &ScanConfig) -> Result<Self, SweepError> {
        let endpoints = config.endpoints();
        let deadline = endpoints
            .iter()
            .map(|e| e.deadline())
            .max()
            .unwrap_or_default();

        let lookups = endpoints
            .iter()
            .map(|endpoint| Arc::new(DnsLookup::new(endpoint)) as Arc<dyn Lookup>)
            .collect();

        Self::new(lookups, deadline)
    }

    /// Next endpoint in rotation.
    pub fn next(&self) -> &Arc<dyn Lookup> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index]
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Never true for a constructed pool.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Hard deadline applied around each lookup.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl std::fmt::Debug for ResolverPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoints: Vec<String> = self.endpoints.iter().map(|e| e.endpoint()).collect();
        f.debug_struct("ResolverPool")
            .field("endpoints", &endpoints)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LookupOutcome;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Named(&'static str);

    #[async_trait]
    impl Lookup for Named {
        async fn lookup(&self, _domain: &str) -> LookupOutcome {
            LookupOutcome::Resolved
        }

        fn endpoint(&self) -> String {
            self.0.to_string()
        }
    }

    fn pool(names: &[&'static str]) -> ResolverPool {
        let endpoints = names
            .iter()
            .map(|n| Arc::new(Named(n)) as Arc<dyn Lookup>)
            .collect();
        ResolverPool::new(endpoints, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(ResolverPool::new(vec![], Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_rotation_order() {
        let pool = pool(&["a", "b", "c"]);
        let order: Vec<String> = (0..7).map(|_| pool.next().endpoint()).collect();
        assert_eq!(order, ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_concurrent_rotation_is_balanced() {
        let pool = Arc::new(pool(&["a", "b", "c", "d"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    (0..1000)
                        .map(|_| pool.next().endpoint())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                *counts.entry(name).or_default() += 1;
            }
        }

        // 8000 draws over 4 endpoints with a shared counter: exactly even.
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == 2000));
    }

    #[test]
    fn test_from_config_uses_largest_deadline() {
        let config = ScanConfig::default()
            .with_timeout(Duration::from_millis(400))
            .with_retries(2);
        let pool = tokio_test::block_on(async { ResolverPool::from_config(&config) }).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.deadline(), Duration::from_millis(1450));
    }
}
