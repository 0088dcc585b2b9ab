//! Candidate enumeration.
//!
//! A [`CandidateSpace`] is every label of a fixed length over a fixed
//! alphabet, joined to a TLD. [`Candidates`] walks it lazily in strict
//! lexicographic order using an odometer: each label position is a digit in
//! a base-|alphabet| number, incremented rightmost first. Because the
//! alphabet is sorted and every label has the same length, odometer order is
//! exactly string order.
//!
//! # Examples
//!
//! ```
//! use domain_sweep_lib::CandidateSpace;
//!
//! let space = CandidateSpace::new(vec!['a', 'b'], 2, "test").unwrap();
//! let all: Vec<String> = space.iter().collect();
//! assert_eq!(all, ["aa.test", "ab.test", "ba.test", "bb.test"]);
//!
//! let resumed: Vec<String> = space.resume_from("ab.test").unwrap().collect();
//! assert_eq!(resumed, ["ab.test", "ba.test", "bb.test"]);
//! ```

use crate::error::SweepError;
use crate::types::ScanConfig;
use crate::utils::{normalize_alphabet, normalize_tld, MAX_LABEL_LEN};

/// The full set of candidates for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSpace {
    alphabet: Vec<char>,
    length: usize,
    tld: String,
}

impl CandidateSpace {
    /// Build a space, sorting and deduplicating the alphabet.
    ///
    /// Every character must be in `[a-z0-9]`.
    pub fn new<T: AsRef<str>>(
        alphabet: Vec<char>,
        length: usize,
        tld: T,
    ) -> Result<Self, SweepError> {
        let alphabet = normalize_alphabet(alphabet)?;
        if length == 0 || length > MAX_LABEL_LEN {
            return Err(SweepError::config(format!(
                "Label length must be between 1 and {}, got {}",
                MAX_LABEL_LEN, length
            )));
        }

        Ok(Self {
            alphabet,
            length,
            tld: normalize_tld(tld.as_ref())?,
        })
    }

    /// Build the space described by a validated config.
    pub fn from_config(config: &ScanConfig) -> Result<Self, SweepError> {
        Self::new(config.alphabet.clone(), config.length, &config.tld)
    }

    /// Number of candidates, or `None` if it overflows `u128`.
    pub fn size(&self) -> Option<u128> {
        let base = self.alphabet.len() as u128;
        let exp = u32::try_from(self.length).ok()?;
        base.checked_pow(exp)
    }

    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// Enumerate the whole space from the first label.
    pub fn iter(&self) -> Candidates<'_> {
        Candidates {
            space: self,
            counters: Some(vec![0; self.length]),
        }
    }

    /// Enumerate from `marker` inclusive.
    ///
    /// Every candidate lexicographically smaller than the marker is
    /// suppressed and the marker itself is emitted first, so it may be
    /// processed twice across a crash. The marker must belong to this space.
    pub fn resume_from(&self, marker: &str) -> Result<Candidates<'_>, SweepError> {
        let counters = self.position_of(marker)?;
        Ok(Candidates {
            space: self,
            counters: Some(counters),
        })
    }

    /// Whether `domain` is a member of this space.
    pub fn contains(&self, domain: &str) -> bool {
        self.position_of(domain).is_ok()
    }

    /// Odometer position of a full domain name.
    fn position_of(&self, domain: &str) -> Result<Vec<usize>, SweepError> {
        let domain = domain.trim();
        let label = domain
            .strip_suffix(&self.tld)
            .and_then(|rest| rest.strip_suffix('.'))
            .ok_or_else(|| {
                SweepError::checkpoint(domain, format!("expected suffix '.{}'", self.tld))
            })?;

        let chars: Vec<char> = label.chars().collect();
        if chars.len() != self.length {
            return Err(SweepError::checkpoint(
                domain,
                format!(
                    "label length {} does not match {}",
                    chars.len(),
                    self.length
                ),
            ));
        }

        chars
            .iter()
            .map(|c| {
                self.alphabet.binary_search(c).map_err(|_| {
                    SweepError::checkpoint(domain, format!("'{}' is not in the alphabet", c))
                })
            })
            .collect()
    }
}

/// Lazy iterator over a [`CandidateSpace`].
///
/// Finite and not restartable: once exhausted it keeps returning `None`.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    space: &'a CandidateSpace,
    // None once the odometer has rolled over.
    counters: Option<Vec<usize>>,
}

impl Iterator for Candidates<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let counters = self.counters.as_mut()?;
        let alphabet = &self.space.alphabet;

        let mut domain = String::with_capacity(counters.len() + self.space.tld.len() + 1);
        domain.extend(counters.iter().map(|&i| alphabet[i]));
        domain.push('.');
        domain.push_str(&self.space.tld);

        // Increment odometer (rightmost first)
        let mut rolled_over = true;
        for counter in counters.iter_mut().rev() {
            *counter += 1;
            if *counter < alphabet.len() {
                rolled_over = false;
                break;
            }
            *counter = 0;
        }
        if rolled_over {
            self.counters = None;
        }

        Some(domain)
    }
}

impl std::iter::FusedIterator for Candidates<'_> {}
