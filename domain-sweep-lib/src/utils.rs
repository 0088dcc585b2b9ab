//! Utility functions for label, TLD and alphabet validation.
//!
//! These helpers normalize user-supplied configuration into the canonical
//! forms the generator relies on: a lowercase TLD without a leading dot and
//! a sorted, deduplicated alphabet.

use crate::error::SweepError;

/// Longest label DNS allows.
pub const MAX_LABEL_LEN: usize = 63;

/// Normalize a TLD suffix: trims whitespace, strips leading dots and lowercases.
///
/// Multi-part suffixes such as `co.uk` are accepted; every part must be a
/// valid DNS label.
pub fn normalize_tld(tld: &str) -> Result<String, SweepError> {
    let tld = tld.trim().trim_start_matches('.').to_lowercase();

    if tld.is_empty() {
        return Err(SweepError::config("TLD cannot be empty"));
    }

    if tld.ends_with('.') || tld.split('.').any(|part| !is_valid_label(part)) {
        return Err(SweepError::config(format!("Invalid TLD '{}'", tld)));
    }

    Ok(tld)
}

/// Parse an alphabet specification into a sorted, deduplicated character set.
///
/// Accepts literal characters and `x-y` ranges, so `"a-z0-9"` and
/// `"abc"` are both valid. Only lowercase ASCII letters and digits are
/// allowed; a hyphen is reserved for ranges because hyphen-edged labels are
/// not valid hostnames.
pub fn parse_alphabet(spec: &str) -> Result<Vec<char>, SweepError> {
    let chars: Vec<char> = spec.trim().chars().collect();
    let mut alphabet = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let start = chars[i];
        if !is_alphabet_char(start) {
            return Err(SweepError::config(format!(
                "Invalid alphabet character '{}' in '{}'",
                start, spec
            )));
        }

        if i + 2 < chars.len() && chars[i + 1] == '-' {
            let end = chars[i + 2];
            if !is_alphabet_char(end) || end < start {
                return Err(SweepError::config(format!(
                    "Invalid alphabet range '{}-{}' in '{}'",
                    start, end, spec
                )));
            }
            alphabet.extend(start..=end);
            i += 3;
        } else {
            alphabet.push(start);
            i += 1;
        }
    }

    // Ranges like "9-a" pass the ordering check but span punctuation.
    normalize_alphabet(alphabet)
}

/// Sort and deduplicate a literal character set.
///
/// No range syntax is interpreted here, so a `'-'` is rejected like any
/// other character outside `[a-z0-9]`.
pub(crate) fn normalize_alphabet(mut alphabet: Vec<char>) -> Result<Vec<char>, SweepError> {
    if let Some(bad) = alphabet.iter().find(|c| !is_alphabet_char(**c)) {
        return Err(SweepError::config(format!("Invalid alphabet character '{}'", bad)));
    }

    alphabet.sort_unstable();
    alphabet.dedup();

    if alphabet.is_empty() {
        return Err(SweepError::config("Alphabet cannot be empty"));
    }

    Ok(alphabet)
}

/// Render an alphabet back into its literal string form.
pub fn alphabet_to_string(alphabet: &[char]) -> String {
    alphabet.iter().collect()
}

/// Validate a single DNS label: 1-63 chars, alphanumeric or hyphen, no
/// hyphen at either end.
pub(crate) fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_alphabet_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tld() {
        assert_eq!(normalize_tld(".com").unwrap(), "com");
        assert_eq!(normalize_tld("COM").unwrap(), "com");
        assert_eq!(normalize_tld("  .co.uk ").unwrap(), "co.uk");

        assert!(normalize_tld("").is_err());
        assert!(normalize_tld(".").is_err());
        assert!(normalize_tld("-com").is_err());
        assert!(normalize_tld("co..uk").is_err());
        assert!(normalize_tld("com.").is_err());
    }

    #[test]
    fn test_parse_alphabet_ranges() {
        let alphabet = parse_alphabet("a-z").unwrap();
        assert_eq!(alphabet.len(), 26);
        assert_eq!(alphabet[0], 'a');
        assert_eq!(alphabet[25], 'z');

        let alphabet = parse_alphabet("a-z0-9").unwrap();
        assert_eq!(alphabet.len(), 36);
        // Sorted: digits sort before letters
        assert_eq!(alphabet[0], '0');
        assert_eq!(alphabet[10], 'a');
    }

    #[test]
    fn test_parse_alphabet_sorts_and_dedups() {
        assert_eq!(parse_alphabet("cbab").unwrap(), vec!['a', 'b', 'c']);
        assert_eq!(parse_alphabet("a-cb").unwrap(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_parse_alphabet_rejects_invalid() {
        assert!(parse_alphabet("").is_err());
        assert!(parse_alphabet("A-Z").is_err());
        assert!(parse_alphabet("ab-").is_err());
        assert!(parse_alphabet("z-a").is_err());
        assert!(parse_alphabet("9-a").is_err());
        assert!(parse_alphabet("a_b").is_err());
    }

    #[test]
    fn test_normalize_alphabet_is_literal() {
        let alphabet = normalize_alphabet(vec!['b', 'a', 'b']).unwrap();
        assert_eq!(alphabet, vec!['a', 'b']);
        assert!(normalize_alphabet(vec!['a', '-', 'z']).is_err());
        assert!(normalize_alphabet(vec!['a', 'B']).is_err());
        assert!(normalize_alphabet(vec![]).is_err());
    }

    #[test]
    fn test_alphabet_round_trip_string() {
        let alphabet = parse_alphabet("ba").unwrap();
        assert_eq!(alphabet_to_string(&alphabet), "ab");
    }

    #[test]
    fn test_is_valid_label() {
        assert!(is_valid_label("a"));
        assert!(is_valid_label("test-domain"));
        assert!(is_valid_label("abc123"));

        assert!(!is_valid_label(""));
        assert!(!is_valid_label("-example"));
        assert!(!is_valid_label("example-"));
        assert!(!is_valid_label("Example"));
        assert!(!is_valid_label(&"a".repeat(64)));
    }
}
