//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and the
//! environment, and layering both onto a [`ScanConfig`] with proper
//! precedence rules: CLI > `DS_*` environment > config files > defaults.

use crate::error::SweepError;
use crate::types::ScanConfig;
use crate::utils::{normalize_tld, parse_alphabet};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
///
/// ```toml
/// [scan]
/// tld = "io"
/// length = 4
/// alphabet = "a-z0-9"
///
/// [resolvers]
/// servers = ["1.1.1.1", "9.9.9.9:53"]
/// timeout = "800ms"
///
/// [files]
/// output = "io-available.txt"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Candidate space and pipeline sizing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanSection>,

    /// DNS servers and per-query limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<ResolverSection>,

    /// Output, checkpoint and resume settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Alphabet spec, e.g. "a-z0-9"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,

    /// Progress log interval, e.g. "10s"; "0" disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_interval: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolverSection {
    /// "ip" or "ip:port" entries, cycled in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<String>>,

    /// Per-query timeout, e.g. "1s" or "500ms"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilesSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,

    /// Read the resume marker from here instead of the checkpoint file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_recorded: Option<bool>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, SweepError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SweepError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SweepError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current
    /// directory. A file that fails to parse is reported and skipped.
    pub fn discover_and_load(&self) -> FileConfig {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged = FileConfig::default();
        let mut loaded_files = Vec::new();

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged = self.merge_configs(merged, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "highest precedence"
                } else {
                    "overridden where set above"
                };
                debug!(path = %path.display(), status, "config file");
            }
        }

        merged
    }

    /// Look for a config file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-sweep.toml", "./.domain-sweep.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for a config file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".domain-sweep.toml", "domain-sweep.toml"]
            .iter()
            .map(|name| Path::new(&home).join(name))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-sweep").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` win field by field.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            scan: merge_section(lower.scan, higher.scan, |low, high| ScanSection {
                tld: high.tld.or(low.tld),
                length: high.length.or(low.length),
                alphabet: high.alphabet.or(low.alphabet),
                concurrency: high.concurrency.or(low.concurrency),
                queue_capacity: high.queue_capacity.or(low.queue_capacity),
                sample_rate: high.sample_rate.or(low.sample_rate),
                report_interval: high.report_interval.or(low.report_interval),
            }),
            resolvers: merge_section(lower.resolvers, higher.resolvers, |low, high| {
                ResolverSection {
                    servers: high.servers.or(low.servers),
                    timeout: high.timeout.or(low.timeout),
                    retries: high.retries.or(low.retries),
                }
            }),
            files: merge_section(lower.files, higher.files, |low, high| FilesSection {
                output: high.output.or(low.output),
                checkpoint: high.checkpoint.or(low.checkpoint),
                resume_from: high.resume_from.or(low.resume_from),
                resume: high.resume.or(low.resume),
                skip_recorded: high.skip_recorded.or(low.skip_recorded),
            }),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), SweepError> {
        if let Some(scan) = &config.scan {
            if let Some(tld) = &scan.tld {
                normalize_tld(tld)?;
            }
            if let Some(alphabet) = &scan.alphabet {
                parse_alphabet(alphabet)?;
            }
            if scan.concurrency == Some(0) {
                return Err(SweepError::config("Concurrency must be at least 1"));
            }
            if scan.queue_capacity == Some(0) {
                return Err(SweepError::config("Queue capacity must be at least 1"));
            }
            if let Some(rate) = scan.sample_rate {
                if !(rate > 0.0 && rate <= 1.0) {
                    return Err(SweepError::config(format!(
                        "Checkpoint sample rate must be in (0, 1], got {}",
                        rate
                    )));
                }
            }
            if let Some(interval) = &scan.report_interval {
                require_duration("report_interval", interval)?;
            }
        }

        if let Some(resolvers) = &config.resolvers {
            if let Some(servers) = &resolvers.servers {
                if servers.is_empty() {
                    return Err(SweepError::config("Resolver list cannot be empty"));
                }
                for server in servers {
                    parse_resolver_addr(server)?;
                }
            }
            if let Some(timeout) = &resolvers.timeout {
                require_duration("timeout", timeout)?;
            }
        }

        Ok(())
    }
}

fn merge_section<T>(
    lower: Option<T>,
    higher: Option<T>,
    merge: impl FnOnce(T, T) -> T,
) -> Option<T> {
    match (lower, higher) {
        (Some(low), Some(high)) => Some(merge(low, high)),
        (low, high) => high.or(low),
    }
}

impl FileConfig {
    /// Overlay every value set in this file onto `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> Result<ScanConfig, SweepError> {
        if let Some(scan) = &self.scan {
            if let Some(tld) = &scan.tld {
                config = config.with_tld(tld.as_str());
            }
            if let Some(length) = scan.length {
                config = config.with_length(length);
            }
            if let Some(alphabet) = &scan.alphabet {
                config = config.with_alphabet(alphabet)?;
            }
            if let Some(concurrency) = scan.concurrency {
                config = config.with_concurrency(concurrency);
            }
            if let Some(capacity) = scan.queue_capacity {
                config = config.with_queue_capacity(capacity);
            }
            if let Some(rate) = scan.sample_rate {
                config = config.with_sample_rate(rate);
            }
            if let Some(interval) = &scan.report_interval {
                config = config
                    .with_report_interval(Some(require_duration("report_interval", interval)?));
            }
        }

        if let Some(resolvers) = &self.resolvers {
            if let Some(servers) = &resolvers.servers {
                config = config.with_resolvers(parse_resolver_list(servers)?);
            }
            if let Some(timeout) = &resolvers.timeout {
                config = config.with_timeout(require_duration("timeout", timeout)?);
            }
            if let Some(retries) = resolvers.retries {
                config = config.with_retries(retries);
            }
        }

        if let Some(files) = &self.files {
            if let Some(output) = &files.output {
                config = config.with_output_path(output);
            }
            if let Some(checkpoint) = &files.checkpoint {
                config = config.with_checkpoint_path(checkpoint);
            }
            if let Some(resume_from) = &files.resume_from {
                config = config.with_resume_path(resume_from);
            }
            if let Some(resume) = files.resume {
                config = config.with_resume(resume);
            }
            if let Some(skip) = files.skip_recorded {
                config = config.with_skip_recorded(skip);
            }
        }

        Ok(config)
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via `DS_*`
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub tld: Option<String>,
    pub length: Option<usize>,
    pub alphabet: Option<String>,
    pub resolvers: Option<Vec<SocketAddr>>,
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub concurrency: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub output: Option<String>,
    pub checkpoint: Option<String>,
    pub sample_rate: Option<f64>,
    pub skip_recorded: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Parses all `DS_*` environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    env_config_from(|key| env::var(key).ok(), verbose)
}

/// Build an [`EnvConfig`] from any variable source.
fn env_config_from<F>(var: F, verbose: bool) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    let read = |key: &str| {
        let value = var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if verbose {
            if let Some(value) = &value {
                debug!(variable = key, value = %value, "using environment override");
            }
        }
        value
    };

    fn parsed<T>(
        key: &str,
        value: Option<String>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let value = value?;
        let parsed = parse(&value);
        if parsed.is_none() {
            warn!(variable = key, value = %value, "ignoring invalid environment value");
        }
        parsed
    }

    env_config.tld = read("DS_TLD");
    env_config.length = parsed("DS_LENGTH", read("DS_LENGTH"), |v| {
        v.parse::<usize>().ok().filter(|&n| n > 0)
    });
    env_config.alphabet = parsed("DS_ALPHABET", read("DS_ALPHABET"), |v| {
        parse_alphabet(v).ok().map(|_| v.to_string())
    });
    env_config.resolvers = parsed("DS_RESOLVERS", read("DS_RESOLVERS"), |v| {
        let servers: Vec<String> = v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        parse_resolver_list(&servers).ok()
    });
    env_config.timeout = parsed("DS_TIMEOUT", read("DS_TIMEOUT"), |v| {
        parse_duration_string(v).filter(|d| !d.is_zero())
    });
    env_config.retries = parsed("DS_RETRIES", read("DS_RETRIES"), |v| v.parse().ok());
    env_config.concurrency = parsed("DS_CONCURRENCY", read("DS_CONCURRENCY"), |v| {
        v.parse::<usize>().ok().filter(|&n| n > 0)
    });
    env_config.queue_capacity = parsed("DS_QUEUE_CAPACITY", read("DS_QUEUE_CAPACITY"), |v| {
        v.parse::<usize>().ok().filter(|&n| n > 0)
    });
    env_config.output = read("DS_OUTPUT");
    env_config.checkpoint = read("DS_CHECKPOINT");
    env_config.sample_rate = parsed("DS_SAMPLE_RATE", read("DS_SAMPLE_RATE"), |v| {
        v.parse::<f64>().ok().filter(|r| *r > 0.0 && *r <= 1.0)
    });
    env_config.skip_recorded = parsed("DS_SKIP_RECORDED", read("DS_SKIP_RECORDED"), parse_bool);
    env_config.config = read("DS_CONFIG");

    env_config
}

impl EnvConfig {
    /// Overlay every variable that was set onto `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> Result<ScanConfig, SweepError> {
        if let Some(tld) = &self.tld {
            config = config.with_tld(tld.as_str());
        }
        if let Some(length) = self.length {
            config = config.with_length(length);
        }
        if let Some(alphabet) = &self.alphabet {
            config = config.with_alphabet(alphabet)?;
        }
        if let Some(resolvers) = &self.resolvers {
            config = config.with_resolvers(resolvers.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(retries) = self.retries {
            config = config.with_retries(retries);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output);
        }
        if let Some(checkpoint) = &self.checkpoint {
            config = config.with_checkpoint_path(checkpoint);
        }
        if let Some(rate) = self.sample_rate {
            config = config.with_sample_rate(rate);
        }
        if let Some(skip) = self.skip_recorded {
            config = config.with_skip_recorded(skip);
        }
        Ok(config)
    }
}

/// Parse a duration like "500ms", "2s", "1m", or bare seconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        // Assume seconds if no unit
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Parse "ip" or "ip:port" (IPv6 with port as "[ip]:port"). Port defaults to 53.
pub fn parse_resolver_addr(value: &str) -> Result<SocketAddr, SweepError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| SweepError::config(format!("Invalid resolver address '{}'", value)))
}

pub fn parse_resolver_list(values: &[String]) -> Result<Vec<SocketAddr>, SweepError> {
    if values.is_empty() {
        return Err(SweepError::config("Resolver list cannot be empty"));
    }
    values.iter().map(|v| parse_resolver_addr(v)).collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn require_duration(field: &str, value: &str) -> Result<Duration, SweepError> {
    parse_duration_string(value).ok_or_else(|| {
        SweepError::config(format!(
            "Invalid {} '{}'. Use a format like '500ms', '2s', '1m'",
            field, value
        ))
    })
}
