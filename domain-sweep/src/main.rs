//! Domain Sweep CLI Application
//!
//! A command-line interface for exhaustive DNS sweeps of short domain names.
//! This CLI application is a thin layer over the domain-sweep-lib engine:
//! it layers configuration, installs logging, wires Ctrl-C and prints the
//! run summary.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use domain_sweep_lib::{
    load_env_config, parse_duration_string, parse_resolver_list, ConfigManager, ScanConfig,
    Scanner,
};
use std::process;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for domain-sweep
#[derive(Parser, Debug, Default)]
#[command(name = "domain-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sweep every short name under a TLD and record the ones with no DNS record")]
#[command(
    long_about = "Enumerate every label of a fixed length over an alphabet, query each name against a rotating pool of DNS resolvers, and append names that return NXDOMAIN to an output file.\n\nProgress is checkpointed so an interrupted sweep resumes where it left off."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// TLD suffix to sweep (e.g. com, io, co.uk)
    #[arg(
        short = 't',
        long = "tld",
        value_name = "TLD",
        help_heading = "Candidate Space"
    )]
    pub tld: Option<String>,

    /// Label length
    #[arg(
        short = 'l',
        long = "length",
        value_name = "N",
        help_heading = "Candidate Space"
    )]
    pub length: Option<usize>,

    /// Label alphabet, literal characters and ranges (e.g. a-z0-9)
    #[arg(
        short = 'a',
        long = "alphabet",
        value_name = "SPEC",
        help_heading = "Candidate Space"
    )]
    pub alphabet: Option<String>,

    /// DNS server as IP or IP:PORT (repeat or comma-separate for several)
    #[arg(
        short = 'r',
        long = "resolver",
        value_name = "ADDR",
        value_delimiter = ',',
        action = clap::ArgAction::Append,
        help_heading = "Resolvers"
    )]
    pub resolvers: Option<Vec<String>>,

    /// Per-query timeout (e.g. 500ms, 2s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Resolvers")]
    pub timeout: Option<String>,

    /// Retries per query after the first attempt
    #[arg(long = "retries", value_name = "N", help_heading = "Resolvers")]
    pub retries: Option<usize>,

    /// Number of concurrent workers (default: 10000)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Capacity of the task queue (default: 20000)
    #[arg(
        long = "queue-capacity",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub queue_capacity: Option<usize>,

    /// File receiving available domains (appended)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Files"
    )]
    pub output: Option<String>,

    /// Checkpoint file
    #[arg(long = "checkpoint", value_name = "FILE", help_heading = "Files")]
    pub checkpoint: Option<String>,

    /// Read the resume marker from this file instead of the checkpoint
    #[arg(long = "resume-from", value_name = "FILE", help_heading = "Files")]
    pub resume_from: Option<String>,

    /// Start from the first candidate, ignoring any checkpoint
    #[arg(long = "no-resume", help_heading = "Files")]
    pub no_resume: bool,

    /// When resuming, skip domains already in the output file
    #[arg(long = "skip-recorded", help_heading = "Files")]
    pub skip_recorded: bool,

    /// Probability that a progress event is checkpointed (default: 0.001)
    #[arg(long = "sample-rate", value_name = "P", help_heading = "Files")]
    pub sample_rate: Option<f64>,

    /// Print the space size, resume point and first N candidates, then exit
    #[arg(
        long = "dry-run",
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "10",
        help_heading = "Output"
    )]
    pub dry_run: Option<usize>,

    /// Print the run summary as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Interval between progress log lines, 0 disables (default: 10s)
    #[arg(
        long = "report-interval",
        value_name = "DURATION",
        help_heading = "Output"
    )]
    pub report_interval: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {}", console::style("Error:").red().bold(), e);
        process::exit(1);
    }
}

/// Install the tracing subscriber on stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let directives = format!("domain_sweep={0},domain_sweep_lib={0}", default_level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    if let Some(count) = args.dry_run {
        let config = config.validate()?;
        return ui::print_dry_run(&config, count).await;
    }

    let scanner = Scanner::new(config)?;
    if !args.json {
        ui::print_header(scanner.config());
    }

    let interrupt = CancellationToken::new();
    let ctrl_c = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("interrupt received, finishing in-flight lookups");
                    interrupt.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
            }
        })
    };

    let summary = scanner.run(interrupt).await?;
    ctrl_c.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        ui::print_summary(&summary, scanner.config());
    }
    Ok(())
}

/// Build the scan configuration with precedence:
/// 1. CLI arguments
/// 2. Environment variables (DS_*)
/// 3. Explicit config file (--config or DS_CONFIG), otherwise discovered files
///    (./domain-sweep.toml, ~/.domain-sweep.toml, XDG config)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let mut config = ScanConfig::default();
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    let explicit_path = args.config.clone().or_else(|| env_config.config.clone());
    let file_config = match explicit_path {
        Some(path) => {
            debug!(path = %path, "using explicit config file");
            config_manager
                .load_file(&path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load(),
    };

    config = file_config.apply_to(config)?;
    config = env_config.apply_to(config)?;
    config = apply_cli_args(config, args)?;
    Ok(config)
}

/// Apply CLI arguments on top of the layered configuration.
fn apply_cli_args(
    mut config: ScanConfig,
    args: &Args,
) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    if let Some(tld) = &args.tld {
        config = config.with_tld(tld.as_str());
    }
    if let Some(length) = args.length {
        config = config.with_length(length);
    }
    if let Some(alphabet) = &args.alphabet {
        config = config.with_alphabet(alphabet)?;
    }
    if let Some(resolvers) = &args.resolvers {
        config = config.with_resolvers(parse_resolver_list(resolvers)?);
    }
    if let Some(timeout) = &args.timeout {
        config = config.with_timeout(parse_cli_duration("--timeout", timeout)?);
    }
    if let Some(retries) = args.retries {
        config = config.with_retries(retries);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(capacity) = args.queue_capacity {
        config = config.with_queue_capacity(capacity);
    }
    if let Some(output) = &args.output {
        config = config.with_output_path(output);
    }
    if let Some(checkpoint) = &args.checkpoint {
        config = config.with_checkpoint_path(checkpoint);
    }
    if let Some(resume_from) = &args.resume_from {
        config = config.with_resume_path(resume_from);
    }
    if args.no_resume {
        config = config.with_resume(false);
    }
    if args.skip_recorded {
        config = config.with_skip_recorded(true);
    }
    if let Some(rate) = args.sample_rate {
        config = config.with_sample_rate(rate);
    }
    if let Some(interval) = &args.report_interval {
        let interval = parse_cli_duration("--report-interval", interval)?;
        config = config.with_report_interval(Some(interval));
    }

    info!(tld = %config.tld, length = config.length, "configuration resolved");
    Ok(config)
}

fn parse_cli_duration(flag: &str, value: &str) -> Result<Duration, String> {
    parse_duration_string(value).ok_or_else(|| {
        format!(
            "Invalid {} '{}'. Use a format like '500ms', '2s', '1m'",
            flag, value
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_args_override_config() {
        let args = Args {
            tld: Some(".IO".to_string()),
            length: Some(3),
            alphabet: Some("a-c".to_string()),
            resolvers: Some(vec!["1.1.1.1".to_string(), "9.9.9.9:5353".to_string()]),
            timeout: Some("250ms".to_string()),
            output: Some("io.txt".to_string()),
            no_resume: true,
            ..Default::default()
        };

        let config = apply_cli_args(ScanConfig::default(), &args)
            .unwrap()
            .validate()
            .unwrap();

        assert_eq!(config.tld, "io");
        assert_eq!(config.length, 3);
        assert_eq!(config.alphabet, vec!['a', 'b', 'c']);
        assert_eq!(config.resolvers.len(), 2);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.output_path, PathBuf::from("io.txt"));
        assert!(!config.resume);
    }

    #[test]
    fn test_unset_args_keep_layered_values() {
        let base = ScanConfig::default().with_tld("dev").with_concurrency(42);
        let config = apply_cli_args(base, &Args::default()).unwrap();
        assert_eq!(config.tld, "dev");
        assert_eq!(config.concurrency, 42);
        assert!(config.resume);
    }

    #[test]
    fn test_invalid_cli_values_rejected() {
        let bad_timeout = Args {
            timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(apply_cli_args(ScanConfig::default(), &bad_timeout).is_err());

        let bad_resolver = Args {
            resolvers: Some(vec!["resolver.example".to_string()]),
            ..Default::default()
        };
        let result = apply_cli_args(ScanConfig::default(), &bad_resolver);
        assert!(result.is_err());

        let bad_alphabet = Args {
            alphabet: Some("a-z!".to_string()),
            ..Default::default()
        };
        let result = apply_cli_args(ScanConfig::default(), &bad_alphabet);
        assert!(result.is_err());
    }

    #[test]
    fn test_dry_run_flag_parsing() {
        let args = Args::try_parse_from(["domain-sweep", "--dry-run"]).unwrap();
        assert_eq!(args.dry_run, Some(10));

        let argv = ["domain-sweep", "--dry-run", "3", "-t", "io"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.dry_run, Some(3));
        assert_eq!(args.tld.as_deref(), Some("io"));

        let argv = ["domain-sweep", "-r", "1.1.1.1,8.8.8.8", "-r", "9.9.9.9"];
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.resolvers.map(|r| r.len()), Some(3));
    }
}
