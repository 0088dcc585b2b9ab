//! Terminal display logic for domain-sweep CLI.
//!
//! Headers go to stderr next to the log lines; dry-run listings and the
//! final summary go to stdout so they can be piped. Uses only the `console`
//! crate for styling.

use console::{pad_str, style, Alignment};
use domain_sweep_lib::{
    alphabet_to_string, read_checkpoint, CandidateSpace, ScanConfig, ScanSummary,
};

/// Print a styled header at the start of a sweep.
pub fn print_header(config: &ScanConfig) {
    eprintln!(
        "{} {} {}",
        style("domain-sweep").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "· .{} · length {} · [{}]",
            config.tld,
            config.length,
            alphabet_to_string(&config.alphabet)
        ))
        .dim(),
    );

    let resolvers: Vec<String> = config.resolvers.iter().map(|r| r.to_string()).collect();
    eprintln!(
        "{}",
        style(format!(
            "Resolvers: {}  Concurrency: {}  Output: {}",
            resolvers.join(", "),
            config.concurrency,
            config.output_path.display()
        ))
        .dim()
    );
    eprintln!();
}

/// Describe the candidate space and list its first `count` members.
///
/// Honors the resume marker exactly like a real run would, including
/// rejecting a marker that does not belong to the space.
pub async fn print_dry_run(
    config: &ScanConfig,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let space = CandidateSpace::from_config(config)?;

    let marker = if config.resume {
        read_checkpoint(config.effective_resume_path()).await?
    } else {
        None
    };
    let candidates = match &marker {
        Some(marker) => space.resume_from(marker)?,
        None => space.iter(),
    };

    println!("{} {}", label("Space:"), format_space_size(space.size()));
    println!(
        "{} .{} · length {} · [{}]",
        label("Pattern:"),
        space.tld(),
        config.length,
        alphabet_to_string(&config.alphabet)
    );
    match (&marker, config.resume) {
        (Some(marker), _) => println!(
            "{} {} (from {})",
            label("Resume:"),
            style(marker).cyan(),
            config.effective_resume_path().display()
        ),
        (None, true) => println!("{} start (no checkpoint)", label("Resume:")),
        (None, false) => println!("{} disabled", label("Resume:")),
    }

    if count > 0 {
        println!("{}", label(&format!("First {}:", count)));
        for domain in candidates.take(count) {
            println!("  {}", domain);
        }
    }
    Ok(())
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &ScanSummary, config: &ScanConfig) {
    let title = if summary.interrupted {
        style("Sweep interrupted").yellow().bold()
    } else {
        style("Sweep complete").green().bold()
    };

    println!();
    println!("{}", title);
    println!("{} {}", label("Checked:"), summary.checked);
    println!(
        "{} {} {}",
        label("Available:"),
        style(summary.available).green().bold(),
        style(format!("→ {}", config.output_path.display())).dim()
    );
    if summary.failures > 0 {
        println!(
            "{} {}",
            label("Failures:"),
            style(summary.failures).yellow()
        );
    }
    if summary.faults > 0 {
        println!("{} {}", label("Faults:"), style(summary.faults).red());
    }
    if summary.skipped > 0 {
        println!("{} {}", label("Skipped:"), summary.skipped);
    }
    if let Some(checkpoint) = &summary.checkpoint {
        println!(
            "{} {} {}",
            label("Checkpoint:"),
            checkpoint,
            style(format!("→ {}", config.checkpoint_path.display())).dim()
        );
    }

    let rate = if summary.elapsed_secs > 0.0 {
        summary.checked as f64 / summary.elapsed_secs
    } else {
        0.0
    };
    println!(
        "{} {:.1}s ({:.0}/s)",
        label("Elapsed:"),
        summary.elapsed_secs,
        rate
    );
}

fn format_space_size(size: Option<u128>) -> String {
    match size {
        Some(1) => "1 candidate".to_string(),
        Some(n) => format!("{} candidates", n),
        None => "more than 2^128 candidates".to_string(),
    }
}

fn label(text: &str) -> String {
    style(pad_str(text, 12, Alignment::Left, None).to_string())
        .bold()
        .to_string()
}
