use clap::{ArgAction, Parser, Subcommand};
use euclid_algorithm_analysis::analysis::{self, ThresholdStats};
use euclid_algorithm_analysis::config::RunConfig;
use euclid_algorithm_analysis::euclid::{self, Divisions};
use euclid_algorithm_analysis::{
    frequency, one_dim, stats, two_dim, Checkpoint, GcdFilter, Result, Summary,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, Level};

const DEFAULT_CACHE: &str = "euclid_checkpoint.bin";

/// Euclid's algorithm analysis: step-count and gcd distributions
#[derive(Parser)]
#[command(name = "euclid-analysis", version, about)]
struct Cli {
    /// Path to the checkpoint cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    /// JSON run configuration (gcd filter, threshold schedule, numerators)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every division step of the algorithm on (a, b)
    Trace {
        #[arg(allow_negative_numbers = true)]
        a: i64,
        #[arg(allow_negative_numbers = true)]
        b: i64,
    },
    /// Step-count distributions for fixed numerators over b in [1, a]
    OneDim {
        /// Numerators to tabulate (default: from config)
        numerators: Vec<u64>,
        /// Restrict to these gcd values (repeatable; default: from config)
        #[arg(long = "gcd")]
        gcd: Vec<u64>,
        /// Count every denominator in the restricted table too
        #[arg(long, default_value_t = false, conflicts_with = "gcd")]
        all_pairs: bool,
    },
    /// Extend the cached checkpoint to larger thresholds and save it
    Extend {
        /// Thresholds to reach (repeatable; default: configured schedule)
        #[arg(long = "to")]
        to: Vec<u64>,
        /// Restrict to these gcd values (repeatable; default: from config)
        #[arg(long = "gcd")]
        gcd: Vec<u64>,
        /// Count every pair in the restricted table too
        #[arg(long, default_value_t = false, conflicts_with = "gcd")]
        all_pairs: bool,
    },
    /// Show descriptive statistics for one cached threshold
    Summary {
        /// Threshold to summarize (default: latest)
        #[arg(long)]
        threshold: Option<u64>,
    },
    /// Write the cached tables as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show cache status
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::load_optional(cli.config.as_deref())?;
    let cache_path = cli
        .cache
        .clone()
        .or_else(|| config.cache.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE));

    match cli.command {
        Commands::Trace { a, b } => {
            cmd_trace(a, b);
            Ok(())
        }
        Commands::OneDim {
            numerators,
            gcd,
            all_pairs,
        } => {
            let filter = pick_filter(&config, gcd, all_pairs);
            let numerators = if numerators.is_empty() {
                config.numerators.clone()
            } else {
                numerators
            };
            cmd_one_dim(&filter, &numerators)
        }
        Commands::Extend { to, gcd, all_pairs } => {
            let filter = pick_filter(&config, gcd, all_pairs);
            let targets = if to.is_empty() { config.thresholds()? } else { to };
            cmd_extend(&cache_path, &filter, &targets)
        }
        Commands::Summary { threshold } => cmd_summary(&cache_path, threshold),
        Commands::Export { output } => cmd_export(&cache_path, output.as_deref()),
        Commands::Status => cmd_status(&cache_path),
    }
}

fn pick_filter(config: &RunConfig, gcd: Vec<u64>, all_pairs: bool) -> GcdFilter {
    if all_pairs {
        GcdFilter::unrestricted()
    } else if gcd.is_empty() {
        config.filter()
    } else {
        GcdFilter::from_values(gcd)
    }
}

fn cmd_trace(a: i64, b: i64) {
    for d in Divisions::new(a, b) {
        println!("  {} = {}*{} + {}", d.dividend, d.quotient, d.divisor, d.remainder);
    }
    let r = euclid::evaluate(a, b);
    println!("\ngcd({}, {}) = {}, T({}, {}) = {}", a, b, r.gcd, a, b, r.steps);
}

fn cmd_one_dim(filter: &GcdFilter, numerators: &[u64]) -> Result<()> {
    if numerators.is_empty() {
        println!("No numerators given. Pass them as arguments or in the config file.");
        return Ok(());
    }

    let start = Instant::now();
    let tables = one_dim::aggregate_by_numerator(filter, numerators)?;
    info!(elapsed = ?start.elapsed(), "one-dimensional tables built");

    println!("Restricted to gcd in {}\n", describe_filter(filter));
    for (a, all) in &tables.all {
        println!("a = {}", format_number(*a));
        print_summary_line("all b", &stats::summarize(all)?);
        match tables.restricted.get(a).filter(|m| !m.is_empty()) {
            Some(restricted) => print_summary_line("restricted", &stats::summarize(restricted)?),
            None => println!("    restricted   (no denominators)"),
        }
    }
    Ok(())
}

fn cmd_extend(cache_path: &Path, filter: &GcdFilter, targets: &[u64]) -> Result<()> {
    if targets.is_empty() {
        println!("No thresholds given. Use --to or a schedule in the config file.");
        return Ok(());
    }

    let checkpoint = Checkpoint::load_or_new(cache_path)?;
    // Resume from the cached end point unless the caller restates it.
    let mut thresholds = Vec::with_capacity(targets.len() + 1);
    match checkpoint.latest() {
        Some(latest) if targets[0] != latest => thresholds.push(latest),
        None if targets[0] != 2 => thresholds.push(2),
        _ => {}
    }
    thresholds.extend_from_slice(targets);

    println!(
        "Checkpoint loaded: {} thresholds (latest: {})",
        checkpoint.thresholds().len(),
        checkpoint
            .latest()
            .map(format_number)
            .unwrap_or_else(|| "none".to_string())
    );
    println!("Extending through {:?}...", thresholds);

    let start = Instant::now();
    let extended = two_dim::extend(filter, &thresholds, &checkpoint)?;
    let elapsed = start.elapsed();

    println!(
        "Done in {:.2?}. Latest threshold: {}",
        elapsed,
        extended
            .latest()
            .map(format_number)
            .unwrap_or_else(|| "none".to_string())
    );

    extended.save(cache_path)?;
    ThresholdStats::load_or_compute(&analysis::stats_path_for(cache_path), &extended)?;
    println!("Saved to {:?}", cache_path);
    Ok(())
}

fn cmd_summary(cache_path: &Path, threshold: Option<u64>) -> Result<()> {
    let checkpoint = Checkpoint::load_or_new(cache_path)?;
    let Some(threshold) = threshold.or_else(|| checkpoint.latest()) else {
        println!("No thresholds in cache. Run `extend` first.");
        return Ok(());
    };

    let stats = ThresholdStats::load_or_compute(&analysis::stats_path_for(cache_path), &checkpoint)?;
    let Some(gcd) = stats.gcd.get(&threshold) else {
        println!(
            "Threshold {} is not in the cache. Cached: {:?}",
            threshold,
            checkpoint.thresholds()
        );
        return Ok(());
    };

    println!("Pairs 0 < b < a < {}", format_number(threshold));
    println!(
        "  pairs counted: {} (expected {})",
        format_number(gcd.count),
        format_number(checkpoint.expected_pairs(threshold))
    );
    print_summary_line("gcd", gcd);
    if let Some(s) = stats.steps_all.get(&threshold) {
        print_summary_line("steps (all)", s);
    }
    match stats.steps_restricted.get(&threshold) {
        Some(s) => print_summary_line("steps (gcd filter)", s),
        None => println!("    steps (gcd filter)   (no pairs)"),
    }
    Ok(())
}

fn cmd_export(cache_path: &Path, output: Option<&Path>) -> Result<()> {
    let checkpoint = Checkpoint::load_or_new(cache_path)?;
    let data = serde_json::to_string_pretty(&checkpoint)?;
    match output {
        Some(path) => {
            std::fs::write(path, data)?;
            println!("Wrote {:?}", path);
        }
        None => println!("{}", data),
    }
    Ok(())
}

fn cmd_status(cache_path: &Path) -> Result<()> {
    if !cache_path.exists() {
        println!("No cache file found at {:?}", cache_path);
        println!("Run `extend --to <N>` to create one.");
        return Ok(());
    }

    let checkpoint = Checkpoint::load(cache_path)?;
    let file_size = std::fs::metadata(cache_path).map(|m| m.len())?;
    let latest = checkpoint.latest().unwrap_or(0);

    println!("╔══════════════════════════════════════════╗");
    println!("║     Euclid's Algorithm Analysis — Status ║");
    println!("╠══════════════════════════════════════════╣");
    println!(
        "║  Thresholds:      {:>20}  ║",
        format_number(checkpoint.thresholds().len() as u64)
    );
    println!("║  Latest:          {:>20}  ║", format_number(latest));
    println!(
        "║  Origin:          {:>20}  ║",
        format_number(checkpoint.origin().unwrap_or(0))
    );
    println!("║  Pairs counted:   {:>20}  ║", format_number(counted_pairs(&checkpoint)));
    println!(
        "║  Pairs expected:  {:>20}  ║",
        format_number(checkpoint.expected_pairs(latest))
    );
    println!("║  Gcd filter:      {:>20}  ║", describe_filter(checkpoint.filter()));
    println!("║  Cache file size: {:>20}  ║", format_bytes(file_size));
    println!("╚══════════════════════════════════════════╝");
    Ok(())
}

fn print_summary_line(label: &str, s: &Summary) {
    let modes: Vec<String> = s.mode.iter().map(|m| m.to_string()).collect();
    println!(
        "    {:<20} n={:<12} mean={:<10.4} var={:<10.4} sd={:<8.4} median={:<6} mode={}",
        label,
        s.count,
        s.mean,
        s.variance,
        s.standard_deviation,
        s.median,
        modes.join(",")
    );
}

fn describe_filter(filter: &GcdFilter) -> String {
    if filter.is_unrestricted() {
        "any".to_string()
    } else {
        let values: Vec<String> = filter.values().iter().map(|v| v.to_string()).collect();
        format!("{{{}}}", values.join(", "))
    }
}

/// Pairs actually held by the latest gcd snapshot.
fn counted_pairs(checkpoint: &Checkpoint) -> u64 {
    checkpoint
        .latest()
        .and_then(|latest| checkpoint.gcd_counts(latest))
        .map(frequency::total)
        .unwrap_or(0)
}

fn format_number(n: impl Into<u128>) -> String {
    let s = n.into().to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
