//! StrikeWatch CLI
//!
//! Runs the strike-detection group under the deterministic simulator (or the
//! wall clock with `--realtime`) and prints the final report.

use clap::Parser;
use std::time::Duration;
use strikewatch_core::{RunConfig, StrikeError};
use strikewatch_sim::scenarios::ScenarioId;
use strikewatch_sim::{text_report, RunExport, ScenarioResult, ScenarioRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// StrikeWatch round-synchronized strike detection
#[derive(Parser, Debug)]
#[command(name = "strikewatch")]
#[command(about = "Run the StrikeWatch coordinator and agents", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of processes, coordinator included
    #[arg(short, long, default_value = "4")]
    group_size: u32,

    /// Number of distinct locations
    #[arg(short, long, default_value = "1000")]
    locations: u32,

    /// Overall run duration in seconds
    #[arg(short, long, default_value = "60")]
    duration: f64,

    /// Sampling interval in seconds
    #[arg(short, long, default_value = "0.01")]
    interval: f64,

    /// How long the coordinator waits for a round's reports
    #[arg(long, default_value = "1000")]
    round_timeout_ms: u64,

    /// Scenario to run (baseline, lone_agent, crowded, dead_agent, corrupt_reporter, all)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: u64,

    /// Pace rounds on the wall clock instead of the virtual clock
    #[arg(long)]
    realtime: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the run (config, strike events, summary) to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn seconds(name: &str, value: f64) -> Result<Duration, StrikeError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| StrikeError::config(format!("{} must be a non-negative number of seconds, got {}", name, value)))
}

fn build_config(args: &Args, seed: u64) -> Result<RunConfig, StrikeError> {
    let config = RunConfig::default()
        .with_group_size(args.group_size)
        .with_max_locations(args.locations)
        .with_run_duration(seconds("duration", args.duration)?)
        .with_round_interval(seconds("interval", args.interval)?)
        .with_round_timeout(Duration::from_millis(args.round_timeout_ms))
        .with_seed(seed);
    config.validate()?;
    Ok(config)
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: failed to set tracing subscriber: {}", err);
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(err) => {
                eprintln!("Error: {}", err);
                eprintln!("Available scenarios: baseline, lone_agent, crowded, dead_agent, corrupt_reporter, all");
                std::process::exit(1);
            }
        }
    };

    let base_seed = if args.seed == 0 { rand::random() } else { args.seed };

    let base = match build_config(&args, base_seed) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        eprintln!("Error: --export only supports a single scenario and seed");
        std::process::exit(1);
    }

    if !args.json {
        info!("StrikeWatch v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "group={} locations={} duration={:.3}s interval={:.3}s mode={}",
            base.group_size,
            base.max_locations,
            base.run_duration.as_secs_f64(),
            base.round_interval.as_secs_f64(),
            if args.realtime { "realtime" } else { "simulated" }
        );
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset);
        let runner = ScenarioRunner::new(seed, base.clone()).with_realtime(args.realtime);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if let Some(summary) = &result.summary {
                    print!("{}", text_report(summary));
                }
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            all_results.push(result);
        }
    }

    if let (Some(path), Some(result)) = (&args.export, all_results.first()) {
        let export = RunExport::from_result(result);
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} strike events to {}", export.events.len(), path),
            Err(err) => {
                error!("Failed to write export: {}", err);
                std::process::exit(1);
            }
        }
    }

    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "summary": r.summary,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(err) => error!("Failed to encode results: {}", err),
        }
    } else if total > 1 {
        if failed_count == 0 {
            info!("All {} scenario runs passed", total);
        } else {
            error!("{}/{} scenario runs failed", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}
