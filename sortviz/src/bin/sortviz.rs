//! Sortviz CLI - sort an array locally and compare algorithm metrics
//!
//! Usage:
//!   sortviz <ARRAY> [-a <ALGORITHM>]... [--all] [--verbose]
//!
//! Example:
//!   sortviz 5,3,1 -a bubble
//!   sortviz "9, 4, 7, 1, 8" --all -v

use anyhow::{Context, Result};
use colored::Colorize;
use sortviz::algorithms::{Algorithm, AlgorithmRegistry, NoSnapshots, SnapshotSink};
use sortviz::orchestrator::{ComparisonEntry, ComparisonReport, SortOrchestrator};

const DEFAULT_MAX_LEN: usize = 10_000;

fn print_usage() {
    eprintln!(
        r#"
{} - Count comparisons and swaps of classic sorting algorithms

{}
    sortviz <ARRAY> [OPTIONS]

{}
    <ARRAY>    Comma-separated numbers, e.g. "5,3,1"

{}
    -a, --algorithm <NAME>      Algorithm to run; repeat to compare several
                                (bubble, selection, insertion, merge, quick, heap)
    --all                       Run every algorithm
    -v, --verbose               Print every intermediate array state
    -h, --help                  Print this help message

{}
    sortviz 5,3,1
    sortviz 9,4,7,1,8 -a merge -a quick
    sortviz 3,1,2 --all -v
"#,
        "Sortviz CLI".bold(),
        "USAGE:".bold(),
        "ARGS:".bold(),
        "OPTIONS:".bold(),
        "EXAMPLES:".bold(),
    );
}

struct CliArgs {
    array: String,
    algorithms: Vec<String>,
    verbose: bool,
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let array = args[1].clone();
    let mut algorithms = Vec::new();
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--algorithm" | "-a" => {
                i += 1;
                let name = args.get(i).context("--algorithm needs a value")?;
                algorithms.push(name.clone());
            }
            "--all" => {
                algorithms.extend(Algorithm::ALL.iter().map(|a| a.id().to_string()));
            }
            "--verbose" | "-v" => verbose = true,
            other => anyhow::bail!("Unknown option: {}", other),
        }
        i += 1;
    }

    if algorithms.is_empty() {
        algorithms.push(Algorithm::Bubble.id().to_string());
    }

    Ok(CliArgs {
        array,
        algorithms,
        verbose,
    })
}

/// Parse "5, 3,1" into a JSON list so the orchestrator validates it
fn parse_array_arg(text: &str) -> Result<serde_json::Value> {
    let values = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("Not a number: {}", s))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::Value::from(values))
}

fn format_array(array: &[f64]) -> String {
    let items: Vec<String> = array.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Prints each intermediate state as it happens
struct PrintSnapshots {
    step: usize,
}

impl SnapshotSink for PrintSnapshots {
    fn snapshot(&mut self, array: &[f64]) {
        self.step += 1;
        println!("    {:>4}  {}", self.step.to_string().dimmed(), format_array(array));
    }
}

fn print_comparison(report: &ComparisonReport) {
    println!();
    println!("{}", "Comparison:".bold());
    for entry in &report.results {
        let line = format!(
            "  {:<10} comparisons: {:>8}  swaps: {:>8}",
            entry.algorithm, entry.result.metrics.comparisons, entry.result.metrics.swaps
        );
        if entry.algorithm == report.fastest.algorithm {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
    println!("  Fastest: {}", report.fastest.algorithm.green().bold());
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let orchestrator = SortOrchestrator::with_registry(AlgorithmRegistry::all(), DEFAULT_MAX_LEN);
    let algorithms = args
        .algorithms
        .iter()
        .map(|name| orchestrator.registry().resolve(name))
        .collect::<Result<Vec<_>, _>>()?;
    let input = parse_array_arg(&args.array)?;
    let array = orchestrator.parse_array(Some(&input))?;

    println!("{} {}", "Input:".bold(), format_array(&array));

    let mut results = Vec::with_capacity(algorithms.len());
    for algorithm in algorithms {
        println!();
        println!("{}", algorithm.name().cyan().bold());

        let result = if args.verbose {
            let mut sink = PrintSnapshots { step: 0 };
            orchestrator.execute(algorithm, array.clone(), &mut sink)?
        } else {
            orchestrator.execute(algorithm, array.clone(), &mut NoSnapshots)?
        };

        println!("  Sorted:      {}", format_array(&result.sorted_array));
        println!("  Comparisons: {}", result.metrics.comparisons);
        println!("  Swaps:       {}", result.metrics.swaps);
        results.push(ComparisonEntry {
            algorithm: algorithm.id().to_string(),
            result,
        });
    }

    if results.len() > 1 {
        print_comparison(&ComparisonReport::from_results(results)?);
    }

    Ok(())
}
