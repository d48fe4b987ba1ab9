use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use jtl_core::{
    GeneratorConfig, JtlWriter, RecordGenerator, RunParams, StatsCollector, StatsSummary,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "generate-jtl")]
#[command(about = "Generate a synthetic JTL result file for exercising result publishing")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Output JTL file path
    output_filename: PathBuf,

    /// Simulated run duration in seconds
    duration: i64,

    /// Number of distinct transaction labels
    label_count: usize,

    /// Number of simulated threads
    thread_count: usize,

    /// Optional TOML config (latency profile, byte ranges, seed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Deterministic seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log progress every N records (0 disables)
    #[arg(long, default_value = "100000")]
    log_every: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunReport {
    timestamp: String,
    output: String,
    seed: Option<u64>,
    duration_secs: i64,
    label_count: usize,
    thread_count: usize,
    start_time_ms: i64,
    end_time_ms: i64,
    summary: StatsSummary,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => GeneratorConfig::default(),
    };

    let seed = args.seed.or(config.seed);
    let params = RunParams {
        duration_secs: args.duration,
        label_count: args.label_count,
        thread_count: args.thread_count,
    };

    info!(
        "Generating {:?}: duration={}s labels={} threads={}",
        args.output_filename, params.duration_secs, params.label_count, params.thread_count
    );
    match seed {
        Some(seed) => info!("Seed: {}", seed),
        None => info!("Seed: none (output is not reproducible)"),
    }

    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = run_generation(
        &args.output_filename,
        params,
        &config,
        Utc::now(),
        rng,
        args.log_every,
    )?;
    let report = RunReport { seed, ..report };

    info!(
        "Wrote {} records to {:?}",
        report.summary.records, args.output_filename
    );

    if let Some(path) = &args.summary {
        let report_json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, report_json)
            .with_context(|| format!("Failed to write summary to {:?}", path))?;
        info!("Summary written to {:?}", path);
    }

    print_summary(&report);

    Ok(())
}

fn run_generation<R: Rng>(
    output: &Path,
    params: RunParams,
    config: &GeneratorConfig,
    start: DateTime<Utc>,
    rng: R,
    log_every: u64,
) -> Result<RunReport> {
    let generator = RecordGenerator::new(params, config, start, rng)
        .context("Failed to initialize record generator")?;
    let start_time_ms = generator.start_time_ms();
    let end_time_ms = generator.end_time_ms();

    for label in generator.labels() {
        info!(
            "{}: latency band [{}, {})s",
            label.name, label.latency_range.low, label.latency_range.high
        );
    }

    let mut writer = JtlWriter::create(output)?;
    let mut stats = StatsCollector::new();

    for record in generator {
        stats.record(&record);
        writer
            .write(&record)
            .with_context(|| format!("Failed to write {:?}", output))?;

        if log_every > 0 && writer.written() % log_every == 0 {
            let summary = stats.summary();
            info!(
                "Progress: records={} simulated_ms={} p50={}ms p95={}ms",
                summary.records,
                summary.last_timestamp_ms.unwrap_or(start_time_ms) - start_time_ms,
                summary.elapsed_p50_ms,
                summary.elapsed_p95_ms
            );
        }
    }

    writer
        .finish()
        .with_context(|| format!("Failed to finish {:?}", output))?;

    Ok(RunReport {
        timestamp: Utc::now().to_rfc3339(),
        output: output.display().to_string(),
        seed: None,
        duration_secs: params.duration_secs,
        label_count: params.label_count,
        thread_count: params.thread_count,
        start_time_ms,
        end_time_ms,
        summary: stats.summary(),
    })
}

fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!("\n=== JTL Summary ({}) ===", report.output);
    println!("Records: {}", summary.records);
    println!("Threads: {}", summary.threads);
    println!("Labels: {}", summary.labels);
    if let (Some(first), Some(last)) = (summary.first_timestamp_ms, summary.last_timestamp_ms) {
        println!("Simulated span: {}ms", last.max(first) - report.start_time_ms);
    }
    println!("Elapsed mean: {}ms", summary.elapsed_mean_ms);
    println!("Elapsed p50: {}ms", summary.elapsed_p50_ms);
    println!("Elapsed p95: {}ms", summary.elapsed_p95_ms);
    println!("Elapsed p99: {}ms", summary.elapsed_p99_ms);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;
    use jtl_core::read_jtl;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_650_283_530_000).unwrap()
    }

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_args_positional() {
        let args = Args::try_parse_from(["generate-jtl", "out.jtl", "60", "3", "2"]).unwrap();
        assert_eq!(args.output_filename, PathBuf::from("out.jtl"));
        assert_eq!(args.duration, 60);
        assert_eq!(args.label_count, 3);
        assert_eq!(args.thread_count, 2);
        assert_eq!(args.seed, None);
        assert_eq!(args.log_every, 100000);
    }

    #[test]
    fn test_args_missing_positional_is_error() {
        assert!(Args::try_parse_from(["generate-jtl", "out.jtl", "60", "3"]).is_err());
        assert!(Args::try_parse_from(["generate-jtl"]).is_err());
    }

    #[test]
    fn test_args_negative_duration_and_flags() {
        let args = Args::try_parse_from([
            "generate-jtl",
            "out.jtl",
            "-5",
            "1",
            "1",
            "--seed",
            "7",
            "--summary",
            "summary.json",
        ])
        .unwrap();
        assert_eq!(args.duration, -5);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.summary, Some(PathBuf::from("summary.json")));
    }

    #[test]
    fn test_run_generation_writes_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp").join("checkout.jtl");

        let params = RunParams {
            duration_secs: 60,
            label_count: 3,
            thread_count: 2,
        };
        let report = run_generation(
            &path,
            params,
            &GeneratorConfig::default(),
            start(),
            StdRng::seed_from_u64(42),
            0,
        )
        .unwrap();

        let records = read_jtl(&path).unwrap();
        assert_eq!(records.len() as u64, report.summary.records);
        assert_eq!(report.summary.threads, 2);
        assert_eq!(report.summary.labels, 3);
        assert_eq!(report.start_time_ms, 1_650_283_530_000);
        assert_eq!(report.end_time_ms, 1_650_283_590_000);
        assert!(records.iter().all(|r| r.all_threads == 2));
    }

    #[test]
    fn test_run_generation_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let params = RunParams {
            duration_secs: 30,
            label_count: 2,
            thread_count: 3,
        };

        let mut outputs = Vec::new();
        for name in ["a.jtl", "b.jtl"] {
            let path = dir.path().join(name);
            run_generation(
                &path,
                params,
                &GeneratorConfig::default(),
                start(),
                StdRng::seed_from_u64(5),
                0,
            )
            .unwrap();
            outputs.push(std::fs::read(&path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_run_generation_rejects_zero_labels() {
        let dir = tempfile::tempdir().unwrap();
        let params = RunParams {
            duration_secs: 30,
            label_count: 0,
            thread_count: 1,
        };
        let result = run_generation(
            &dir.path().join("none.jtl"),
            params,
            &GeneratorConfig::default(),
            start(),
            StdRng::seed_from_u64(5),
            0,
        );
        assert!(result.is_err());
    }
}
