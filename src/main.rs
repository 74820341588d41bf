use analytics::{
    AnalyticsEngine, ComparisonResult, DataQualityReport, DimensionEffect, GroupedStat,
    OverallStat, TopPerformerOutcome, comparison_to_csv, correlation, statistics,
};
use analyzer::BenchmarkAnalyzer;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{Config, DEFAULT_CONFIG_FILE, init_tracing, load_config};
use core_types::{MetricKey, ScopeField, SegmentFilter};
use database::{DbRepository, connect, run_migrations};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the SEI benchmark analysis tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file when there is one.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let _guard = init_tracing(&config.logging)?;

    let output = Output { json: cli.json };

    match cli.command {
        Commands::Serve => web_server::run_server(&config).await,
        Commands::Benchmarks => {
            let analyzer = build_analyzer(&config).await?;
            handle_benchmarks(&analyzer, &output).await
        }
        Commands::Stats(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_stats(&analyzer, args, &output).await
        }
        Commands::TopPerformers(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_top_performers(&analyzer, args, &output).await
        }
        Commands::Correlations(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_correlations(&analyzer, args, &output).await
        }
        Commands::Compare(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_compare(&analyzer, args, &output).await
        }
        Commands::CompareSegments(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_compare_segments(&analyzer, args, &output).await
        }
        Commands::Quality(args) => {
            let analyzer = build_analyzer(&config).await?;
            handle_quality(&analyzer, args, &output).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Statistical analysis and data-quality checks for SEI assessment benchmarks.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print results as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// List the benchmarks.
    Benchmarks,
    /// Descriptive statistics of a benchmark, optionally per group.
    Stats(StatsArgs),
    /// Regenerate top-performer profiles for one or more benchmarks.
    TopPerformers(TopPerformersArgs),
    /// Recalculate competency/outcome correlations of a benchmark.
    Correlations(BenchmarkArgs),
    /// Compare 2 to 4 benchmarks, the first being the base.
    Compare(CompareArgs),
    /// Compare 2 to 4 segments of one benchmark, the first being the base.
    CompareSegments(CompareSegmentsArgs),
    /// Data-quality report of a benchmark.
    Quality(BenchmarkArgs),
}

#[derive(Parser)]
struct BenchmarkArgs {
    /// The benchmark id.
    benchmark_id: String,
}

#[derive(Parser)]
struct StatsArgs {
    /// The benchmark id.
    benchmark_id: String,

    /// Group records by a categorical field (e.g. "country", "jobRole").
    #[arg(long, value_parser = parse_scope_field)]
    group_by: Option<ScopeField>,
}

#[derive(Parser)]
struct TopPerformersArgs {
    /// The benchmark ids.
    #[arg(required = true)]
    benchmark_ids: Vec<String>,

    /// Only this outcome (e.g. "effectiveness"); all twelve when omitted.
    #[arg(long, value_parser = parse_metric)]
    outcome: Option<MetricKey>,
}

#[derive(Parser)]
struct CompareArgs {
    /// The benchmark ids, base first.
    #[arg(required = true)]
    benchmark_ids: Vec<String>,

    /// Also write the comparison as CSV to this file.
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Parser)]
struct CompareSegmentsArgs {
    /// The benchmark id.
    benchmark_id: String,

    /// A segment as "name:field=value[,field=value...]"; repeat for each column.
    #[arg(long = "segment", required = true, value_parser = parse_segment)]
    segments: Vec<SegmentFilter>,

    /// Also write the comparison as CSV to this file.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn parse_scope_field(value: &str) -> Result<ScopeField, String> {
    ScopeField::parse(value).map_err(|e| e.to_string())
}

fn parse_metric(value: &str) -> Result<MetricKey, String> {
    MetricKey::parse(value).map_err(|e| e.to_string())
}

fn parse_segment(value: &str) -> Result<SegmentFilter, String> {
    value.parse::<SegmentFilter>().map_err(|e| e.to_string())
}

// ==============================================================================
// Wiring
// ==============================================================================

async fn build_analyzer(config: &Config) -> anyhow::Result<BenchmarkAnalyzer> {
    let db_pool = connect().await?;
    run_migrations(&db_pool).await?;
    let store = Arc::new(DbRepository::new(db_pool));
    let engine = Arc::new(AnalyticsEngine::new(config)?);
    Ok(BenchmarkAnalyzer::new(store, engine))
}

struct Output {
    json: bool,
}

impl Output {
    /// Prints `value` as JSON when requested, otherwise the rendered table.
    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce() -> Table) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", table());
        }
        Ok(())
    }
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_benchmarks(analyzer: &BenchmarkAnalyzer, output: &Output) -> anyhow::Result<()> {
    let benchmarks = analyzer.list_benchmarks().await?;
    output.emit(&benchmarks, || {
        let mut table = new_table(
            ["Id", "Name", "Type", "Scope", "Status", "Rows"]
                .map(String::from)
                .to_vec(),
        );
        for b in &benchmarks {
            table.add_row(vec![
                b.id.clone(),
                b.name.clone(),
                b.benchmark_type.to_string(),
                b.scope.to_string(),
                b.status.to_string(),
                b.total_rows.to_string(),
            ]);
        }
        table
    })
}

fn stats_table(stats: &[OverallStat]) -> Table {
    let mut table = new_table(
        ["Metric", "N", "Mean", "Median", "Std Dev", "Min", "Max", "P10", "P25", "P75", "P90", "P95"]
            .map(String::from)
            .to_vec(),
    );
    for entry in stats {
        let s = entry.stats.as_ref();
        table.add_row(vec![
            entry.metric.to_string(),
            s.map_or_else(|| "0".to_string(), |s| s.n.to_string()),
            fmt_value(s.map(|s| s.mean)),
            fmt_value(s.map(|s| s.median)),
            fmt_value(s.map(|s| s.std_dev)),
            fmt_value(s.map(|s| s.min)),
            fmt_value(s.map(|s| s.max)),
            fmt_value(s.map(|s| s.p10)),
            fmt_value(s.map(|s| s.p25)),
            fmt_value(s.map(|s| s.p75)),
            fmt_value(s.map(|s| s.p90)),
            fmt_value(s.map(|s| s.p95)),
        ]);
    }
    table
}

fn grouped_table(groups: &[GroupedStat]) -> Table {
    let mut table = new_table(
        ["Group", "Count", "EQ Mean", "K", "C", "G"]
            .map(String::from)
            .to_vec(),
    );
    for group in groups {
        let mean = |key: MetricKey| group.metrics.get(&key).map(|s| s.mean);
        table.add_row(vec![
            group.group_name.clone(),
            group.count.to_string(),
            fmt_value(mean(MetricKey::EqTotal)),
            fmt_value(mean(MetricKey::KnowYourself)),
            fmt_value(mean(MetricKey::ChooseYourself)),
            fmt_value(mean(MetricKey::GiveYourself)),
        ]);
    }
    table
}

async fn handle_stats(analyzer: &BenchmarkAnalyzer, args: StatsArgs, output: &Output) -> anyhow::Result<()> {
    match args.group_by {
        Some(field) => {
            let groups = analyzer
                .compute_grouped_statistics(&args.benchmark_id, field)
                .await?;
            output.emit(&groups, || grouped_table(&groups))
        }
        None => {
            let stats = analyzer.compute_statistics(&args.benchmark_id).await?;
            output.emit(&stats, || stats_table(&stats))
        }
    }
}

fn top_performers_table(results: &[TopPerformerOutcome]) -> Table {
    let mut table = new_table(
        ["Benchmark", "Outcome", "Threshold", "Top N", "Confidence", "Top Competencies", "Top Talents"]
            .map(String::from)
            .to_vec(),
    );
    for outcome in results {
        match outcome {
            TopPerformerOutcome::Computed(result) => {
                let keys = |effects: &[DimensionEffect]| {
                    effects
                        .iter()
                        .map(|e| format!("{} ({:.2})", e.key, e.effect_size))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                table.add_row(vec![
                    result.benchmark_id.clone(),
                    result.outcome.to_string(),
                    format!("{:.2}", result.threshold_value),
                    result.sample_size.to_string(),
                    result.confidence_level.to_string(),
                    keys(&result.top_competencies),
                    keys(&result.top_talents),
                ]);
            }
            TopPerformerOutcome::Empty(empty) => {
                table.add_row(vec![
                    empty.benchmark_id.clone(),
                    empty.outcome.to_string(),
                    "-".to_string(),
                    "0".to_string(),
                    "-".to_string(),
                    "no data".to_string(),
                    "no data".to_string(),
                ]);
            }
        }
    }
    table
}

/// Regenerates the benchmarks concurrently, one progress tick per benchmark.
async fn handle_top_performers(
    analyzer: &BenchmarkAnalyzer,
    args: TopPerformersArgs,
    output: &Output,
) -> anyhow::Result<()> {
    let progress_bar = ProgressBar::new(args.benchmark_ids.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let outcome = args.outcome;
    let tasks = args.benchmark_ids.iter().map(|benchmark_id| {
        let progress_bar = progress_bar.clone();
        async move {
            progress_bar.set_message(format!("Regenerating {benchmark_id}..."));
            let results = match outcome {
                Some(outcome) => analyzer
                    .generate_top_performers(benchmark_id, outcome)
                    .await
                    .map(|stored| vec![stored]),
                None => analyzer.regenerate_all_top_performers(benchmark_id).await,
            };
            progress_bar.inc(1);
            (benchmark_id, results)
        }
    });
    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Top performers regenerated.");

    let mut outcomes = Vec::new();
    for (benchmark_id, result) in results {
        match result {
            Ok(stored) => outcomes.extend(stored.into_iter().map(|s| s.result)),
            Err(e) => eprintln!("Benchmark {benchmark_id} failed: {e}"),
        }
    }
    output.emit(&outcomes, || top_performers_table(&outcomes))
}

async fn handle_correlations(
    analyzer: &BenchmarkAnalyzer,
    args: BenchmarkArgs,
    output: &Output,
) -> anyhow::Result<()> {
    let stored = analyzer.calculate_correlations(&args.benchmark_id).await?;
    let grouped = correlation::group_by_outcome(&stored.result);
    output.emit(&grouped, || {
        let mut table = new_table(
            ["Outcome", "Competency", "r", "Strength", "Direction", "N"]
                .map(String::from)
                .to_vec(),
        );
        for group in &grouped {
            for c in &group.correlations {
                table.add_row(vec![
                    c.outcome.to_string(),
                    c.competency.to_string(),
                    format!("{:.3}", c.correlation),
                    c.strength.to_string(),
                    c.direction.to_string(),
                    c.sample_size.to_string(),
                ]);
            }
        }
        table
    })
}

fn comparison_table(result: &ComparisonResult) -> Table {
    let mut header = vec!["Metric".to_string()];
    header.extend(result.columns.iter().map(|c| format!("{} (n={})", c.label, c.sample_size)));
    header.push("Difference %".to_string());
    let mut table = new_table(header);

    for metric in &result.metrics {
        let mut row = vec![metric.metric.to_string()];
        row.extend(
            result
                .columns
                .iter()
                .map(|c| fmt_value(metric.values.get(&c.id).map(|s| s.mean))),
        );
        let percentages: Vec<f64> = metric.non_base_percentages(&result.base_column).collect();
        row.push(fmt_value(statistics::mean(&percentages)));
        table.add_row(row);
    }
    table
}

fn write_csv(path: Option<PathBuf>, result: &ComparisonResult) -> anyhow::Result<()> {
    if let Some(path) = path {
        std::fs::write(&path, comparison_to_csv(result)?)?;
        tracing::info!(path = %path.display(), "Comparison written as CSV.");
    }
    Ok(())
}

async fn handle_compare(analyzer: &BenchmarkAnalyzer, args: CompareArgs, output: &Output) -> anyhow::Result<()> {
    let result = analyzer.compare_benchmarks(&args.benchmark_ids).await?;
    write_csv(args.csv, &result)?;
    output.emit(&result, || comparison_table(&result))
}

async fn handle_compare_segments(
    analyzer: &BenchmarkAnalyzer,
    args: CompareSegmentsArgs,
    output: &Output,
) -> anyhow::Result<()> {
    let result = analyzer
        .compare_segments(&args.benchmark_id, &args.segments)
        .await?;
    write_csv(args.csv, &result)?;
    output.emit(&result, || comparison_table(&result))
}

fn quality_table(report: &DataQualityReport) -> Table {
    let mut table = new_table(["Check", "Result"].map(String::from).to_vec());
    table.add_row(vec!["Records".to_string(), report.total_records.to_string()]);
    table.add_row(vec![
        "Quality score".to_string(),
        format!("{:.1}", report.quality_score),
    ]);
    table.add_row(vec![
        "Average completeness".to_string(),
        format!("{:.1}%", report.average_completeness),
    ]);
    for field in report.completeness.iter().take(5) {
        table.add_row(vec![
            format!("Completeness: {}", field.field),
            format!("{:.1}% ({}/{})", field.percentage, field.present, field.total),
        ]);
    }
    table.add_row(vec![
        "Duplicate groups".to_string(),
        format!(
            "{} ({} records, {} redundant)",
            report.duplicates.groups.len(),
            report.duplicates.duplicate_records,
            report.duplicates.redundant_records
        ),
    ]);
    table.add_row(vec![
        "EQ outliers".to_string(),
        format!(
            "{} (|z| >= {}, range {} to {})",
            report.outliers.total,
            report.outliers.z_threshold,
            fmt_value(report.outliers.threshold_low),
            fmt_value(report.outliers.threshold_high)
        ),
    ]);
    for bucket in &report.reliability.buckets {
        table.add_row(vec![
            format!("Reliability {}", bucket.label),
            bucket.count.to_string(),
        ]);
    }
    if report.reliability.out_of_range > 0 {
        table.add_row(vec![
            "Reliability out of range".to_string(),
            report.reliability.out_of_range.to_string(),
        ]);
    }
    table
}

async fn handle_quality(analyzer: &BenchmarkAnalyzer, args: BenchmarkArgs, output: &Output) -> anyhow::Result<()> {
    let report = analyzer.analyze_data_quality(&args.benchmark_id).await?;
    output.emit(&report, || quality_table(&report))
}
