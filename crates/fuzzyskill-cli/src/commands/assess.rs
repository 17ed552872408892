//! The `fuzzyskill assess` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use fuzzyskill_core::config::{load_config_from, AssessmentConfig, MetricMembership, Shrink};
use fuzzyskill_core::defuzzify::Defuzzifier;
use fuzzyskill_core::engine::{AssessmentEngine, EngineConfig, ProgressReporter};
use fuzzyskill_core::parser;
use fuzzyskill_core::report::{AssessmentReport, RecordAssessment};

/// Arguments of `fuzzyskill assess`.
pub struct AssessArgs {
    pub dataset: PathBuf,
    pub config: Option<PathBuf>,
    pub defuzzifier: Option<String>,
    pub shrink: Option<String>,
    pub membership: Option<String>,
    pub parallelism: usize,
    pub output: PathBuf,
    pub format: String,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_record_start(&self, test_id: &str) {
        tracing::debug!("assessing {test_id}");
    }

    fn on_record_complete(&self, result: &RecordAssessment) {
        eprintln!(
            "  Done: {} score {:.3} ({}ms)",
            result.test_id, result.score, result.duration_ms
        );
    }

    fn on_record_error(&self, test_id: &str, error: &str) {
        eprintln!("  ERROR: {test_id}: {error}");
    }

    fn on_dataset_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} assessed, {failed} failed ({:.2}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: AssessArgs) -> Result<()> {
    anyhow::ensure!(args.parallelism >= 1, "parallelism must be at least 1");
    anyhow::ensure!(
        matches!(args.format.as_str(), "text" | "json"),
        "unknown format '{}', expected text or json",
        args.format
    );

    let mut config = load_config_from(args.config.as_deref())?;
    apply_flags(&mut config, &args)?;

    let datasets = parser::load_datasets(&args.dataset)?;
    anyhow::ensure!(
        !datasets.is_empty(),
        "no datasets found in {}",
        args.dataset.display()
    );

    let engine = AssessmentEngine::new(EngineConfig {
        parallelism: args.parallelism,
        assessment: config.clone(),
    });
    let reporter = ConsoleReporter;

    for dataset in &datasets {
        eprintln!(
            "fuzzyskill v{} - Assessing {} records of {} ({} metrics, {} training records, {})",
            env!("CARGO_PKG_VERSION"),
            dataset.tests.len(),
            dataset.name,
            dataset.metrics.len(),
            dataset.training.len(),
            config.defuzzifier
        );
        eprintln!();

        let report = engine.run(dataset, &reporter).await?;

        match args.format.as_str() {
            "json" => {
                std::fs::create_dir_all(&args.output).with_context(|| {
                    format!("failed to create output directory {}", args.output.display())
                })?;
                let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
                let path = args
                    .output
                    .join(format!("report-{}-{timestamp}.json", dataset.id));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            _ => print_summary(&report),
        }
    }

    Ok(())
}

/// Command-line flags win over the config file and environment.
fn apply_flags(config: &mut AssessmentConfig, args: &AssessArgs) -> Result<()> {
    if let Some(name) = &args.defuzzifier {
        config.defuzzifier = name.parse::<Defuzzifier>().context("--defuzzifier")?;
    }
    if let Some(name) = &args.shrink {
        config.shrink = name.parse::<Shrink>().context("--shrink")?;
    }
    if let Some(name) = &args.membership {
        config.metric_membership = name.parse::<MetricMembership>().context("--membership")?;
    }
    Ok(())
}

fn print_summary(report: &AssessmentReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Record", "Score", "Strongest rule", "Time"]);

    for result in &report.results {
        let strongest = fuzzyskill_core::assessment::rank_firings(&result.firings)
            .first()
            .map(|f| format!("{} -> {} ({:.3})", f.metric, f.skill_class, f.strength))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&result.test_id),
            Cell::new(format!("{:.3}", result.score)),
            Cell::new(strongest),
            Cell::new(format!("{}ms", result.duration_ms)),
        ]);
    }

    println!("{table}");
    println!(
        "Mean {:.3}, min {:.3}, max {:.3} over {} record(s)\n",
        report.summary.mean, report.summary.min, report.summary.max, report.summary.count
    );

    for result in &report.results {
        println!("[{}]\n{}\n", result.test_id, result.explanation);
    }
}
