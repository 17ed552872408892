//! The `fuzzyskill compare` command.

use std::path::PathBuf;

use anyhow::Result;

use fuzzyskill_core::report::{AssessmentReport, ScoreChange};

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = AssessmentReport::load_json(&baseline_path)?;
    let current = AssessmentReport::load_json(&current_path)?;

    if baseline.dataset.id != current.dataset.id {
        tracing::warn!(
            "comparing reports of different datasets: {} vs {}",
            baseline.dataset.id,
            current.dataset.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );
            print_changes("Regressions", &report.regressions);
            print_changes("Improvements", &report.improvements);

            if report.new_records > 0 {
                println!("\n{} new record(s)", report.new_records);
            }
            if report.removed_records > 0 {
                println!("{} removed record(s)", report.removed_records);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_changes(title: &str, changes: &[ScoreChange]) {
    if changes.is_empty() {
        return;
    }
    println!("\n{title}:");
    for c in changes {
        println!(
            "  {} {:.3} -> {:.3} ({:+.3})",
            c.test_id, c.baseline_score, c.current_score, c.delta
        );
    }
}
