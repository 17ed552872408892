//! The `fuzzyskill validate` command.

use std::path::PathBuf;

use anyhow::Result;

use fuzzyskill_core::parser;

pub fn execute(dataset_path: PathBuf) -> Result<()> {
    let datasets = parser::load_datasets(&dataset_path)?;

    let mut total_warnings = 0;

    for dataset in &datasets {
        println!(
            "Dataset: {} ({} metrics, {} training, {} tests)",
            dataset.name,
            dataset.metrics.len(),
            dataset.training.len(),
            dataset.tests.len()
        );

        let warnings = parser::validate_dataset(dataset);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|s| format!("  [{s}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All datasets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
