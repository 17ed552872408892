//! TOML dataset parser.
//!
//! Loads datasets from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Dataset, Metric, TestRecord, TrainingRecord};
use crate::statistics::weighted_mean_stdev;

/// Intermediate TOML structure for parsing dataset files.
#[derive(Debug, Deserialize)]
struct TomlDatasetFile {
    dataset: TomlDatasetHeader,
    #[serde(default)]
    metrics: Vec<TomlMetric>,
    #[serde(default)]
    training: Vec<TomlTrainingRecord>,
    #[serde(default)]
    tests: Vec<TomlTestRecord>,
}

#[derive(Debug, Deserialize)]
struct TomlDatasetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlMetric {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_weight")]
    weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TomlTrainingRecord {
    #[serde(default)]
    id: Option<String>,
    skill: f64,
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct TomlTestRecord {
    id: String,
    values: Vec<f64>,
}

/// Parse a single TOML file into a `Dataset`.
pub fn parse_dataset(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file: {}", path.display()))?;

    parse_dataset_str(&content, path)
}

/// Parse a TOML string into a `Dataset` (useful for testing).
pub fn parse_dataset_str(content: &str, source_path: &Path) -> Result<Dataset> {
    let parsed: TomlDatasetFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let metrics = parsed
        .metrics
        .into_iter()
        .map(|m| Metric {
            name: m.name,
            description: m.description,
            weight: m.weight,
        })
        .collect();

    let training = parsed
        .training
        .into_iter()
        .map(|r| TrainingRecord {
            id: r.id,
            skill: r.skill,
            values: r.values,
        })
        .collect();

    let tests = parsed
        .tests
        .into_iter()
        .map(|t| TestRecord {
            id: t.id,
            values: t.values,
        })
        .collect();

    Ok(Dataset {
        id: parsed.dataset.id,
        name: parsed.dataset.name,
        description: parsed.dataset.description,
        metrics,
        training,
        tests,
    })
}

/// Recursively load all `.toml` dataset files from a directory.
///
/// Files that fail to parse are skipped with a warning. Results are sorted by
/// path.
pub fn load_dataset_directory(dir: &Path) -> Result<Vec<Dataset>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut datasets = Vec::new();
    for path in paths {
        if path.is_dir() {
            datasets.extend(load_dataset_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_dataset(&path) {
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(datasets)
}

/// Load a dataset file, or every dataset under a directory.
pub fn load_datasets(path: &Path) -> Result<Vec<Dataset>> {
    if path.is_dir() {
        load_dataset_directory(path)
    } else {
        Ok(vec![parse_dataset(path)?])
    }
}

/// A warning from dataset validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The record or metric the warning is about (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn about(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            message: message.into(),
        }
    }
}

/// Validate a dataset for common issues.
///
/// Length mismatches and duplicate metric names make assessment fail; the
/// remaining warnings flag data that assesses poorly.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let metric_count = dataset.metrics.len();

    if metric_count == 0 {
        warnings.push(ValidationWarning {
            subject: None,
            message: "no metrics defined".into(),
        });
    }

    let mut seen_metrics = HashSet::new();
    for metric in &dataset.metrics {
        if !seen_metrics.insert(&metric.name) {
            warnings.push(ValidationWarning::about(
                &metric.name,
                format!("duplicate metric name: {}", metric.name),
            ));
        }
        if !(metric.weight > 0.0) {
            warnings.push(ValidationWarning::about(
                &metric.name,
                format!("metric weight {} is not positive", metric.weight),
            ));
        }
    }

    if dataset.training.is_empty() {
        warnings.push(ValidationWarning {
            subject: None,
            message: "no training records".into(),
        });
    }

    for (i, record) in dataset.training.iter().enumerate() {
        let subject = || {
            record
                .id
                .clone()
                .unwrap_or_else(|| format!("training[{i}]"))
        };
        if !record.skill.is_finite() {
            warnings.push(ValidationWarning::about(
                subject(),
                format!("skill label {} is not a finite number", record.skill),
            ));
        }
        if let Some(v) = record.values.iter().find(|v| !v.is_finite()) {
            warnings.push(ValidationWarning::about(
                subject(),
                format!("training record contains non-finite value {v}"),
            ));
        }
        if record.values.len() != metric_count {
            warnings.push(ValidationWarning::about(
                subject(),
                format!(
                    "training record has {} values, expected {metric_count}",
                    record.values.len()
                ),
            ));
        }
    }

    let mut seen_tests = HashSet::new();
    for test in &dataset.tests {
        if !seen_tests.insert(&test.id) {
            warnings.push(ValidationWarning::about(
                &test.id,
                format!("duplicate test id: {}", test.id),
            ));
        }
        if let Some(v) = test.values.iter().find(|v| !v.is_finite()) {
            warnings.push(ValidationWarning::about(
                &test.id,
                format!("test record contains non-finite value {v}"),
            ));
        }
        if test.values.len() != metric_count {
            warnings.push(ValidationWarning::about(
                &test.id,
                format!(
                    "test record has {} values, expected {metric_count}",
                    test.values.len()
                ),
            ));
        }
    }

    if dataset.tests.is_empty() {
        warnings.push(ValidationWarning {
            subject: None,
            message: "no test records to assess".into(),
        });
    }

    for (i, metric) in dataset.metrics.iter().enumerate() {
        let column = dataset.column(i);
        if column.len() < 2 {
            continue;
        }
        let uniform = vec![1.0 / column.len() as f64; column.len()];
        if let Some((_, stdev)) = weighted_mean_stdev(&column, &uniform) {
            if stdev <= 0.0 {
                warnings.push(ValidationWarning::about(
                    &metric.name,
                    "metric has the same value in every training record",
                ));
            }
        }
    }

    warnings
}
