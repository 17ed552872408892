//! Assessment reports with JSON persistence and regression detection.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::RuleFiring;
use crate::config::AssessmentConfig;
use crate::model::Dataset;
use crate::statistics::ScoreSummary;

/// A complete batch assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub dataset: DatasetSummary,
    /// Name of the method that produced the scores.
    pub method: String,
    /// Configuration the scores were computed with.
    pub config: AssessmentConfig,
    /// One entry per successfully assessed test record, in dataset order.
    pub results: Vec<RecordAssessment>,
    pub summary: ScoreSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a dataset (without the records).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    pub metric_count: usize,
    pub training_count: usize,
    pub test_count: usize,
}

impl DatasetSummary {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            metric_count: dataset.metrics.len(),
            training_count: dataset.training.len(),
            test_count: dataset.tests.len(),
        }
    }
}

/// The assessment of one test record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAssessment {
    pub test_id: String,
    pub score: f64,
    pub explanation: String,
    #[serde(default)]
    pub firings: Vec<RuleFiring>,
    pub duration_ms: u64,
}

impl AssessmentReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline.
    ///
    /// A record regressed (or improved) when its score moved down (or up) by
    /// more than `threshold`.
    pub fn compare(&self, baseline: &AssessmentReport, threshold: f64) -> RegressionReport {
        let baseline_scores: HashMap<&str, f64> = baseline
            .results
            .iter()
            .map(|r| (r.test_id.as_str(), r.score))
            .collect();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_records = 0usize;

        for result in &self.results {
            let Some(&baseline_score) = baseline_scores.get(result.test_id.as_str()) else {
                new_records += 1;
                continue;
            };
            let change = ScoreChange {
                test_id: result.test_id.clone(),
                baseline_score,
                current_score: result.score,
                delta: result.score - baseline_score,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let current_ids: HashSet<&str> = self.results.iter().map(|r| r.test_id.as_str()).collect();
        let removed_records = baseline
            .results
            .iter()
            .filter(|r| !current_ids.contains(r.test_id.as_str()))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_records,
            removed_records,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Records whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Records whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Records with no significant change.
    pub unchanged: usize,
    /// Records in current but not baseline.
    pub new_records: usize,
    /// Records in baseline but not current.
    pub removed_records: usize,
}

/// A significant score change for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub test_id: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged, {} new, {} removed\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.new_records,
            self.removed_records
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Record | Baseline | Current | Delta |\n");
            md.push_str("|--------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.3} | {:.3} | {:+.3} |\n",
                    c.test_id, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
