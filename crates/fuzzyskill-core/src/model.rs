//! Core data model types for fuzzyskill.
//!
//! A dataset holds the metric definitions, the labelled training records the
//! membership functions are learned from, and the unlabelled test records to
//! assess.

use serde::{Deserialize, Serialize};

use crate::assessment::SkillRequest;

/// A numeric performance metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Unique metric name, used as the rule input name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Relative importance of the metric's rules.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// A record with a known skill label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Optional identifier for diagnostics.
    #[serde(default)]
    pub id: Option<String>,
    /// The operator's true skill on the configured skill scale.
    pub skill: f64,
    /// One value per metric, in metric order.
    pub values: Vec<f64>,
}

/// A record to assess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Unique identifier.
    pub id: String,
    /// One value per metric, in metric order.
    pub values: Vec<f64>,
}

/// Metrics, training data, and test records for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier for this dataset.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the task the metrics were recorded on.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub training: Vec<TrainingRecord>,
    #[serde(default)]
    pub tests: Vec<TestRecord>,
}

impl Dataset {
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.metrics.iter().map(|m| m.weight).collect()
    }

    pub fn skill_labels(&self) -> Vec<f64> {
        self.training.iter().map(|r| r.skill).collect()
    }

    pub fn training_values(&self) -> Vec<Vec<f64>> {
        self.training.iter().map(|r| r.values.clone()).collect()
    }

    /// Training values of metric `index`. Records too short are skipped.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.training
            .iter()
            .filter_map(|r| r.values.get(index).copied())
            .collect()
    }

    /// The assessment inputs for one test record.
    pub fn request_for(&self, test: &TestRecord) -> SkillRequest {
        SkillRequest {
            test_record: test.values.clone(),
            training_records: self.training_values(),
            weights: self.weights(),
            metric_names: self.metric_names(),
            skill_labels: self.skill_labels(),
        }
    }
}
