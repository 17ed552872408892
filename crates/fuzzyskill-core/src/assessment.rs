//! Fuzzy skill assessment.
//!
//! One assessment runs a single pass:
//!
//! 1. partition the skill axis into evenly spaced triangular classes;
//! 2. learn one membership function per (class, metric) from the training
//!    records, weighting each record by how much its label belongs to the class;
//! 3. rescale each metric's functions so their joint maximum is 1;
//! 4. build one rule per (class, metric): IF metric looks like class THEN
//!    skill is class;
//! 5. fire every rule on the test record and collect the shrunk, weighted
//!    outputs under one consequence function;
//! 6. defuzzify the consequence over the padded skill axis;
//! 7. rank the rules by firing strength for the explanation.
//!
//! Every tree is built fresh for the call and nothing is shared between calls,
//! so independent assessments can run in parallel.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::{AssessmentConfig, MetricMembership};
use crate::defuzzify::maximum_value;
use crate::error::AssessmentError;
use crate::membership::MembershipFunction;
use crate::rule::FuzzyRule;
use crate::statistics::{normalize, silverman_bandwidth, weighted_mean_stdev};
use crate::traits::AssessmentMethod;

/// The flat inputs of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequest {
    /// Metric values of the record to assess.
    pub test_record: Vec<f64>,
    /// Metric values of each labelled record.
    pub training_records: Vec<Vec<f64>>,
    /// Per-metric rule weight.
    pub weights: Vec<f64>,
    pub metric_names: Vec<String>,
    /// True skill of each training record.
    pub skill_labels: Vec<f64>,
}

impl SkillRequest {
    /// Check that all inputs describe the same metrics and records.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        let metrics = self.metric_names.len();
        if self.test_record.len() != metrics {
            return Err(AssessmentError::length_mismatch(
                "test record",
                metrics,
                self.test_record.len(),
            ));
        }
        if self.weights.len() != metrics {
            return Err(AssessmentError::length_mismatch(
                "weights",
                metrics,
                self.weights.len(),
            ));
        }
        if self.training_records.is_empty() {
            return Err(AssessmentError::NoTrainingRecords);
        }
        if self.skill_labels.len() != self.training_records.len() {
            return Err(AssessmentError::length_mismatch(
                "skill labels",
                self.training_records.len(),
                self.skill_labels.len(),
            ));
        }
        for (i, record) in self.training_records.iter().enumerate() {
            if record.len() != metrics {
                return Err(AssessmentError::length_mismatch(
                    format!("training record {i}"),
                    metrics,
                    record.len(),
                ));
            }
        }
        if let Some(i) = self.test_record.iter().position(|v| !v.is_finite()) {
            return Err(AssessmentError::non_finite(format!("test record value {i}")));
        }
        if let Some(i) = self.weights.iter().position(|v| !v.is_finite()) {
            return Err(AssessmentError::non_finite(format!("weight {i}")));
        }
        if let Some(i) = self.skill_labels.iter().position(|v| !v.is_finite()) {
            return Err(AssessmentError::non_finite(format!("skill label {i}")));
        }
        for (i, record) in self.training_records.iter().enumerate() {
            if let Some(m) = record.iter().position(|v| !v.is_finite()) {
                return Err(AssessmentError::non_finite(format!(
                    "training record {i} value {m}"
                )));
            }
        }
        let mut seen = HashSet::new();
        for name in &self.metric_names {
            if !seen.insert(name) {
                return Err(AssessmentError::DuplicateMetric(name.clone()));
            }
        }
        Ok(())
    }
}

/// How strongly one rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    pub metric: String,
    pub skill_class: String,
    pub strength: f64,
}

/// A crisp skill score with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: f64,
    pub explanation: String,
    /// Every rule, in evaluation order (metric-major, then class).
    pub firings: Vec<RuleFiring>,
}

/// Names for `count` skill classes from lowest to highest.
pub fn skill_class_names(count: usize) -> Vec<String> {
    match count {
        0 => Vec::new(),
        1 => vec!["Novice".into()],
        2 => vec!["Novice".into(), "Expert".into()],
        3 => vec!["Novice".into(), "Intermediate".into(), "Expert".into()],
        n => std::iter::once("Novice".to_string())
            .chain((1..n - 1).map(|i| format!("Intermediate {i}")))
            .chain(std::iter::once("Expert".to_string()))
            .collect(),
    }
}

/// Evenly spaced triangles over the skill axis. Adjacent triangles sum to 1
/// between their peaks.
pub fn skill_class_functions(config: &AssessmentConfig) -> Vec<MembershipFunction> {
    let width = config.triangle_width();
    (0..config.skill_classes)
        .map(|i| {
            let peak = config.min_skill + i as f64 * width;
            MembershipFunction::triangle(peak - width, peak, peak + width)
        })
        .collect()
}

/// Estimate a metric's membership function for one class.
///
/// `degrees` is each training record's membership in the class. Returns an
/// empty function if no record belongs to the class or the weighted sample
/// has no spread.
pub fn estimate_membership(
    values: &[f64],
    degrees: &[f64],
    kind: MetricMembership,
) -> MembershipFunction {
    let Some((weights, total)) = normalize(degrees) else {
        return MembershipFunction::empty();
    };
    let Some((mean, stdev)) = weighted_mean_stdev(values, &weights) else {
        return MembershipFunction::empty();
    };
    if stdev <= 0.0 {
        return MembershipFunction::empty();
    }
    match kind {
        MetricMembership::Gaussian => MembershipFunction::scaled_gaussian(1.0, mean, stdev),
        MetricMembership::NonParametric => {
            let bandwidth = silverman_bandwidth(stdev, total);
            // Every training value contributes a pair, so all classes of a
            // metric share the same kernel normalization.
            let points: Vec<(f64, f64)> = values
                .iter()
                .zip(&weights)
                .map(|(x, w)| (*x, *w))
                .collect();
            MembershipFunction::gaussian_kde(bandwidth, &points)
        }
    }
}

/// Learn membership functions indexed `[class][metric]`, rescaled so that for
/// each metric the tallest class peaks at 1.
pub fn metric_membership_functions(
    config: &AssessmentConfig,
    request: &SkillRequest,
    classes: &[MembershipFunction],
    class_names: &[String],
) -> Vec<Vec<MembershipFunction>> {
    let metric_count = request.metric_names.len();
    let columns: Vec<Vec<f64>> = (0..metric_count)
        .map(|m| request.training_records.iter().map(|r| r[m]).collect())
        .collect();

    let mut functions: Vec<Vec<MembershipFunction>> = classes
        .iter()
        .zip(class_names)
        .map(|(class, class_name)| {
            let degrees: Vec<f64> = request
                .skill_labels
                .iter()
                .map(|&label| class.evaluate(label))
                .collect();
            if degrees.iter().sum::<f64>() <= 0.0 {
                tracing::warn!("no training record belongs to skill class {class_name}");
                return vec![MembershipFunction::empty(); metric_count];
            }
            columns
                .iter()
                .zip(&request.metric_names)
                .map(|(column, metric)| {
                    let function = estimate_membership(column, &degrees, config.metric_membership);
                    if function.is_empty() {
                        tracing::warn!(
                            "metric {metric} has zero variance for skill class {class_name}"
                        );
                    }
                    function
                })
                .collect()
        })
        .collect();

    for (m, column) in columns.iter().enumerate() {
        let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let step = (hi - lo) / config.number_of_steps as f64;
        let peak = functions
            .iter()
            .map(|per_class| maximum_value(|x| per_class[m].evaluate(x), lo, hi, step))
            .fold(0.0, f64::max);
        if peak > 0.0 && peak != 1.0 {
            for per_class in functions.iter_mut() {
                let function = std::mem::take(&mut per_class[m]);
                per_class[m] = function.rescaled(1.0 / peak);
            }
        }
    }

    functions
}

/// One rule per (metric, class) pair, in metric-major order.
pub fn build_rules(
    config: &AssessmentConfig,
    request: &SkillRequest,
    classes: &[MembershipFunction],
    metric_functions: &[Vec<MembershipFunction>],
) -> Vec<(usize, usize, FuzzyRule)> {
    let mut rules = Vec::with_capacity(request.metric_names.len() * classes.len());
    for (m, metric) in request.metric_names.iter().enumerate() {
        for (c, class) in classes.iter().enumerate() {
            let mut rule = FuzzyRule::new(config.antecedent);
            rule.add_input_membership_function(metric_functions[c][m].clone(), metric.as_str());
            rule.set_output_membership_function(class.clone());
            rules.push((m, c, rule));
        }
    }
    rules
}

/// Assess one test record.
pub fn compute_skill(
    config: &AssessmentConfig,
    request: &SkillRequest,
) -> Result<Assessment, AssessmentError> {
    config.validate()?;
    request.validate()?;

    let classes = skill_class_functions(config);
    let class_names = skill_class_names(config.skill_classes);
    let metric_functions = metric_membership_functions(config, request, &classes, &class_names);
    let rules = build_rules(config, request, &classes, &metric_functions);

    let inputs: HashMap<String, f64> = request
        .metric_names
        .iter()
        .cloned()
        .zip(request.test_record.iter().copied())
        .collect();

    let transform = config.shrink.norm();
    let mut consequence = MembershipFunction::empty();
    let mut firings = Vec::with_capacity(rules.len());
    for (m, c, rule) in &rules {
        let strength = rule.firing_strength(&inputs);
        tracing::debug!(
            "rule {} -> {} fired with strength {strength:.4}",
            request.metric_names[*m],
            class_names[*c]
        );
        firings.push(RuleFiring {
            metric: request.metric_names[*m].clone(),
            skill_class: class_names[*c].clone(),
            strength,
        });
        let fired = rule.evaluate(&inputs, transform);
        consequence.add_base_function(MembershipFunction::combine(
            transform,
            fired,
            MembershipFunction::flat(request.weights[*m]),
        ));
    }

    let width = config.triangle_width();
    let (min, max) = (config.min_skill - width, config.max_skill + width);
    tracing::debug!(
        "defuzzifying {} rule outputs with {} over [{min}, {max}]",
        rules.len(),
        config.defuzzifier
    );
    let score = config
        .defuzzifier
        .evaluate_steps(&consequence, min, max, config.number_of_steps);

    let explanation = render_explanation(
        score,
        closest_class(score, &classes, &class_names),
        &firings,
        config.explanation_rules,
    );

    Ok(Assessment {
        score,
        explanation,
        firings,
    })
}

fn closest_class<'a>(
    score: f64,
    classes: &[MembershipFunction],
    names: &'a [String],
) -> Option<&'a str> {
    classes
        .iter()
        .zip(names)
        .map(|(class, name)| (class.evaluate(score), name))
        .filter(|(degree, _)| *degree > 0.0)
        .fold(None, |best: Option<(f64, &String)>, candidate| match best {
            Some(b) if b.0 >= candidate.0 => Some(b),
            _ => Some(candidate),
        })
        .map(|(_, name)| name.as_str())
}

/// Rules ordered by descending firing strength. Ties keep evaluation order.
pub fn rank_firings(firings: &[RuleFiring]) -> Vec<&RuleFiring> {
    let mut ranked: Vec<&RuleFiring> = firings.iter().collect();
    ranked.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Human-readable explanation listing the `limit` most influential rules.
pub fn render_explanation(
    score: f64,
    skill_class: Option<&str>,
    firings: &[RuleFiring],
    limit: usize,
) -> String {
    let mut text = match skill_class {
        Some(class) => format!("Estimated skill {score:.3} ({class})."),
        None => format!("Estimated skill {score:.3}."),
    };
    let ranked = rank_firings(firings);
    if ranked.is_empty() || limit == 0 {
        return text;
    }
    text.push_str("\nMost influential rules:");
    for (i, firing) in ranked.iter().take(limit).enumerate() {
        let _ = write!(
            text,
            "\n  {}. IF {} looks like {} THEN skill is {} (strength {:.3})",
            i + 1,
            firing.metric,
            firing.skill_class,
            firing.skill_class,
            firing.strength
        );
    }
    text
}

/// The fuzzy rule-based assessment method.
#[derive(Debug, Clone, Default)]
pub struct FuzzyAssessment {
    config: AssessmentConfig,
}

impl FuzzyAssessment {
    pub fn new(config: AssessmentConfig) -> Self {
        Self { config }
    }
}

impl AssessmentMethod for FuzzyAssessment {
    fn name(&self) -> &str {
        "fuzzy"
    }

    fn compute_skill(&self, request: &SkillRequest) -> Result<Assessment, AssessmentError> {
        compute_skill(&self.config, request)
    }
}
