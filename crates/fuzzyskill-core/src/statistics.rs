//! Weighted sample statistics and aggregate score statistics.
//!
//! The bandwidth estimator is Silverman's rule of thumb for a Gaussian kernel.

use serde::{Deserialize, Serialize};

/// Weighted mean and standard deviation of `values`.
///
/// `weights` are expected to sum to 1. Returns `None` if the slices are empty
/// or of different lengths. Variance rounding below zero is clamped.
pub fn weighted_mean_stdev(values: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() || values.len() != weights.len() {
        return None;
    }
    let mean: f64 = values.iter().zip(weights).map(|(x, w)| w * x).sum();
    let second: f64 = values.iter().zip(weights).map(|(x, w)| w * x * x).sum();
    let variance = (second - mean * mean).max(0.0);
    Some((mean, variance.sqrt()))
}

/// Silverman's rule-of-thumb bandwidth: `(4·σ⁵ / (3·n))^(1/5)`.
///
/// `effective_count` is the total (unnormalized) membership weight of the
/// sample. Returns 0 when either input is non-positive.
pub fn silverman_bandwidth(stdev: f64, effective_count: f64) -> f64 {
    if stdev <= 0.0 || effective_count <= 0.0 {
        return 0.0;
    }
    (4.0 * stdev.powi(5) / (3.0 * effective_count)).powf(0.2)
}

/// Normalize `weights` to sum to 1. Returns the original total alongside,
/// or `None` if the total is not positive.
pub fn normalize(weights: &[f64]) -> Option<(Vec<f64>, f64)> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    Some((weights.iter().map(|w| w / total).collect(), total))
}

/// Summary of the crisp scores in one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Number of assessed records.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation.
    pub stdev: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: scores.len(),
            mean,
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            stdev: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_moments() {
        let (mean, stdev) = weighted_mean_stdev(&[10.0, 20.0], &[0.5, 0.5]).unwrap();
        assert!((mean - 15.0).abs() < 1e-12);
        assert!((stdev - 5.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_moments_ignore_zero_weights() {
        let (mean, stdev) =
            weighted_mean_stdev(&[10.0, 20.0, 80.0, 90.0], &[0.5, 0.5, 0.0, 0.0]).unwrap();
        assert!((mean - 15.0).abs() < 1e-12);
        assert!((stdev - 5.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_has_zero_stdev() {
        let (mean, stdev) = weighted_mean_stdev(&[3.0, 3.0, 3.0], &[0.2, 0.3, 0.5]).unwrap();
        assert!((mean - 3.0).abs() < 1e-12);
        assert!(stdev < 1e-6);
    }

    #[test]
    fn weighted_moments_reject_bad_shapes() {
        assert!(weighted_mean_stdev(&[], &[]).is_none());
        assert!(weighted_mean_stdev(&[1.0], &[0.5, 0.5]).is_none());
    }

    #[test]
    fn silverman_reference_value() {
        // σ = 1, n = 100: (4 / 300)^0.2 ≈ 0.42168
        let h = silverman_bandwidth(1.0, 100.0);
        assert!((h - 0.421_685).abs() < 1e-5, "got {h}");
        assert_eq!(silverman_bandwidth(0.0, 10.0), 0.0);
        assert_eq!(silverman_bandwidth(1.0, 0.0), 0.0);
    }

    #[test]
    fn normalize_weights() {
        let (w, total) = normalize(&[1.0, 3.0]).unwrap();
        assert_eq!(total, 4.0);
        assert_eq!(w, vec![0.25, 0.75]);
        assert!(normalize(&[0.0, 0.0]).is_none());
        assert!(normalize(&[]).is_none());
    }

    #[test]
    fn score_summary() {
        let s = ScoreSummary::from_scores(&[0.2, 0.4, 0.6]);
        assert_eq!(s.count, 3);
        assert!((s.mean - 0.4).abs() < 1e-12);
        assert_eq!(s.min, 0.2);
        assert_eq!(s.max, 0.6);
        assert_eq!(ScoreSummary::from_scores(&[]), ScoreSummary::default());
    }
}
