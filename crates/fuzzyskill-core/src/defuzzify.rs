//! Defuzzification: collapsing an aggregated membership function to one crisp
//! value.
//!
//! All strategies sample the same grid `min, min + step, …` so that the
//! integrals and the maximum search agree on which points exist. Integration
//! uses the trapezoidal rule over `[min, max)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::membership::MembershipFunction;
use crate::norm::Norm;

/// Starting tolerance of the closest-maximum walk. Doubled on every failed pass.
pub const CLOSEST_MAXIMUM_TOLERANCE: f64 = 1e-6;

const MAX_TOLERANCE_DOUBLINGS: u32 = 128;

/// Number of `step`-sized intervals covering `[min, max)`.
fn interval_count(min: f64, max: f64, step: f64) -> usize {
    if !(step > 0.0) || !(max > min) {
        return 0;
    }
    ((max - min) / step - 1e-9).ceil().max(0.0) as usize
}

/// Trapezoidal integral of `f` over `[min, max)`.
pub fn integrate(f: impl Fn(f64) -> f64, min: f64, max: f64, step: f64) -> f64 {
    let intervals = interval_count(min, max, step);
    let mut total = 0.0;
    let mut left_value = f(min);
    for i in 0..intervals {
        let left = min + i as f64 * step;
        let right = (left + step).min(max);
        let right_value = f(right);
        total += (left_value + right_value) / 2.0 * (right - left);
        left_value = right_value;
    }
    total
}

/// Largest value of `f` sampled every `step` across `[min, max]`.
pub fn maximum_value(f: impl Fn(f64) -> f64, min: f64, max: f64, step: f64) -> f64 {
    let intervals = interval_count(min, max, step);
    (1..=intervals)
        .map(|i| f((min + i as f64 * step).min(max)))
        .fold(f(min), f64::max)
}

/// The point nearest to `start` where `f` reaches its sampled maximum.
///
/// Walks outward from `start` in `step` increments, accepting the first point
/// within the tolerance of the maximum. When both directions leave
/// `[min, max]` the tolerance doubles and the walk restarts.
pub fn closest_maximum(f: impl Fn(f64) -> f64, start: f64, min: f64, max: f64, step: f64) -> f64 {
    if !(step > 0.0) || !(max >= min) {
        return start;
    }
    let start = start.clamp(min, max);
    let target = maximum_value(&f, min, max, step);
    if !target.is_finite() {
        return start;
    }

    let mut tolerance = CLOSEST_MAXIMUM_TOLERANCE;
    for _ in 0..MAX_TOLERANCE_DOUBLINGS {
        let mut i = 0usize;
        loop {
            let offset = i as f64 * step;
            let below = start - offset;
            let above = start + offset;
            let below_in = below >= min;
            let above_in = above <= max;
            if !below_in && !above_in {
                break;
            }
            if below_in && (target - f(below)).abs() <= tolerance {
                return below;
            }
            if above_in && (target - f(above)).abs() <= tolerance {
                return above;
            }
            i += 1;
        }
        tolerance *= 2.0;
    }

    tracing::warn!("closest maximum search did not converge, keeping {start}");
    start
}

/// A defuzzification strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Defuzzifier {
    /// Center of area over the s-norm aggregate.
    Coa,
    /// Center of mass over the additive aggregate.
    Com,
    /// Mean of maximum.
    Mom,
    /// Center of area, snapped to the closest maximum.
    Cmcoa,
    /// Center of mass, snapped to the closest maximum.
    Cmcom,
    /// Mean of maximum, snapped to the closest maximum.
    Cmmom,
}

impl Defuzzifier {
    pub const ALL: [Defuzzifier; 6] = [
        Defuzzifier::Coa,
        Defuzzifier::Com,
        Defuzzifier::Mom,
        Defuzzifier::Cmcoa,
        Defuzzifier::Cmcom,
        Defuzzifier::Cmmom,
    ];

    /// The combinator this strategy aggregates the consequence's children with.
    pub fn aggregation(self) -> Norm {
        match self {
            Defuzzifier::Com | Defuzzifier::Cmcom => Norm::Add,
            Defuzzifier::Coa | Defuzzifier::Cmcoa | Defuzzifier::Mom | Defuzzifier::Cmmom => {
                Norm::GodelS
            }
        }
    }

    /// Crisp value of `function` over `[min, max]` sampled every `step`.
    ///
    /// The root combinator of `function` is ignored in favour of
    /// [`Defuzzifier::aggregation`]; the tree itself is not modified. A
    /// function with no area, mass, or maximum locus defuzzifies to 0.
    pub fn evaluate(self, function: &MembershipFunction, min: f64, max: f64, step: f64) -> f64 {
        let aggregation = self.aggregation();
        let f = |x: f64| function.evaluate_with(x, aggregation);
        let crisp = match self {
            Defuzzifier::Coa => centroid(&f, min, max, step, "area"),
            Defuzzifier::Com => centroid(&f, min, max, step, "mass"),
            Defuzzifier::Mom => mean_of_maximum(&f, min, max, step),
            Defuzzifier::Cmcoa => centroid(&f, min, max, step, "area")
                .map(|candidate| closest_maximum(&f, candidate, min, max, step)),
            Defuzzifier::Cmcom => centroid(&f, min, max, step, "mass")
                .map(|candidate| closest_maximum(&f, candidate, min, max, step)),
            Defuzzifier::Cmmom => mean_of_maximum(&f, min, max, step)
                .map(|candidate| closest_maximum(&f, candidate, min, max, step)),
        };
        crisp.unwrap_or(0.0)
    }

    /// Evaluate over `[min, max]` split into `number_of_steps` intervals.
    pub fn evaluate_steps(
        self,
        function: &MembershipFunction,
        min: f64,
        max: f64,
        number_of_steps: usize,
    ) -> f64 {
        let step = (max - min) / number_of_steps.max(1) as f64;
        self.evaluate(function, min, max, step)
    }
}

fn centroid(f: impl Fn(f64) -> f64, min: f64, max: f64, step: f64, what: &str) -> Option<f64> {
    let denominator = integrate(&f, min, max, step);
    if denominator == 0.0 {
        tracing::warn!("zero {what} over [{min}, {max}], defuzzifying to 0");
        return None;
    }
    Some(integrate(|x| x * f(x), min, max, step) / denominator)
}

fn mean_of_maximum(f: impl Fn(f64) -> f64, min: f64, max: f64, step: f64) -> Option<f64> {
    let peak = maximum_value(&f, min, max, step);
    let at_peak = |x: f64| Norm::EqualAverage.evaluate(f(x), peak);
    let denominator = integrate(&at_peak, min, max, step);
    if denominator == 0.0 {
        tracing::warn!("no maximum locus over [{min}, {max}], defuzzifying to 0");
        return None;
    }
    Some(integrate(|x| x * at_peak(x), min, max, step) / denominator)
}

impl fmt::Display for Defuzzifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defuzzifier::Coa => write!(f, "COA"),
            Defuzzifier::Com => write!(f, "COM"),
            Defuzzifier::Mom => write!(f, "MOM"),
            Defuzzifier::Cmcoa => write!(f, "CMCOA"),
            Defuzzifier::Cmcom => write!(f, "CMCOM"),
            Defuzzifier::Cmmom => write!(f, "CMMOM"),
        }
    }
}

impl FromStr for Defuzzifier {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COA" => Ok(Defuzzifier::Coa),
            "COM" => Ok(Defuzzifier::Com),
            "MOM" => Ok(Defuzzifier::Mom),
            "CMCOA" => Ok(Defuzzifier::Cmcoa),
            "CMCOM" => Ok(Defuzzifier::Cmcom),
            "CMMOM" => Ok(Defuzzifier::Cmmom),
            _ => Err(AssessmentError::unknown("defuzzifier", s)),
        }
    }
}
