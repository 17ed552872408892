//! Membership functions as a small expression tree.
//!
//! Leaves are parametric shapes. A composite node folds its children with a
//! [`Norm`], right to left: `⊕(c0(v), ⊕(c1(v), … cN(v)))`. The combinator of a
//! composite may be left unset and supplied at evaluation time instead
//! (see [`MembershipFunction::evaluate_with`]), which is how the defuzzifiers
//! pick their aggregation without touching the tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::norm::Norm;

/// The parametric leaf shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipShape {
    /// `[left, peak, right]`
    Triangle,
    /// `[left, plateau_start, plateau_end, right]`
    Trapezoid,
    /// `[mean, stdev]` or `[scale, mean, stdev]`
    Gaussian,
    /// `[constant]`
    Flat,
    /// `[bandwidth, x1, w1, x2, w2, …]`
    GaussianKde,
}

impl MembershipShape {
    /// Whether `count` parameters describe a well-formed leaf of this shape.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            MembershipShape::Triangle => count == 3,
            MembershipShape::Trapezoid => count == 4,
            MembershipShape::Gaussian => count == 2 || count == 3,
            MembershipShape::Flat => count == 1,
            MembershipShape::GaussianKde => count >= 3 && count % 2 == 1,
        }
    }
}

impl fmt::Display for MembershipShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipShape::Triangle => write!(f, "triangle"),
            MembershipShape::Trapezoid => write!(f, "trapezoid"),
            MembershipShape::Gaussian => write!(f, "gaussian"),
            MembershipShape::Flat => write!(f, "flat"),
            MembershipShape::GaussianKde => write!(f, "gaussian-kde"),
        }
    }
}

/// A node of a membership-function tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipFunction {
    Leaf {
        shape: MembershipShape,
        parameters: Vec<f64>,
    },
    Composite {
        children: Vec<MembershipFunction>,
        compose: Option<Norm>,
    },
}

impl Default for MembershipFunction {
    fn default() -> Self {
        Self::empty()
    }
}

impl MembershipFunction {
    /// A leaf with raw parameters. Malformed parameter counts are accepted
    /// here and make the leaf evaluate to 0.
    pub fn leaf(shape: MembershipShape, parameters: Vec<f64>) -> Self {
        MembershipFunction::Leaf { shape, parameters }
    }

    pub fn triangle(left: f64, peak: f64, right: f64) -> Self {
        Self::leaf(MembershipShape::Triangle, vec![left, peak, right])
    }

    pub fn trapezoid(left: f64, plateau_start: f64, plateau_end: f64, right: f64) -> Self {
        Self::leaf(
            MembershipShape::Trapezoid,
            vec![left, plateau_start, plateau_end, right],
        )
    }

    /// Unit-height Gaussian.
    pub fn gaussian(mean: f64, stdev: f64) -> Self {
        Self::leaf(MembershipShape::Gaussian, vec![mean, stdev])
    }

    /// Gaussian whose peak height is `scale`.
    pub fn scaled_gaussian(scale: f64, mean: f64, stdev: f64) -> Self {
        Self::leaf(MembershipShape::Gaussian, vec![scale, mean, stdev])
    }

    pub fn flat(value: f64) -> Self {
        Self::leaf(MembershipShape::Flat, vec![value])
    }

    /// Weighted Gaussian kernel density estimate over `(datapoint, weight)` pairs.
    pub fn gaussian_kde(bandwidth: f64, points: &[(f64, f64)]) -> Self {
        let mut parameters = Vec::with_capacity(1 + 2 * points.len());
        parameters.push(bandwidth);
        for &(x, w) in points {
            parameters.push(x);
            parameters.push(w);
        }
        Self::leaf(MembershipShape::GaussianKde, parameters)
    }

    /// A composite with no children. Evaluates to 0 everywhere.
    pub fn empty() -> Self {
        MembershipFunction::Composite {
            children: Vec::new(),
            compose: None,
        }
    }

    pub fn composite(compose: Option<Norm>, children: Vec<MembershipFunction>) -> Self {
        MembershipFunction::Composite { children, compose }
    }

    /// `compose(a(v), b(v))`.
    pub fn combine(compose: Norm, a: MembershipFunction, b: MembershipFunction) -> Self {
        Self::composite(Some(compose), vec![a, b])
    }

    /// Append a child. A leaf is first turned into a composite holding itself.
    pub fn add_base_function(&mut self, function: MembershipFunction) {
        if let MembershipFunction::Leaf { .. } = self {
            let leaf = std::mem::take(self);
            *self = Self::composite(None, vec![leaf]);
        }
        if let MembershipFunction::Composite { children, .. } = self {
            children.push(function);
        }
    }

    /// The children of a composite; empty for leaves.
    pub fn children(&self) -> &[MembershipFunction] {
        match self {
            MembershipFunction::Leaf { .. } => &[],
            MembershipFunction::Composite { children, .. } => children,
        }
    }

    /// The stored combinator of a composite.
    pub fn compose(&self) -> Option<Norm> {
        match self {
            MembershipFunction::Leaf { .. } => None,
            MembershipFunction::Composite { compose, .. } => *compose,
        }
    }

    /// True for a composite with no children.
    pub fn is_empty(&self) -> bool {
        matches!(self, MembershipFunction::Composite { children, .. } if children.is_empty())
    }

    /// Degree of membership of `value`, using the stored combinators.
    pub fn evaluate(&self, value: f64) -> f64 {
        match self {
            MembershipFunction::Leaf { shape, parameters } => {
                evaluate_leaf(*shape, parameters, value)
            }
            MembershipFunction::Composite { children, compose } => {
                fold_children(children, *compose, value)
            }
        }
    }

    /// Degree of membership of `value` with `compose` used at the root instead
    /// of the stored combinator. Nested composites keep their own.
    pub fn evaluate_with(&self, value: f64, compose: Norm) -> f64 {
        match self {
            MembershipFunction::Leaf { .. } => self.evaluate(value),
            MembershipFunction::Composite { children, .. } => {
                fold_children(children, Some(compose), value)
            }
        }
    }

    /// A copy whose values are multiplied by `factor`.
    pub fn rescaled(self, factor: f64) -> Self {
        match self {
            MembershipFunction::Leaf {
                shape: MembershipShape::Gaussian,
                mut parameters,
            } if parameters.len() == 3 => {
                parameters[0] *= factor;
                Self::leaf(MembershipShape::Gaussian, parameters)
            }
            MembershipFunction::Leaf {
                shape: MembershipShape::Gaussian,
                parameters,
            } if parameters.len() == 2 => {
                Self::scaled_gaussian(factor, parameters[0], parameters[1])
            }
            MembershipFunction::Leaf {
                shape: MembershipShape::GaussianKde,
                mut parameters,
            } if MembershipShape::GaussianKde.accepts(parameters.len()) => {
                for weight in parameters.iter_mut().skip(2).step_by(2) {
                    *weight *= factor;
                }
                Self::leaf(MembershipShape::GaussianKde, parameters)
            }
            MembershipFunction::Leaf {
                shape: MembershipShape::Flat,
                parameters,
            } if parameters.len() == 1 => Self::flat(parameters[0] * factor),
            other if other.is_empty() => other,
            other => Self::combine(Norm::GoguenT, other, Self::flat(factor)),
        }
    }
}

fn fold_children(children: &[MembershipFunction], compose: Option<Norm>, value: f64) -> f64 {
    let Some((last, rest)) = children.split_last() else {
        return 0.0;
    };
    if rest.is_empty() {
        return last.evaluate(value);
    }
    let Some(compose) = compose else {
        return 0.0;
    };
    rest.iter()
        .rev()
        .fold(last.evaluate(value), |acc, child| {
            compose.evaluate(child.evaluate(value), acc)
        })
}

fn evaluate_leaf(shape: MembershipShape, p: &[f64], v: f64) -> f64 {
    if !shape.accepts(p.len()) {
        tracing::error!(
            "{shape} membership function has {} parameters, evaluating to 0",
            p.len()
        );
        return 0.0;
    }

    match shape {
        MembershipShape::Triangle => {
            let (left, peak, right) = (p[0], p[1], p[2]);
            if v < left || v > right {
                0.0
            } else if v == peak {
                1.0
            } else if v < peak {
                (v - left) / (peak - left)
            } else {
                (right - v) / (right - peak)
            }
        }
        MembershipShape::Trapezoid => {
            let (left, start, end, right) = (p[0], p[1], p[2], p[3]);
            if v < left || v > right {
                0.0
            } else if v >= start && v <= end {
                1.0
            } else if v < start {
                (v - left) / (start - left)
            } else {
                (right - v) / (right - end)
            }
        }
        MembershipShape::Gaussian => {
            let (scale, mean, stdev) = if p.len() == 3 {
                (p[0], p[1], p[2])
            } else {
                (1.0, p[0], p[1])
            };
            if stdev <= 0.0 {
                return 0.0;
            }
            let z = (v - mean) / stdev;
            scale * (-0.5 * z * z).exp()
        }
        MembershipShape::Flat => p[0],
        MembershipShape::GaussianKde => {
            let bandwidth = p[0];
            if bandwidth <= 0.0 {
                return 0.0;
            }
            let pairs = &p[1..];
            let n = (pairs.len() / 2) as f64;
            let sum: f64 = pairs
                .chunks_exact(2)
                .map(|pair| {
                    let z = (v - pair[0]) / bandwidth;
                    pair[1] * (-z * z).exp()
                })
                .sum();
            sum / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 9] = [-1.0, 0.0, 0.1, 0.25, 0.5, 0.6, 0.75, 1.0, 2.0];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn triangle_shape() {
        let f = MembershipFunction::triangle(0.0, 0.5, 1.0);
        assert_eq!(f.evaluate(-0.1), 0.0);
        assert_eq!(f.evaluate(0.0), 0.0);
        assert!(close(f.evaluate(0.25), 0.5));
        assert_eq!(f.evaluate(0.5), 1.0);
        assert!(close(f.evaluate(0.75), 0.5));
        assert_eq!(f.evaluate(1.0), 0.0);
        assert_eq!(f.evaluate(1.5), 0.0);
    }

    #[test]
    fn trapezoid_shape() {
        let f = MembershipFunction::trapezoid(0.0, 1.0, 2.0, 4.0);
        assert!(close(f.evaluate(0.5), 0.5));
        assert_eq!(f.evaluate(1.5), 1.0);
        assert!(close(f.evaluate(3.0), 0.5));
        assert_eq!(f.evaluate(5.0), 0.0);
    }

    #[test]
    fn gaussian_forms() {
        let unit = MembershipFunction::gaussian(2.0, 1.0);
        assert_eq!(unit.evaluate(2.0), 1.0);
        assert!(close(unit.evaluate(3.0), (-0.5f64).exp()));

        let scaled = MembershipFunction::scaled_gaussian(0.4, 2.0, 1.0);
        assert!(close(scaled.evaluate(2.0), 0.4));
        assert!(close(scaled.evaluate(3.0), 0.4 * (-0.5f64).exp()));

        assert_eq!(MembershipFunction::gaussian(2.0, 0.0).evaluate(2.0), 0.0);
    }

    #[test]
    fn kde_single_point_peaks_at_weight() {
        let f = MembershipFunction::gaussian_kde(1.5, &[(3.0, 0.7)]);
        assert!(close(f.evaluate(3.0), 0.7));
        assert!(f.evaluate(4.0) < 0.7);
    }

    #[test]
    fn kde_averages_kernels() {
        let f = MembershipFunction::gaussian_kde(1.0, &[(0.0, 1.0), (10.0, 0.5)]);
        let expected = (1.0 + 0.5 * (-100.0f64).exp()) / 2.0;
        assert!(close(f.evaluate(0.0), expected));
    }

    #[test]
    fn malformed_parameters_evaluate_to_zero() {
        let cases = [
            MembershipFunction::leaf(MembershipShape::Triangle, vec![0.0, 1.0]),
            MembershipFunction::leaf(MembershipShape::Trapezoid, vec![0.0, 1.0, 2.0]),
            MembershipFunction::leaf(MembershipShape::Gaussian, vec![1.0]),
            MembershipFunction::leaf(MembershipShape::Flat, vec![]),
            MembershipFunction::leaf(MembershipShape::GaussianKde, vec![1.0, 2.0]),
        ];
        for f in &cases {
            assert_eq!(f.evaluate(0.5), 0.0, "{f:?}");
        }
    }

    #[test]
    fn empty_composite_is_zero() {
        let f = MembershipFunction::empty();
        assert!(f.is_empty());
        assert_eq!(f.evaluate(0.5), 0.0);
        assert_eq!(f.evaluate_with(0.5, Norm::GodelS), 0.0);
    }

    #[test]
    fn single_child_delegates() {
        let child = MembershipFunction::triangle(0.0, 0.5, 1.0);
        let f = MembershipFunction::composite(None, vec![child.clone()]);
        for v in SAMPLES {
            assert_eq!(f.evaluate(v), child.evaluate(v));
        }
    }

    #[test]
    fn two_children_fold_with_combinator() {
        let a = MembershipFunction::triangle(0.0, 0.5, 1.0);
        let b = MembershipFunction::trapezoid(0.25, 0.5, 0.75, 1.0);
        for norm in [Norm::GodelT, Norm::GoguenS, Norm::Add] {
            let f = MembershipFunction::combine(norm, a.clone(), b.clone());
            for v in SAMPLES {
                assert_eq!(f.evaluate(v), norm.evaluate(a.evaluate(v), b.evaluate(v)));
            }
        }
    }

    #[test]
    fn unset_combinator_with_many_children_is_zero() {
        let f = MembershipFunction::composite(
            None,
            vec![MembershipFunction::flat(0.3), MembershipFunction::flat(0.6)],
        );
        assert_eq!(f.evaluate(0.0), 0.0);
        assert_eq!(f.evaluate_with(0.0, Norm::GodelS), 0.6);
    }

    #[test]
    fn three_children_fold() {
        let equal = MembershipFunction::composite(
            Some(Norm::EqualAverage),
            vec![
                MembershipFunction::flat(0.5),
                MembershipFunction::flat(0.5),
                MembershipFunction::flat(0.5),
            ],
        );
        assert_eq!(equal.evaluate(0.0), 0.5);

        let sum = MembershipFunction::composite(
            Some(Norm::Add),
            vec![
                MembershipFunction::flat(0.1),
                MembershipFunction::flat(0.2),
                MembershipFunction::flat(0.3),
            ],
        );
        assert!(close(sum.evaluate(0.0), 0.1 + (0.2 + 0.3)));
    }

    #[test]
    fn evaluate_with_overrides_only_the_root() {
        let inner = MembershipFunction::combine(
            Norm::GodelT,
            MembershipFunction::flat(0.2),
            MembershipFunction::flat(0.8),
        );
        let mut root = MembershipFunction::empty();
        root.add_base_function(inner);
        root.add_base_function(MembershipFunction::flat(0.5));
        assert_eq!(root.evaluate_with(0.0, Norm::GodelS), 0.5);
        assert!(close(root.evaluate_with(0.0, Norm::Add), 0.7));
        assert_eq!(root.compose(), None);
    }

    #[test]
    fn add_base_function_on_leaf_wraps_it() {
        let mut f = MembershipFunction::flat(0.3);
        f.add_base_function(MembershipFunction::flat(0.6));
        assert_eq!(f.children().len(), 2);
        assert_eq!(f.evaluate_with(0.0, Norm::GodelS), 0.6);
    }

    #[test]
    fn rescaled_multiplies_values() {
        let functions = [
            MembershipFunction::gaussian(1.0, 2.0),
            MembershipFunction::scaled_gaussian(0.5, 1.0, 2.0),
            MembershipFunction::gaussian_kde(1.0, &[(0.0, 0.4), (1.0, 0.6)]),
            MembershipFunction::flat(0.8),
            MembershipFunction::triangle(-1.0, 0.0, 1.0),
        ];
        for f in functions {
            let scaled = f.clone().rescaled(0.5);
            for v in SAMPLES {
                assert!(close(scaled.evaluate(v), 0.5 * f.evaluate(v)), "{f:?} at {v}");
            }
        }
        assert!(MembershipFunction::empty().rescaled(2.0).is_empty());
    }
}
