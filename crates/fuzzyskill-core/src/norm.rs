//! Binary combinators: fuzzy t-norms, s-norms, and two helpers used by the
//! defuzzifiers.
//!
//! Inputs are expected in `[0, 1]` but are not clamped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;

/// Two values closer than this are treated as equal by [`Norm::EqualAverage`].
pub const EQUALITY_TOLERANCE: f64 = 1e-9;

/// A stateless two-argument combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Norm {
    /// Minimum.
    GodelT,
    /// Maximum.
    GodelS,
    /// Product.
    GoguenT,
    /// Probabilistic sum.
    GoguenS,
    LukasiewiczT,
    LukasiewiczS,
    NilpotentT,
    NilpotentS,
    DrasticT,
    DrasticS,
    /// Plain addition. Not a norm; used for center-of-mass aggregation.
    Add,
    /// Average of two numerically equal values, 0 otherwise. Not a norm; used
    /// to restrict a function to the locus of its maximum.
    EqualAverage,
}

impl Norm {
    /// Every true t-norm.
    pub const T_NORMS: [Norm; 5] = [
        Norm::GodelT,
        Norm::GoguenT,
        Norm::LukasiewiczT,
        Norm::NilpotentT,
        Norm::DrasticT,
    ];

    /// Every true s-norm, paired index-wise with [`Norm::T_NORMS`].
    pub const S_NORMS: [Norm; 5] = [
        Norm::GodelS,
        Norm::GoguenS,
        Norm::LukasiewiczS,
        Norm::NilpotentS,
        Norm::DrasticS,
    ];

    /// Combine two values.
    pub fn evaluate(self, x: f64, y: f64) -> f64 {
        match self {
            Norm::GodelT => x.min(y),
            Norm::GodelS => x.max(y),
            Norm::GoguenT => x * y,
            Norm::GoguenS => x + y - x * y,
            Norm::LukasiewiczT => (x + y - 1.0).max(0.0),
            Norm::LukasiewiczS => (x + y).min(1.0),
            Norm::NilpotentT => {
                if x + y > 1.0 {
                    x.min(y)
                } else {
                    0.0
                }
            }
            Norm::NilpotentS => {
                if x + y < 1.0 {
                    x.max(y)
                } else {
                    1.0
                }
            }
            Norm::DrasticT => {
                if x.max(y) == 1.0 {
                    x.min(y)
                } else {
                    0.0
                }
            }
            Norm::DrasticS => {
                if x.min(y) == 0.0 {
                    x.max(y)
                } else {
                    1.0
                }
            }
            Norm::Add => x + y,
            Norm::EqualAverage => {
                if (x - y).abs() < EQUALITY_TOLERANCE {
                    (x + y) / 2.0
                } else {
                    0.0
                }
            }
        }
    }

    /// The value to seed a fold with: `1 - self(0, 1)`.
    ///
    /// This is 1 for t-norms and 0 for s-norms (and for [`Norm::Add`]).
    pub fn identity(self) -> f64 {
        1.0 - self.evaluate(0.0, 1.0)
    }

    /// Whether this combinator is one of the five t-norms.
    pub fn is_t_norm(self) -> bool {
        Self::T_NORMS.contains(&self)
    }

    /// Whether this combinator is one of the five s-norms.
    pub fn is_s_norm(self) -> bool {
        Self::S_NORMS.contains(&self)
    }

    fn as_str(self) -> &'static str {
        match self {
            Norm::GodelT => "godel-t",
            Norm::GodelS => "godel-s",
            Norm::GoguenT => "goguen-t",
            Norm::GoguenS => "goguen-s",
            Norm::LukasiewiczT => "lukasiewicz-t",
            Norm::LukasiewiczS => "lukasiewicz-s",
            Norm::NilpotentT => "nilpotent-t",
            Norm::NilpotentS => "nilpotent-s",
            Norm::DrasticT => "drastic-t",
            Norm::DrasticS => "drastic-s",
            Norm::Add => "add",
            Norm::EqualAverage => "equal-average",
        }
    }
}

impl fmt::Display for Norm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Norm {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "godel-t" | "min" => Ok(Norm::GodelT),
            "godel-s" | "max" => Ok(Norm::GodelS),
            "goguen-t" | "product" => Ok(Norm::GoguenT),
            "goguen-s" | "probabilistic-sum" => Ok(Norm::GoguenS),
            "lukasiewicz-t" => Ok(Norm::LukasiewiczT),
            "lukasiewicz-s" => Ok(Norm::LukasiewiczS),
            "nilpotent-t" => Ok(Norm::NilpotentT),
            "nilpotent-s" => Ok(Norm::NilpotentS),
            "drastic-t" => Ok(Norm::DrasticT),
            "drastic-s" => Ok(Norm::DrasticS),
            "add" => Ok(Norm::Add),
            "equal-average" => Ok(Norm::EqualAverage),
            _ => Err(AssessmentError::unknown("norm", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
    const TOL: f64 = 1e-12;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOL
    }

    #[test]
    fn formulas_match_table() {
        assert_eq!(Norm::GodelT.evaluate(0.3, 0.6), 0.3);
        assert_eq!(Norm::GodelS.evaluate(0.3, 0.6), 0.6);
        assert!(close(Norm::GoguenT.evaluate(0.5, 0.5), 0.25));
        assert!(close(Norm::GoguenS.evaluate(0.5, 0.5), 0.75));
        assert!(close(Norm::LukasiewiczT.evaluate(0.75, 0.5), 0.25));
        assert_eq!(Norm::LukasiewiczT.evaluate(0.25, 0.5), 0.0);
        assert_eq!(Norm::LukasiewiczS.evaluate(0.75, 0.5), 1.0);
        assert_eq!(Norm::NilpotentT.evaluate(0.75, 0.5), 0.5);
        assert_eq!(Norm::NilpotentT.evaluate(0.25, 0.5), 0.0);
        assert_eq!(Norm::NilpotentS.evaluate(0.25, 0.5), 0.5);
        assert_eq!(Norm::NilpotentS.evaluate(0.75, 0.5), 1.0);
        assert_eq!(Norm::DrasticT.evaluate(1.0, 0.4), 0.4);
        assert_eq!(Norm::DrasticT.evaluate(0.9, 0.4), 0.0);
        assert_eq!(Norm::DrasticS.evaluate(0.0, 0.4), 0.4);
        assert_eq!(Norm::DrasticS.evaluate(0.1, 0.4), 1.0);
        assert_eq!(Norm::Add.evaluate(0.75, 0.5), 1.25);
    }

    #[test]
    fn equal_average_only_on_equal_inputs() {
        assert_eq!(Norm::EqualAverage.evaluate(0.5, 0.5), 0.5);
        assert_eq!(Norm::EqualAverage.evaluate(0.5, 0.6), 0.0);
    }

    #[test]
    fn identities() {
        for t in Norm::T_NORMS {
            assert_eq!(t.identity(), 1.0, "{t}");
            for &x in &GRID {
                assert!(close(t.evaluate(x, 1.0), x), "{t}({x}, 1)");
            }
        }
        for s in Norm::S_NORMS {
            assert_eq!(s.identity(), 0.0, "{s}");
            for &x in &GRID {
                assert!(close(s.evaluate(x, 0.0), x), "{s}({x}, 0)");
            }
        }
    }

    #[test]
    fn commutative_and_associative() {
        for norm in Norm::T_NORMS.into_iter().chain(Norm::S_NORMS) {
            for &x in &GRID {
                for &y in &GRID {
                    assert!(close(norm.evaluate(x, y), norm.evaluate(y, x)), "{norm}");
                    for &z in &GRID {
                        let left = norm.evaluate(norm.evaluate(x, y), z);
                        let right = norm.evaluate(x, norm.evaluate(y, z));
                        assert!(close(left, right), "{norm}: ({x}, {y}, {z})");
                    }
                }
            }
        }
    }

    #[test]
    fn monotone_in_each_argument() {
        for norm in Norm::T_NORMS.into_iter().chain(Norm::S_NORMS) {
            for &y in &GRID {
                for pair in GRID.windows(2) {
                    let (lo, hi) = (pair[0], pair[1]);
                    assert!(norm.evaluate(lo, y) <= norm.evaluate(hi, y) + TOL, "{norm}");
                    assert!(norm.evaluate(y, lo) <= norm.evaluate(y, hi) + TOL, "{norm}");
                }
            }
        }
    }

    #[test]
    fn de_morgan_pairs() {
        for (t, s) in Norm::T_NORMS.into_iter().zip(Norm::S_NORMS) {
            for &x in &GRID {
                for &y in &GRID {
                    let dual = 1.0 - t.evaluate(1.0 - x, 1.0 - y);
                    assert!(close(s.evaluate(x, y), dual), "{s} vs {t} at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn display_and_parse() {
        for norm in Norm::T_NORMS.into_iter().chain(Norm::S_NORMS) {
            assert_eq!(norm.to_string().parse::<Norm>().unwrap(), norm);
        }
        assert_eq!("min".parse::<Norm>().unwrap(), Norm::GodelT);
        assert_eq!("Goguen_T".parse::<Norm>().unwrap(), Norm::GoguenT);
        assert!("hamacher".parse::<Norm>().is_err());
    }

    #[test]
    fn classification() {
        assert!(Norm::GodelT.is_t_norm());
        assert!(Norm::DrasticS.is_s_norm());
        assert!(!Norm::Add.is_t_norm() && !Norm::Add.is_s_norm());
        assert_eq!(Norm::Add.identity(), 0.0);
    }
}
