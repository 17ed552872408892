//! Assessment configuration and loading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::defuzzify::Defuzzifier;
use crate::error::AssessmentError;
use crate::norm::Norm;

/// Default resolution of the defuzzification grid.
pub const DEFAULT_NUMBER_OF_STEPS: usize = 1000;

/// How a rule's firing strength reduces its output function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shrink {
    /// Multiply by the firing strength.
    Scale,
    /// Cap at the firing strength.
    Clip,
}

impl Shrink {
    pub fn norm(self) -> Norm {
        match self {
            Shrink::Scale => Norm::GoguenT,
            Shrink::Clip => Norm::GodelT,
        }
    }
}

impl fmt::Display for Shrink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shrink::Scale => write!(f, "scale"),
            Shrink::Clip => write!(f, "clip"),
        }
    }
}

impl FromStr for Shrink {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scale" => Ok(Shrink::Scale),
            "clip" => Ok(Shrink::Clip),
            _ => Err(AssessmentError::unknown("shrink function", s)),
        }
    }
}

/// How per-class metric membership functions are estimated from training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricMembership {
    /// One weighted Gaussian per class.
    Gaussian,
    /// Weighted Gaussian kernel density estimate.
    #[serde(alias = "kde")]
    NonParametric,
}

impl fmt::Display for MetricMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricMembership::Gaussian => write!(f, "gaussian"),
            MetricMembership::NonParametric => write!(f, "non-parametric"),
        }
    }
}

impl FromStr for MetricMembership {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gaussian" => Ok(MetricMembership::Gaussian),
            "non-parametric" | "nonparametric" | "kde" => Ok(MetricMembership::NonParametric),
            _ => Err(AssessmentError::unknown("metric membership", s)),
        }
    }
}

/// Options recognized by the fuzzy assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_defuzzifier")]
    pub defuzzifier: Defuzzifier,
    #[serde(default = "default_shrink")]
    pub shrink: Shrink,
    #[serde(default = "default_metric_membership")]
    pub metric_membership: MetricMembership,
    /// Number of triangular classes the skill axis is split into.
    #[serde(default = "default_skill_classes")]
    pub skill_classes: usize,
    #[serde(default)]
    pub min_skill: f64,
    #[serde(default = "default_max_skill")]
    pub max_skill: f64,
    /// Resolution of the defuzzification grid.
    #[serde(default = "default_number_of_steps")]
    pub number_of_steps: usize,
    /// Combinator for multiple antecedents of one rule.
    #[serde(default = "default_antecedent")]
    pub antecedent: Norm,
    /// How many rules the explanation lists.
    #[serde(default = "default_explanation_rules")]
    pub explanation_rules: usize,
}

fn default_defuzzifier() -> Defuzzifier {
    Defuzzifier::Com
}
fn default_shrink() -> Shrink {
    Shrink::Clip
}
fn default_metric_membership() -> MetricMembership {
    MetricMembership::Gaussian
}
fn default_skill_classes() -> usize {
    2
}
fn default_max_skill() -> f64 {
    1.0
}
fn default_number_of_steps() -> usize {
    DEFAULT_NUMBER_OF_STEPS
}
fn default_antecedent() -> Norm {
    Norm::GodelT
}
fn default_explanation_rules() -> usize {
    3
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            defuzzifier: default_defuzzifier(),
            shrink: default_shrink(),
            metric_membership: default_metric_membership(),
            skill_classes: default_skill_classes(),
            min_skill: 0.0,
            max_skill: default_max_skill(),
            number_of_steps: default_number_of_steps(),
            antecedent: default_antecedent(),
            explanation_rules: default_explanation_rules(),
        }
    }
}

impl AssessmentConfig {
    /// Check that the skill axis can be partitioned and integrated.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.skill_classes < 2 {
            return Err(AssessmentError::NotEnoughSkillClasses(self.skill_classes));
        }
        let finite = self.min_skill.is_finite() && self.max_skill.is_finite();
        if !finite || self.max_skill <= self.min_skill {
            return Err(AssessmentError::InvalidSkillRange {
                min: self.min_skill,
                max: self.max_skill,
            });
        }
        if self.number_of_steps == 0 {
            return Err(AssessmentError::InvalidResolution);
        }
        if !(self.antecedent.is_t_norm() || self.antecedent.is_s_norm()) {
            return Err(AssessmentError::InvalidAntecedent(self.antecedent));
        }
        Ok(())
    }

    /// Distance between adjacent skill-class peaks.
    pub fn triangle_width(&self) -> f64 {
        (self.max_skill - self.min_skill) / (self.skill_classes.max(2) - 1) as f64
    }

    /// Apply `FUZZYSKILL_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("FUZZYSKILL_DEFUZZIFIER") {
            self.defuzzifier = value.parse::<Defuzzifier>().context("FUZZYSKILL_DEFUZZIFIER")?;
        }
        if let Some(value) = lookup("FUZZYSKILL_SHRINK") {
            self.shrink = value.parse::<Shrink>().context("FUZZYSKILL_SHRINK")?;
        }
        if let Some(value) = lookup("FUZZYSKILL_STEPS") {
            self.number_of_steps = value
                .trim()
                .parse()
                .with_context(|| format!("FUZZYSKILL_STEPS is not a step count: {value}"))?;
        }
        Ok(())
    }
}

/// Load configuration from `path`, or search the well-known locations.
///
/// Search order without an explicit path:
/// 1. `fuzzyskill.toml` in the current directory
/// 2. `~/.config/fuzzyskill/config.toml`
///
/// Environment variable overrides: `FUZZYSKILL_DEFUZZIFIER`, `FUZZYSKILL_SHRINK`,
/// `FUZZYSKILL_STEPS`.
pub fn load_config_from(path: Option<&Path>) -> Result<AssessmentConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("fuzzyskill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => AssessmentConfig::default(),
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<AssessmentConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str::<AssessmentConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    tracing::debug!("loaded assessment config from {}", path.display());
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("fuzzyskill"))
}
