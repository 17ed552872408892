//! fuzzyskill-core: fuzzy rule-based skill assessment.
//!
//! Learns per-class membership functions for each performance metric from
//! labelled training records, fires one rule per (metric, skill class) on a
//! test record and defuzzifies the combined consequence into a crisp skill
//! score with a ranked explanation.

pub mod assessment;
pub mod config;
pub mod defuzzify;
pub mod engine;
pub mod error;
pub mod membership;
pub mod model;
pub mod norm;
pub mod parser;
pub mod report;
pub mod rule;
pub mod statistics;
pub mod traits;
