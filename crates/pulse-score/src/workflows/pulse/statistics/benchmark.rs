use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::Theme;

/// Assumed population standard deviation of culture scores.
pub const ASSUMED_STD_DEV: f64 = 10.0;
/// Two-tailed critical value at ~95% confidence.
pub const SIGNIFICANCE_THRESHOLD: f64 = 1.96;

/// Industry reference values a unit is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryBenchmark {
    pub overall: f64,
    #[serde(default)]
    pub themes: BTreeMap<Theme, f64>,
}

impl IndustryBenchmark {
    pub fn overall(overall: f64) -> Self {
        Self {
            overall,
            themes: BTreeMap::new(),
        }
    }
}

/// Which figure a deviation was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "theme")]
pub enum BenchmarkMetric {
    Overall,
    Theme(Theme),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkDeviation {
    pub metric: BenchmarkMetric,
    pub value: f64,
    pub benchmark: f64,
    pub z_score: f64,
    pub significant: bool,
}

/// z = (value - benchmark) / 10, reported to two decimal places.
pub fn z_score(value: f64, benchmark: f64) -> f64 {
    let raw = (value - benchmark) / ASSUMED_STD_DEV;
    (raw * 100.0).round() / 100.0
}

pub fn benchmark_deviation(metric: BenchmarkMetric, value: f64, benchmark: f64) -> BenchmarkDeviation {
    let z_score = z_score(value, benchmark);
    BenchmarkDeviation {
        metric,
        value,
        benchmark,
        z_score,
        significant: z_score.abs() >= SIGNIFICANCE_THRESHOLD,
    }
}
