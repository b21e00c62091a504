use serde::{Deserialize, Serialize};

/// How themes without any numeric answer take part in a response's overall score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroThemePolicy {
    /// Unanswered themes count as 0 in the overall mean. Partially answered
    /// surveys are diluted accordingly.
    #[default]
    IncludeAsZero,
    /// Only themes with at least one numeric answer enter the overall mean.
    ExcludeEmpty,
}

impl ZeroThemePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "include_as_zero" | "include" => Some(Self::IncludeAsZero),
            "exclude_empty" | "exclude" => Some(Self::ExcludeEmpty),
            _ => None,
        }
    }
}

/// Tunables for turning raw answers into scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub zero_theme_policy: ZeroThemePolicy,
    /// Upper bound of the native answer scale; answers are rescaled so that
    /// this value maps to 100.
    pub answer_scale_max: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            zero_theme_policy: ZeroThemePolicy::IncludeAsZero,
            answer_scale_max: 5.0,
        }
    }
}
