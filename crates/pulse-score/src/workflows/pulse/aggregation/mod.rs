mod config;
mod sentiment;

pub use config::{AggregationConfig, ZeroThemePolicy};
pub use sentiment::{JitterSentiment, NoSentiment, SentimentProvider};

use std::collections::BTreeMap;
use std::sync::Arc;

use super::classifier::classify_question;
use super::domain::{ProcessedResponse, RawResponse, Theme, ThemeScore};

/// Running sum of numeric answers for one theme.
#[derive(Debug, Default, Clone, Copy)]
struct ThemeTally {
    sum: f64,
    count: usize,
}

/// Turns one respondent's raw answers into theme scores, an overall score,
/// and a sentiment reading.
pub struct ResponseAggregator {
    config: AggregationConfig,
    sentiment: Arc<dyn SentimentProvider>,
}

impl ResponseAggregator {
    pub fn new(config: AggregationConfig, sentiment: Arc<dyn SentimentProvider>) -> Self {
        Self { config, sentiment }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Never fails: answers without a numeric reading are skipped and an
    /// empty answer set scores 0 across the board.
    pub fn aggregate(&self, response: &RawResponse) -> ProcessedResponse {
        let mut tallies: BTreeMap<Theme, ThemeTally> = BTreeMap::new();
        for (question_id, value) in &response.answers {
            let Some(numeric) = value.numeric() else {
                continue;
            };
            let tally = tallies.entry(classify_question(question_id)).or_default();
            tally.sum += numeric;
            tally.count += 1;
        }

        let multiplier = 100.0 / self.config.answer_scale_max;
        let theme_scores: Vec<ThemeScore> = Theme::ordered()
            .into_iter()
            .map(|theme| {
                let score = match tallies.get(&theme) {
                    Some(tally) if tally.count > 0 => {
                        let mean = tally.sum / tally.count as f64;
                        (mean * multiplier).round().clamp(0.0, 100.0) as u8
                    }
                    _ => 0,
                };
                ThemeScore { theme, score }
            })
            .collect();

        let counted: Vec<u8> = theme_scores
            .iter()
            .filter(|entry| match self.config.zero_theme_policy {
                ZeroThemePolicy::IncludeAsZero => true,
                ZeroThemePolicy::ExcludeEmpty => tallies
                    .get(&entry.theme)
                    .is_some_and(|tally| tally.count > 0),
            })
            .map(|entry| entry.score)
            .collect();
        let overall_score = rounded_mean(&counted);

        let sentiment_score = match response.sentiment {
            Some(supplied) => Some(supplied.min(100)),
            None => self.sentiment.sentiment(response, overall_score),
        };

        ProcessedResponse {
            overall_score,
            theme_scores,
            sentiment_score,
        }
    }
}

fn rounded_mean(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let total: u32 = scores.iter().map(|score| u32::from(*score)).sum();
    (f64::from(total) / scores.len() as f64).round() as u8
}
