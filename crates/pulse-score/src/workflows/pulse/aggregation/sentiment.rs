use rand::Rng;

use super::super::domain::RawResponse;

/// Source of a per-response sentiment score on the 0-100 scale.
///
/// The aggregator only consults a provider when the response carries no
/// sentiment of its own.
pub trait SentimentProvider: Send + Sync {
    fn sentiment(&self, response: &RawResponse, overall_score: u8) -> Option<u8>;
}

/// Placeholder provider: the overall score shifted by a uniform jitter and
/// clamped to the score domain.
#[derive(Debug, Clone, Copy)]
pub struct JitterSentiment {
    max_jitter: u16,
}

impl JitterSentiment {
    pub const DEFAULT_JITTER: i16 = 10;

    /// The jitter window is symmetric, so only the magnitude of `max_jitter` is used.
    pub fn new(max_jitter: i16) -> Self {
        Self {
            max_jitter: max_jitter.unsigned_abs(),
        }
    }
}

impl Default for JitterSentiment {
    fn default() -> Self {
        Self::new(Self::DEFAULT_JITTER)
    }
}

impl SentimentProvider for JitterSentiment {
    fn sentiment(&self, _response: &RawResponse, overall_score: u8) -> Option<u8> {
        let bound = i32::from(self.max_jitter);
        let jitter = rand::rng().random_range(-bound..=bound);
        Some((i32::from(overall_score) + jitter).clamp(0, 100) as u8)
    }
}

/// Provider that never reports sentiment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSentiment;

impl SentimentProvider for NoSentiment {
    fn sentiment(&self, _response: &RawResponse, _overall_score: u8) -> Option<u8> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pulse::domain::{RespondentId, SurveyId, UnitId};
    use std::collections::BTreeMap;

    fn response() -> RawResponse {
        RawResponse {
            survey_id: SurveyId("q3-pulse".to_string()),
            unit: UnitId("engineering".to_string()),
            respondent: RespondentId("emp-1".to_string()),
            answers: BTreeMap::new(),
            sentiment: None,
        }
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let provider = JitterSentiment::default();
        for _ in 0..200 {
            let value = provider.sentiment(&response(), 50).expect("jitter always scores");
            assert!((40..=60).contains(&value), "{value} outside jitter window");
        }
    }

    #[test]
    fn jitter_clamps_at_score_edges() {
        let provider = JitterSentiment::default();
        for _ in 0..200 {
            let low = provider.sentiment(&response(), 2).expect("scored");
            let high = provider.sentiment(&response(), 98).expect("scored");
            assert!(low <= 12);
            assert!((88..=100).contains(&high));
        }
    }

    #[test]
    fn zero_jitter_echoes_overall_score() {
        let provider = JitterSentiment::new(0);
        assert_eq!(provider.sentiment(&response(), 73), Some(73));
        assert_eq!(NoSentiment.sentiment(&response(), 73), None);
    }

    #[test]
    fn extreme_jitter_is_accepted_and_clamped() {
        let provider = JitterSentiment::new(i16::MIN);
        assert_eq!(provider.max_jitter, 32_768);
        for _ in 0..200 {
            let value = provider.sentiment(&response(), 50).expect("scored");
            assert!(value <= 100);
        }
    }
}
