mod benchmark;

pub use benchmark::{
    benchmark_deviation, z_score, BenchmarkDeviation, BenchmarkMetric, IndustryBenchmark,
    ASSUMED_STD_DEV, SIGNIFICANCE_THRESHOLD,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CompletionStatus, DateRange, ResponseRecord, RosterMember, Theme, ThemeScore};

/// Filters applied when projecting a unit's statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub range: DateRange,
}

/// Fresh projection of a unit's participation and scores.
///
/// `average_score` is relative to the query: with a theme filter it carries
/// that theme's average rather than the overall score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub participation_rate: u8,
    pub average_score: u8,
    pub completed_count: usize,
    pub pending_count: usize,
    pub response_count: usize,
    pub theme_scores: Vec<ThemeScore>,
}

impl UnitStats {
    pub fn theme_score(&self, theme: Theme) -> Option<u8> {
        self.theme_scores
            .iter()
            .find(|entry| entry.theme == theme)
            .map(|entry| entry.score)
    }

    /// Deviations of the average score and every benchmarked theme.
    pub fn compare(&self, benchmark: &IndustryBenchmark) -> Vec<BenchmarkDeviation> {
        let mut deviations = vec![benchmark_deviation(
            BenchmarkMetric::Overall,
            f64::from(self.average_score),
            benchmark.overall,
        )];

        for entry in &self.theme_scores {
            if let Some(reference) = benchmark.themes.get(&entry.theme) {
                deviations.push(benchmark_deviation(
                    BenchmarkMetric::Theme(entry.theme),
                    f64::from(entry.score),
                    *reference,
                ));
            }
        }

        deviations
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ScoreTally {
    sum: u64,
    count: u64,
}

impl ScoreTally {
    fn add(&mut self, score: u8) {
        self.sum += u64::from(score);
        self.count += 1;
    }

    fn average(&self) -> u8 {
        if self.count == 0 {
            0
        } else {
            (self.sum as f64 / self.count as f64).round() as u8
        }
    }
}

/// Projects roster membership and stored responses into [`UnitStats`].
///
/// Responses outside `query.range` are skipped here as well, so callers may
/// pass an unfiltered set. The projection is pure: identical inputs always
/// produce identical output.
pub fn compute_unit_stats(
    roster: &[RosterMember],
    responses: &[ResponseRecord],
    query: &StatsQuery,
) -> UnitStats {
    let total = roster.len();
    let completed_count = roster
        .iter()
        .filter(|member| member.status == CompletionStatus::Completed)
        .count();
    let pending_count = total - completed_count;
    let participation_rate = if total == 0 {
        0
    } else {
        (100.0 * completed_count as f64 / total as f64).round() as u8
    };

    let in_range: Vec<&ResponseRecord> = responses
        .iter()
        .filter(|record| query.range.contains(record.submitted_at))
        .collect();

    let mut themes: BTreeMap<Theme, ScoreTally> = BTreeMap::new();
    let mut overall = ScoreTally::default();
    for record in &in_range {
        overall.add(record.processed.overall_score);
        for entry in &record.processed.theme_scores {
            themes.entry(entry.theme).or_default().add(entry.score);
        }
    }

    let theme_scores: Vec<ThemeScore> = Theme::ordered()
        .into_iter()
        .map(|theme| ThemeScore {
            theme,
            score: themes.get(&theme).map(ScoreTally::average).unwrap_or(0),
        })
        .collect();

    let average_score = match query.theme {
        Some(theme) => themes.get(&theme).map(ScoreTally::average).unwrap_or(0),
        None => overall.average(),
    };

    UnitStats {
        participation_rate,
        average_score,
        completed_count,
        pending_count,
        response_count: in_range.len(),
        theme_scores,
    }
}
