use chrono::{DateTime, Utc};

use super::super::domain::Certification;
use super::super::statistics::UnitStats;
use super::config::EligibilityConfig;
use super::{EligibilityRule, RuleCheck};

pub(crate) struct EligibilitySignals<'a> {
    pub participation_rate: u8,
    pub average_score: u8,
    pub blocking_certification: Option<&'a Certification>,
}

pub(crate) fn check_unit<'a>(
    stats: &UnitStats,
    certifications: &'a [Certification],
    config: &EligibilityConfig,
    now: DateTime<Utc>,
) -> (Vec<RuleCheck>, EligibilitySignals<'a>) {
    let mut checks = Vec::new();

    let participation_ok = stats.participation_rate >= config.min_participation_rate;
    checks.push(RuleCheck {
        rule: EligibilityRule::Participation,
        passed: participation_ok,
        notes: format!(
            "participation {}% against minimum {}% ({} of {} completed)",
            stats.participation_rate,
            config.min_participation_rate,
            stats.completed_count,
            stats.completed_count + stats.pending_count
        ),
    });

    let score_ok = stats.average_score >= config.min_average_score;
    checks.push(RuleCheck {
        rule: EligibilityRule::AverageScore,
        passed: score_ok,
        notes: format!(
            "average score {} against minimum {}",
            stats.average_score, config.min_average_score
        ),
    });

    // Newest blocking record wins.
    let blocking_certification = certifications
        .iter()
        .filter(|certification| certification.blocks_reissue(now, config.cooldown_months))
        .max_by_key(|certification| certification.issued_at);

    checks.push(RuleCheck {
        rule: EligibilityRule::Cooldown,
        passed: blocking_certification.is_none(),
        notes: match blocking_certification {
            Some(existing) => format!(
                "certification {} issued {} is inside the {}-month cooldown",
                existing.id.0,
                existing.issued_at.format("%Y-%m-%d"),
                config.cooldown_months
            ),
            None => format!(
                "no unexpired certification issued within {} months",
                config.cooldown_months
            ),
        },
    });

    let signals = EligibilitySignals {
        participation_rate: stats.participation_rate,
        average_score: stats.average_score,
        blocking_certification,
    };

    (checks, signals)
}
