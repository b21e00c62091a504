use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::CertificationId;
use super::config::EligibilityConfig;
use super::rules::EligibilitySignals;

/// Certification decision for a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EligibilityDecision {
    Eligible,
    Denied(DenialReason),
}

impl EligibilityDecision {
    pub fn summary(&self) -> String {
        match self {
            EligibilityDecision::Eligible => "eligible for certification".to_string(),
            EligibilityDecision::Denied(reason) => reason.summary(),
        }
    }
}

/// Business reasons a unit is not certified. These are results, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DenialReason {
    InsufficientParticipation {
        required: u8,
        actual: u8,
    },
    ScoreBelowThreshold {
        required: u8,
        actual: u8,
    },
    RecentlyCertified {
        certificate_id: CertificationId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl DenialReason {
    pub fn summary(&self) -> String {
        match self {
            DenialReason::InsufficientParticipation { required, actual } => format!(
                "insufficient participation: {actual}% responded, {required}% required; more responses needed"
            ),
            DenialReason::ScoreBelowThreshold { required, actual } => {
                format!("score below threshold: average {actual}, minimum {required}")
            }
            DenialReason::RecentlyCertified {
                certificate_id,
                issued_at,
                ..
            } => format!(
                "already certified recently: {} issued {}",
                certificate_id.0,
                issued_at.format("%Y-%m-%d")
            ),
        }
    }

    pub fn existing_certificate_id(&self) -> Option<&CertificationId> {
        match self {
            DenialReason::RecentlyCertified { certificate_id, .. } => Some(certificate_id),
            _ => None,
        }
    }
}

/// Applies participation, score, then cooldown; the first failing rule is the denial.
pub(crate) fn decide_outcome(
    config: &EligibilityConfig,
    signals: &EligibilitySignals<'_>,
) -> EligibilityDecision {
    if signals.participation_rate < config.min_participation_rate {
        return EligibilityDecision::Denied(DenialReason::InsufficientParticipation {
            required: config.min_participation_rate,
            actual: signals.participation_rate,
        });
    }

    if signals.average_score < config.min_average_score {
        return EligibilityDecision::Denied(DenialReason::ScoreBelowThreshold {
            required: config.min_average_score,
            actual: signals.average_score,
        });
    }

    if let Some(existing) = signals.blocking_certification {
        return EligibilityDecision::Denied(DenialReason::RecentlyCertified {
            certificate_id: existing.id.clone(),
            issued_at: existing.issued_at,
            expires_at: existing.expires_at,
        });
    }

    EligibilityDecision::Eligible
}
