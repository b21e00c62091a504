mod config;
mod policy;
mod rules;

pub use config::EligibilityConfig;
pub use policy::{DenialReason, EligibilityDecision};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Certification, CertificationId, UnitId};
use super::statistics::UnitStats;
use policy::decide_outcome;

/// Stateless evaluator applying the certification thresholds to a unit.
pub struct EligibilityEngine {
    config: EligibilityConfig,
}

impl EligibilityEngine {
    pub fn new(config: EligibilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        unit: &UnitId,
        stats: UnitStats,
        certifications: &[Certification],
        now: DateTime<Utc>,
    ) -> EligibilityOutcome {
        let (checks, signals) = rules::check_unit(&stats, certifications, &self.config, now);
        let decision = decide_outcome(&self.config, &signals);

        EligibilityOutcome {
            unit: unit.clone(),
            decision,
            stats,
            checks,
            evaluated_at: now,
        }
    }
}

/// Rule evaluated during an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityRule {
    Participation,
    AverageScore,
    Cooldown,
}

/// Audit entry for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub rule: EligibilityRule,
    pub passed: bool,
    pub notes: String,
}

/// Decision plus the statistics and rule trail it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    pub unit: UnitId,
    pub decision: EligibilityDecision,
    pub stats: UnitStats,
    pub checks: Vec<RuleCheck>,
    pub evaluated_at: DateTime<Utc>,
}

impl EligibilityOutcome {
    pub fn eligible(&self) -> bool {
        matches!(self.decision, EligibilityDecision::Eligible)
    }

    pub fn reason(&self) -> Option<String> {
        match &self.decision {
            EligibilityDecision::Eligible => None,
            EligibilityDecision::Denied(reason) => Some(reason.summary()),
        }
    }

    pub fn existing_certificate_id(&self) -> Option<&CertificationId> {
        match &self.decision {
            EligibilityDecision::Eligible => None,
            EligibilityDecision::Denied(reason) => reason.existing_certificate_id(),
        }
    }

    pub fn view(&self) -> EligibilityView {
        EligibilityView {
            unit: self.unit.clone(),
            eligible: self.eligible(),
            reason: self.reason(),
            existing_certificate_id: self.existing_certificate_id().cloned(),
            participation_rate: self.stats.participation_rate,
            average_score: self.stats.average_score,
        }
    }
}

/// Caller-facing shape of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityView {
    pub unit: UnitId,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_certificate_id: Option<CertificationId>,
    pub participation_rate: u8,
    pub average_score: u8,
}
