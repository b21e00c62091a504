use serde::{Deserialize, Serialize};

/// Thresholds and time windows governing certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityConfig {
    pub min_participation_rate: u8,
    pub min_average_score: u8,
    /// Months after issuance during which an unexpired certification blocks a new one.
    pub cooldown_months: u32,
    /// Lifetime of an issued certification.
    pub validity_months: u32,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_participation_rate: 50,
            min_average_score: 80,
            cooldown_months: 3,
            validity_months: 12,
        }
    }
}
