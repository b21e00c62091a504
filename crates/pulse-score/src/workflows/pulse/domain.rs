use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for an organizational unit (department, team, or company).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

/// Identifier wrapper for a survey campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyId(pub String);

/// Identifier wrapper for a roster member answering the survey.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RespondentId(pub String);

/// Identifier wrapper for a stored, processed response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseId(pub String);

/// Identifier wrapper for an issued certification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificationId(pub String);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CertificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ResponseId {
    pub fn generate() -> Self {
        Self(format!("resp-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl CertificationId {
    pub fn generate() -> Self {
        Self(format!("cert-{}", uuid::Uuid::new_v4().simple()))
    }
}

/// Fixed culture dimensions every survey question is bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    TrustSafety,
    Engagement,
    Culture,
    GrowthDevelopment,
    Wellbeing,
}

impl Theme {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::TrustSafety,
            Self::Engagement,
            Self::Culture,
            Self::GrowthDevelopment,
            Self::Wellbeing,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TrustSafety => "Trust & Safety",
            Self::Engagement => "Engagement",
            Self::Culture => "Culture",
            Self::GrowthDevelopment => "Growth & Development",
            Self::Wellbeing => "Wellbeing",
        }
    }

    /// Parses a theme filter as supplied by callers. Accepts snake case keys,
    /// display labels, and the short stems used in question identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "trustsafety" | "trust" | "safety" => Some(Self::TrustSafety),
            "engagement" | "engage" => Some(Self::Engagement),
            "culture" => Some(Self::Culture),
            "growthdevelopment" | "growth" | "development" => Some(Self::GrowthDevelopment),
            "wellbeing" | "wellness" => Some(Self::Wellbeing),
            _ => None,
        }
    }
}

/// Score for a single theme on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeScore {
    pub theme: Theme,
    pub score: u8,
}

/// A single answer value as captured by the survey form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    /// Skipped questions (`null`), checkboxes, and any other JSON shape.
    Other(serde_json::Value),
}

impl AnswerValue {
    /// Numeric reading of the answer. Free text that does not parse,
    /// non-finite numbers, and non-scalar JSON have no numeric value.
    pub fn numeric(&self) -> Option<f64> {
        let value = match self {
            AnswerValue::Number(value) => *value,
            AnswerValue::Text(text) => text.trim().parse::<f64>().ok()?,
            AnswerValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

/// One respondent's raw answers, consumed once by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub survey_id: SurveyId,
    pub unit: UnitId,
    pub respondent: RespondentId,
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerValue>,
    /// Independently measured sentiment, when the survey tooling supplies one.
    #[serde(default)]
    pub sentiment: Option<u8>,
}

/// Scores derived from one raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedResponse {
    pub overall_score: u8,
    pub theme_scores: Vec<ThemeScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<u8>,
}

impl ProcessedResponse {
    pub fn theme_score(&self, theme: Theme) -> Option<u8> {
        self.theme_scores
            .iter()
            .find(|entry| entry.theme == theme)
            .map(|entry| entry.score)
    }
}

/// Stored form of a processed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: ResponseId,
    pub survey_id: SurveyId,
    pub unit: UnitId,
    pub respondent: RespondentId,
    pub submitted_at: DateTime<Utc>,
    pub processed: ProcessedResponse,
}

/// Survey completion state of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub respondent: RespondentId,
    pub unit: UnitId,
    pub status: CompletionStatus,
}

/// Inclusive bounds on `submitted_at`; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| instant >= from) && self.to.map_or(true, |to| instant <= to)
    }
}

/// Certification record. Never mutated after creation; a re-certification
/// is a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub id: CertificationId,
    pub unit: UnitId,
    pub average_score_at_issuance: u8,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Certification {
    /// Active certifications lapse naturally at `expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// True when the record is unexpired and was issued inside the cooldown
    /// window ending at `now`.
    pub fn blocks_reissue(&self, now: DateTime<Utc>, cooldown_months: u32) -> bool {
        let window_start = now
            .checked_sub_months(Months::new(cooldown_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.expires_at > now && self.issued_at > window_start
    }
}

/// Storage idempotency key for certification issuance: one row per unit per
/// cooldown bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuanceKey {
    pub unit: UnitId,
    pub bucket: i64,
}

impl IssuanceKey {
    pub fn new(unit: &UnitId, issued_at: DateTime<Utc>, cooldown_months: u32) -> Self {
        let months_since_epoch = i64::from(issued_at.year()) * 12 + i64::from(issued_at.month0());
        let bucket = months_since_epoch.div_euclid(i64::from(cooldown_months.max(1)));
        Self {
            unit: unit.clone(),
            bucket,
        }
    }
}
