mod memory;

pub use memory::InMemoryPulseStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Certification, CertificationId, DateRange, IssuanceKey, RespondentId, ResponseRecord,
    RosterMember, ThemeScore, UnitId,
};
use super::insights::CertificationInsights;

/// Storage abstraction so the service can be exercised in isolation.
///
/// `insert_certification` is the uniqueness boundary for issuance: it must
/// check and write atomically, rejecting a second row for the same
/// [`IssuanceKey`] and any insert while the unit holds an unexpired
/// certification issued inside the cooldown window.
pub trait PulseRepository: Send + Sync {
    fn insert_response(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError>;
    fn mark_completed(&self, unit: &UnitId, respondent: &RespondentId)
        -> Result<(), RepositoryError>;
    fn roster(&self, unit: &UnitId) -> Result<Vec<RosterMember>, RepositoryError>;
    fn responses(
        &self,
        unit: &UnitId,
        range: &DateRange,
    ) -> Result<Vec<ResponseRecord>, RepositoryError>;
    fn unit_contact(&self, unit: &UnitId) -> Result<Option<String>, RepositoryError>;
    fn certifications(&self, unit: &UnitId) -> Result<Vec<Certification>, RepositoryError>;
    fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, RepositoryError>;
    fn insert_certification(
        &self,
        key: IssuanceKey,
        certification: Certification,
        cooldown_months: u32,
    ) -> Result<Certification, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("unit already holds recent certification {0}")]
    DuplicateCertification(CertificationId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook receiving issued certifications (e-mail, chat, HRIS).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: CertificationNotice) -> Result<(), NotificationError>;
}

/// Payload handed to the notification sink after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationNotice {
    pub recipient: String,
    pub unit: UnitId,
    pub score: u8,
    pub theme_scores: Vec<ThemeScore>,
    pub insights: CertificationInsights,
    pub certificate_id: CertificationId,
    pub expires_at: DateTime<Utc>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Certification as exposed to callers, with its status at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificationView {
    pub certificate_id: CertificationId,
    pub unit: UnitId,
    pub average_score_at_issuance: u8,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

impl CertificationView {
    pub fn at(certification: &Certification, now: DateTime<Utc>) -> Self {
        Self {
            certificate_id: certification.id.clone(),
            unit: certification.unit.clone(),
            average_score_at_issuance: certification.average_score_at_issuance,
            issued_at: certification.issued_at,
            expires_at: certification.expires_at,
            active: certification.is_active_at(now),
        }
    }
}
