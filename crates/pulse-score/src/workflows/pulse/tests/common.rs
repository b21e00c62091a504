use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use serde_json::Value;

use crate::config::ScoringConfig;
use crate::workflows::pulse::aggregation::SentimentProvider;
use crate::workflows::pulse::domain::{
    AnswerValue, Certification, CertificationId, DateRange, IssuanceKey, RawResponse,
    RespondentId, ResponseRecord, RosterMember, SurveyId, Theme, ThemeScore, UnitId,
};
use crate::workflows::pulse::repository::{
    CertificationNotice, InMemoryPulseStore, NotificationError, NotificationSink,
    PulseRepository, RepositoryError,
};
use crate::workflows::pulse::statistics::UnitStats;
use crate::workflows::pulse::{pulse_router, PulseScoreService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn unit() -> UnitId {
    UnitId("customer-success".to_string())
}

/// Answers every theme with the same Likert value.
pub(super) fn uniform_response(respondent: &str, answer: f64) -> RawResponse {
    let mut answers = BTreeMap::new();
    for question in ["trust_1", "engage_1", "culture_1", "growth_1", "wellbeing_1"] {
        answers.insert(question.to_string(), AnswerValue::Number(answer));
    }
    RawResponse {
        survey_id: SurveyId("2025-q2-pulse".to_string()),
        unit: unit(),
        respondent: RespondentId(respondent.to_string()),
        answers,
        sentiment: None,
    }
}

pub(super) fn stats(participation_rate: u8, average_score: u8) -> UnitStats {
    UnitStats {
        participation_rate,
        average_score,
        completed_count: usize::from(participation_rate / 10),
        pending_count: usize::from(10 - participation_rate / 10),
        response_count: usize::from(participation_rate / 10),
        theme_scores: Theme::ordered()
            .into_iter()
            .map(|theme| ThemeScore {
                theme,
                score: average_score,
            })
            .collect(),
    }
}

pub(super) fn certification(id: &str, issued_at: DateTime<Utc>) -> Certification {
    Certification {
        id: CertificationId(id.to_string()),
        unit: unit(),
        average_score_at_issuance: 86,
        issued_at,
        expires_at: issued_at + Months::new(12),
        is_active: true,
    }
}

pub(super) fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig::default()
}

/// Store with ten roster members and a unit contact on file.
pub(super) fn seeded_store() -> InMemoryPulseStore {
    let store = InMemoryPulseStore::default();
    store
        .enroll(&unit(), (1..=10).map(|index| format!("emp-{index}")))
        .expect("roster seeded");
    store
        .set_contact(&unit(), "people-ops@example.com")
        .expect("contact seeded");
    store
}

pub(super) type TestService = PulseScoreService<InMemoryPulseStore, MemoryNotifications>;

pub(super) fn build_service() -> (TestService, InMemoryPulseStore, Arc<MemoryNotifications>) {
    let store = seeded_store();
    let notifications = Arc::new(MemoryNotifications::default());
    let service = PulseScoreService::with_sentiment(
        Arc::new(store.clone()),
        notifications.clone(),
        scoring_config(),
        Arc::new(FixedSentiment(70)),
    );
    (service, store, notifications)
}

/// Submits `count` responses from the seeded roster, all at `answer`.
pub(super) fn submit_responses<N>(
    service: &PulseScoreService<InMemoryPulseStore, N>,
    count: usize,
    answer: f64,
) where
    N: NotificationSink + 'static,
{
    for index in 1..=count {
        service
            .process_response_at(uniform_response(&format!("emp-{index}"), answer), days_ago(1))
            .expect("response processed");
    }
}

pub(super) struct FixedSentiment(pub(super) u8);

impl SentimentProvider for FixedSentiment {
    fn sentiment(&self, _response: &RawResponse, _overall_score: u8) -> Option<u8> {
        Some(self.0)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    notices: Mutex<Vec<CertificationNotice>>,
}

impl MemoryNotifications {
    pub(super) fn notices(&self) -> Vec<CertificationNotice> {
        self.notices
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn notify(&self, notice: CertificationNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notification mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationSink for FailingNotifications {
    fn notify(&self, _notice: CertificationNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay refused".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl PulseRepository for UnavailableRepository {
    fn insert_response(&self, _record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_completed(
        &self,
        _unit: &UnitId,
        _respondent: &RespondentId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn roster(&self, _unit: &UnitId) -> Result<Vec<RosterMember>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn responses(
        &self,
        _unit: &UnitId,
        _range: &DateRange,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn unit_contact(&self, _unit: &UnitId) -> Result<Option<String>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn certifications(&self, _unit: &UnitId) -> Result<Vec<Certification>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn certification(
        &self,
        _id: &CertificationId,
    ) -> Result<Option<Certification>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_certification(
        &self,
        _key: IssuanceKey,
        _certification: Certification,
        _cooldown_months: u32,
    ) -> Result<Certification, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Eligible store whose guard always reports a concurrent winner, as if a
/// parallel request committed between the eligibility read and the insert.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryPulseStore,
    pub(super) winner: Certification,
}

impl PulseRepository for RacingRepository {
    fn insert_response(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
        self.inner.insert_response(record)
    }

    fn mark_completed(
        &self,
        unit: &UnitId,
        respondent: &RespondentId,
    ) -> Result<(), RepositoryError> {
        self.inner.mark_completed(unit, respondent)
    }

    fn roster(&self, unit: &UnitId) -> Result<Vec<RosterMember>, RepositoryError> {
        self.inner.roster(unit)
    }

    fn responses(
        &self,
        unit: &UnitId,
        range: &DateRange,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        self.inner.responses(unit, range)
    }

    fn unit_contact(&self, unit: &UnitId) -> Result<Option<String>, RepositoryError> {
        self.inner.unit_contact(unit)
    }

    fn certifications(&self, unit: &UnitId) -> Result<Vec<Certification>, RepositoryError> {
        self.inner.certifications(unit)
    }

    fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, RepositoryError> {
        if id == &self.winner.id {
            return Ok(Some(self.winner.clone()));
        }
        self.inner.certification(id)
    }

    fn insert_certification(
        &self,
        _key: IssuanceKey,
        _certification: Certification,
        _cooldown_months: u32,
    ) -> Result<Certification, RepositoryError> {
        Err(RepositoryError::DuplicateCertification(
            self.winner.id.clone(),
        ))
    }
}

pub(super) fn pulse_router_with_service(service: TestService) -> axum::Router {
    pulse_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
