use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::aggregation::{JitterSentiment, ResponseAggregator, SentimentProvider};
use super::domain::{
    Certification, CertificationId, IssuanceKey, RawResponse, ResponseId, ResponseRecord,
    ThemeScore, UnitId,
};
use super::eligibility::{DenialReason, EligibilityDecision, EligibilityEngine, EligibilityOutcome};
use super::insights::{generate_insights, CertificationInsights};
use super::repository::{
    CertificationNotice, CertificationView, NotificationError, NotificationSink, PulseRepository,
    RepositoryError,
};
use super::statistics::{compute_unit_stats, IndustryBenchmark, StatsQuery, UnitStats};
use crate::config::ScoringConfig;

/// Service composing the aggregator, statistics projection, eligibility
/// rules, storage, and notification hand-off.
pub struct PulseScoreService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    aggregator: Arc<ResponseAggregator>,
    engine: Arc<EligibilityEngine>,
    benchmark: IndustryBenchmark,
}

impl<R, N> PulseScoreService<R, N>
where
    R: PulseRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, config: ScoringConfig) -> Self {
        Self::with_sentiment(
            repository,
            notifications,
            config,
            Arc::new(JitterSentiment::default()),
        )
    }

    pub fn with_sentiment(
        repository: Arc<R>,
        notifications: Arc<N>,
        config: ScoringConfig,
        sentiment: Arc<dyn SentimentProvider>,
    ) -> Self {
        let ScoringConfig {
            aggregation,
            eligibility,
            benchmark,
        } = config;

        Self {
            repository,
            notifications,
            aggregator: Arc::new(ResponseAggregator::new(aggregation, sentiment)),
            engine: Arc::new(EligibilityEngine::new(eligibility)),
            benchmark,
        }
    }

    pub fn benchmark(&self) -> &IndustryBenchmark {
        &self.benchmark
    }

    /// Score a raw response, persist it, and mark the respondent completed.
    pub fn process_response(
        &self,
        response: RawResponse,
    ) -> Result<ResponseRecord, PulseServiceError> {
        self.process_response_at(response, Utc::now())
    }

    pub fn process_response_at(
        &self,
        response: RawResponse,
        now: DateTime<Utc>,
    ) -> Result<ResponseRecord, PulseServiceError> {
        let processed = self.aggregator.aggregate(&response);
        let record = ResponseRecord {
            id: ResponseId::generate(),
            survey_id: response.survey_id,
            unit: response.unit,
            respondent: response.respondent,
            submitted_at: now,
            processed,
        };

        let stored = self.repository.insert_response(record)?;

        match self
            .repository
            .mark_completed(&stored.unit, &stored.respondent)
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => warn!(
                unit = %stored.unit,
                respondent = %stored.respondent.0,
                "respondent missing from roster; completion not recorded"
            ),
            Err(err) => return Err(err.into()),
        }

        debug!(
            unit = %stored.unit,
            overall_score = stored.processed.overall_score,
            "response processed"
        );
        Ok(stored)
    }

    /// Fresh statistics projection for a unit.
    pub fn unit_stats(
        &self,
        unit: &UnitId,
        query: &StatsQuery,
    ) -> Result<UnitStats, PulseServiceError> {
        let roster = self.repository.roster(unit)?;
        let responses = self.repository.responses(unit, &query.range)?;
        Ok(compute_unit_stats(&roster, &responses, query))
    }

    pub fn evaluate_certification(
        &self,
        unit: &UnitId,
    ) -> Result<EligibilityOutcome, PulseServiceError> {
        self.evaluate_certification_at(unit, Utc::now())
    }

    pub fn evaluate_certification_at(
        &self,
        unit: &UnitId,
        now: DateTime<Utc>,
    ) -> Result<EligibilityOutcome, PulseServiceError> {
        let stats = self.unit_stats(unit, &StatsQuery::default())?;
        let certifications = self.repository.certifications(unit)?;
        Ok(self.engine.evaluate(unit, stats, &certifications, now))
    }

    pub fn issue_certification(
        &self,
        unit: &UnitId,
    ) -> Result<IssuanceOutcome, PulseServiceError> {
        self.issue_certification_at(unit, Utc::now())
    }

    /// Issue a certification when the unit is eligible.
    ///
    /// Denials, including a lost race at the storage guard, come back as
    /// [`IssuanceOutcome::Denied`]. Once the record is persisted the outcome
    /// is `Issued` whatever happens to the notification.
    pub fn issue_certification_at(
        &self,
        unit: &UnitId,
        now: DateTime<Utc>,
    ) -> Result<IssuanceOutcome, PulseServiceError> {
        let outcome = self.evaluate_certification_at(unit, now)?;
        if let EligibilityDecision::Denied(reason) = outcome.decision {
            info!(unit = %unit, reason = %reason.summary(), "certification denied");
            return Ok(IssuanceOutcome::Denied(reason));
        }

        let config = self.engine.config();
        let expires_at = now
            .checked_add_months(Months::new(config.validity_months))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let certification = Certification {
            id: CertificationId::generate(),
            unit: unit.clone(),
            average_score_at_issuance: outcome.stats.average_score,
            issued_at: now,
            expires_at,
            is_active: true,
        };
        let key = IssuanceKey::new(unit, now, config.cooldown_months);

        let certification =
            match self
                .repository
                .insert_certification(key, certification, config.cooldown_months)
            {
                Ok(stored) => stored,
                Err(RepositoryError::DuplicateCertification(existing_id)) => {
                    let existing = self
                        .repository
                        .certification(&existing_id)?
                        .ok_or(RepositoryError::NotFound)?;
                    info!(
                        unit = %unit,
                        certificate_id = %existing.id,
                        "certification already issued concurrently"
                    );
                    return Ok(IssuanceOutcome::Denied(DenialReason::RecentlyCertified {
                        certificate_id: existing.id,
                        issued_at: existing.issued_at,
                        expires_at: existing.expires_at,
                    }));
                }
                Err(err) => return Err(err.into()),
            };

        info!(
            unit = %unit,
            certificate_id = %certification.id,
            score = certification.average_score_at_issuance,
            "certification issued"
        );

        let insights = insights_or_default(&outcome.stats.theme_scores);
        let notification =
            match self.deliver(&certification, &outcome.stats.theme_scores, insights.clone()) {
                Ok(status) => status,
                Err(err) => {
                    warn!(
                        certificate_id = %certification.id,
                        error = %err,
                        "certification notice not delivered"
                    );
                    NotificationStatus::Failed {
                        error: err.to_string(),
                    }
                }
            };

        Ok(IssuanceOutcome::Issued(IssuedCertification {
            certification,
            insights,
            notification,
        }))
    }

    pub fn resend_notification(
        &self,
        certificate_id: &CertificationId,
    ) -> Result<NotificationStatus, PulseServiceError> {
        self.resend_notification_at(certificate_id, Utc::now())
    }

    /// Caller-driven retry of the notice for an existing certification.
    pub fn resend_notification_at(
        &self,
        certificate_id: &CertificationId,
        now: DateTime<Utc>,
    ) -> Result<NotificationStatus, PulseServiceError> {
        let certification = self
            .repository
            .certification(certificate_id)?
            .ok_or(RepositoryError::NotFound)?;

        if !certification.is_active_at(now) {
            return Ok(NotificationStatus::Skipped {
                reason: "certification has expired".to_string(),
            });
        }

        let stats = self.unit_stats(&certification.unit, &StatsQuery::default())?;
        let insights = insights_or_default(&stats.theme_scores);
        self.deliver(&certification, &stats.theme_scores, insights)
    }

    pub fn certification_history(
        &self,
        unit: &UnitId,
    ) -> Result<Vec<CertificationView>, PulseServiceError> {
        self.certification_history_at(unit, Utc::now())
    }

    /// All certifications for a unit, newest first.
    pub fn certification_history_at(
        &self,
        unit: &UnitId,
        now: DateTime<Utc>,
    ) -> Result<Vec<CertificationView>, PulseServiceError> {
        let mut certifications = self.repository.certifications(unit)?;
        certifications.sort_by(|left, right| right.issued_at.cmp(&left.issued_at));
        Ok(certifications
            .iter()
            .map(|certification| CertificationView::at(certification, now))
            .collect())
    }

    fn deliver(
        &self,
        certification: &Certification,
        theme_scores: &[ThemeScore],
        insights: CertificationInsights,
    ) -> Result<NotificationStatus, PulseServiceError> {
        let Some(recipient) = self.repository.unit_contact(&certification.unit)? else {
            debug!(unit = %certification.unit, "no contact on file; notice skipped");
            return Ok(NotificationStatus::Skipped {
                reason: "no contact on file for unit".to_string(),
            });
        };

        self.notifications.notify(CertificationNotice {
            recipient,
            unit: certification.unit.clone(),
            score: certification.average_score_at_issuance,
            theme_scores: theme_scores.to_vec(),
            insights,
            certificate_id: certification.id.clone(),
            expires_at: certification.expires_at,
        })?;

        Ok(NotificationStatus::Delivered)
    }
}

fn insights_or_default(theme_scores: &[ThemeScore]) -> CertificationInsights {
    generate_insights(theme_scores).unwrap_or_else(|err| {
        warn!(error = %err, "insight generation failed; sending empty insights");
        CertificationInsights::default()
    })
}

/// What happened to the certification notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum NotificationStatus {
    Delivered,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCertification {
    pub certification: Certification,
    pub insights: CertificationInsights,
    pub notification: NotificationStatus,
}

/// Result of an issuance attempt that reached a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum IssuanceOutcome {
    Issued(IssuedCertification),
    Denied(DenialReason),
}

impl IssuanceOutcome {
    pub fn view(&self) -> IssuanceView {
        match self {
            IssuanceOutcome::Issued(issued) => IssuanceView {
                success: true,
                certificate_id: Some(issued.certification.id.clone()),
                expires_at: Some(issued.certification.expires_at),
                error: None,
                existing_certificate_id: None,
                notification: Some(issued.notification.clone()),
            },
            IssuanceOutcome::Denied(reason) => IssuanceView {
                success: false,
                certificate_id: None,
                expires_at: None,
                error: Some(reason.summary()),
                existing_certificate_id: reason.existing_certificate_id().cloned(),
                notification: None,
            },
        }
    }
}

/// Caller-facing shape of an issuance attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuanceView {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<CertificationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_certificate_id: Option<CertificationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStatus>,
}

/// Error raised by the pulse service.
#[derive(Debug, thiserror::Error)]
pub enum PulseServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
