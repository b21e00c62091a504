//! End-to-end scenarios for scoring, statistics, and certification issuance,
//! driven through the public service facade and HTTP router.

mod common {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use pulse_score::config::ScoringConfig;
    use pulse_score::workflows::pulse::{
        AnswerValue, CertificationNotice, InMemoryPulseStore, NoSentiment, NotificationError,
        NotificationSink, PulseScoreService, RawResponse, RespondentId, SurveyId, UnitId,
    };

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn unit() -> UnitId {
        UnitId("platform-engineering".to_string())
    }

    pub(super) fn response(respondent: &str, answers: &[(&str, f64)]) -> RawResponse {
        RawResponse {
            survey_id: SurveyId("2025-q3-pulse".to_string()),
            unit: unit(),
            respondent: RespondentId(respondent.to_string()),
            answers: answers
                .iter()
                .map(|(question, value)| (question.to_string(), AnswerValue::Number(*value)))
                .collect::<BTreeMap<_, _>>(),
            sentiment: None,
        }
    }

    pub(super) fn full_response(respondent: &str, value: f64) -> RawResponse {
        response(
            respondent,
            &[
                ("psych_safety_1", value),
                ("motivation_2", value),
                ("values_3", value),
                ("career_4", value),
                ("balance_5", value),
            ],
        )
    }

    #[derive(Default)]
    pub(super) struct RecordingSink {
        notices: Mutex<Vec<CertificationNotice>>,
    }

    impl RecordingSink {
        pub(super) fn notices(&self) -> Vec<CertificationNotice> {
            self.notices.lock().expect("sink mutex poisoned").clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notice: CertificationNotice) -> Result<(), NotificationError> {
            self.notices
                .lock()
                .expect("sink mutex poisoned")
                .push(notice);
            Ok(())
        }
    }

    pub(super) fn service_with(
        config: ScoringConfig,
        roster_size: usize,
    ) -> (
        PulseScoreService<InMemoryPulseStore, RecordingSink>,
        InMemoryPulseStore,
        Arc<RecordingSink>,
    ) {
        let store = InMemoryPulseStore::default();
        store
            .enroll(&unit(), (1..=roster_size).map(|index| format!("eng-{index}")))
            .expect("roster seeded");
        store
            .set_contact(&unit(), "eng-leads@example.com")
            .expect("contact seeded");
        let sink = Arc::new(RecordingSink::default());
        let service = PulseScoreService::with_sentiment(
            Arc::new(store.clone()),
            sink.clone(),
            config,
            Arc::new(NoSentiment),
        );
        (service, store, sink)
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use pulse_score::config::ScoringConfig;
use pulse_score::workflows::pulse::{
    pulse_router, DenialReason, IssuanceOutcome, NotificationStatus, StatsQuery, Theme,
    ZeroThemePolicy,
};
use tower::ServiceExt;

#[test]
fn partial_answers_score_unanswered_themes_as_zero_by_default() {
    let (service, _, _) = service_with(ScoringConfig::default(), 4);

    let record = service
        .process_response_at(
            response("eng-1", &[("trust_1", 4.5), ("engage_1", 3.0)]),
            now(),
        )
        .expect("response processed");

    assert_eq!(record.processed.theme_score(Theme::TrustSafety), Some(90));
    assert_eq!(record.processed.theme_score(Theme::Engagement), Some(60));
    assert_eq!(record.processed.theme_score(Theme::Culture), Some(0));
    assert_eq!(record.processed.overall_score, 30);
    assert_eq!(record.processed.sentiment_score, None);
}

#[test]
fn exclude_empty_policy_averages_only_answered_themes() {
    let mut config = ScoringConfig::default();
    config.aggregation.zero_theme_policy = ZeroThemePolicy::ExcludeEmpty;
    let (service, _, _) = service_with(config, 4);

    let record = service
        .process_response_at(
            response("eng-1", &[("trust_1", 4.5), ("engage_1", 3.0)]),
            now(),
        )
        .expect("response processed");

    assert_eq!(record.processed.overall_score, 75);
}

#[test]
fn survey_cycle_ends_in_a_single_certification() {
    let (service, store, sink) = service_with(ScoringConfig::default(), 8);
    for index in 1..=3 {
        service
            .process_response_at(full_response(&format!("eng-{index}"), 4.5), now())
            .expect("response processed");
    }

    let early = service
        .issue_certification_at(&unit(), now())
        .expect("issuance attempt completes");
    assert!(matches!(
        early,
        IssuanceOutcome::Denied(DenialReason::InsufficientParticipation { actual: 38, .. })
    ));

    for index in 4..=5 {
        service
            .process_response_at(full_response(&format!("eng-{index}"), 4.0), now())
            .expect("response processed");
    }

    let stats = service
        .unit_stats(&unit(), &StatsQuery::default())
        .expect("stats computed");
    assert_eq!(stats.participation_rate, 63);
    assert_eq!(stats.average_score, 86);

    let issued = match service
        .issue_certification_at(&unit(), now())
        .expect("issuance completes")
    {
        IssuanceOutcome::Issued(issued) => issued,
        other => panic!("expected issuance, got {other:?}"),
    };
    assert_eq!(issued.certification.average_score_at_issuance, 86);
    assert_eq!(issued.notification, NotificationStatus::Delivered);

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].recipient, "eng-leads@example.com");
    assert_eq!(notices[0].insights.actions.len(), 3);
    assert_eq!(store.certification_count(), 1);
}

#[test]
fn parallel_issuance_requests_store_exactly_one_certification() {
    let (service, store, sink) = service_with(ScoringConfig::default(), 4);
    for index in 1..=4 {
        service
            .process_response_at(full_response(&format!("eng-{index}"), 5.0), now())
            .expect("response processed");
    }

    let outcomes: Vec<IssuanceOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| service.issue_certification_at(&unit(), now())))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .expect("issuer thread panicked")
                    .expect("issuance attempt completes")
            })
            .collect()
    });

    let issued: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            IssuanceOutcome::Issued(issued) => Some(issued.certification.id.clone()),
            IssuanceOutcome::Denied(_) => None,
        })
        .collect();
    assert_eq!(issued.len(), 1);
    for outcome in &outcomes {
        if let IssuanceOutcome::Denied(reason) = outcome {
            assert_eq!(reason.existing_certificate_id(), Some(&issued[0]));
        }
    }
    assert_eq!(store.certification_count(), 1);
    assert_eq!(sink.notices().len(), 1);
}

#[tokio::test]
async fn router_serves_the_full_certification_flow() {
    let (service, _, sink) = service_with(ScoringConfig::default(), 2);
    let router = pulse_router(Arc::new(service));

    for respondent in ["eng-1", "eng-2"] {
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/pulse/responses")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&full_response(respondent, 4.5))
                            .expect("serializable"),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let eligibility = router
        .clone()
        .oneshot(
            Request::get("/api/v1/pulse/units/platform-engineering/eligibility")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(eligibility.status(), StatusCode::OK);

    let issued = router
        .clone()
        .oneshot(
            Request::post("/api/v1/pulse/units/platform-engineering/certifications")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(issued.status(), StatusCode::CREATED);
    let body = axum::body::to_bytes(issued.into_body(), 16 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    let certificate_id = payload["certificate_id"]
        .as_str()
        .expect("certificate id")
        .to_string();

    let resend = router
        .oneshot(
            Request::post(format!(
                "/api/v1/pulse/certifications/{certificate_id}/notify"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(resend.status(), StatusCode::OK);
    assert_eq!(sink.notices().len(), 2);
}
