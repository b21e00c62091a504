use crate::infra::{seed_roster, LoggingNotificationSink};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use pulse_score::config::ScoringConfig;
use pulse_score::error::AppError;
use pulse_score::workflows::pulse::{
    AnswerValue, InMemoryPulseStore, IssuanceOutcome, NotificationStatus, PulseScoreService,
    RawResponse, RespondentId, StatsQuery, SurveyId, UnitId,
};
use std::collections::BTreeMap;
use std::sync::Arc;

const QUESTIONS: [&str; 10] = [
    "trust_1",
    "psych_safety_2",
    "engage_1",
    "recognition_2",
    "culture_1",
    "values_2",
    "growth_1",
    "career_2",
    "wellbeing_1",
    "balance_2",
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Unit the demo survey is run for
    #[arg(long, default_value = "customer-success")]
    pub(crate) unit: String,
    /// Number of respondents on the unit roster
    #[arg(long, default_value_t = 10)]
    pub(crate) roster_size: usize,
    /// Number of roster members who answer the survey
    #[arg(long, default_value_t = 7)]
    pub(crate) respondents: usize,
    /// Evaluation date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        unit,
        roster_size,
        respondents,
        as_of,
    } = args;
    if respondents > roster_size {
        return Err(AppError::Input(format!(
            "--respondents ({respondents}) cannot exceed --roster-size ({roster_size})"
        )));
    }

    let now = as_of
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .unwrap_or_else(Utc::now);
    let unit = UnitId(unit);

    let store = InMemoryPulseStore::default();
    let contact = format!("people-ops+{unit}@example.com");
    seed_roster(&store, &unit, roster_size, Some(contact.as_str()))?;
    let notifications = Arc::new(LoggingNotificationSink::default());
    let service = PulseScoreService::new(
        Arc::new(store),
        notifications.clone(),
        ScoringConfig::default(),
    );

    println!("PulseScore demo for unit '{unit}' ({roster_size} on roster)");
    for index in 1..=respondents {
        let response = demo_response(&unit, index);
        let submitted_at = now - Duration::hours(index as i64);
        let record = service.process_response_at(response, submitted_at)?;
        println!(
            "- {} scored {} (sentiment {})",
            record.respondent.0,
            record.processed.overall_score,
            record
                .processed
                .sentiment_score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    let stats = service.unit_stats(&unit, &StatsQuery::default())?;
    println!(
        "\nParticipation {}% ({} completed, {} pending) | average score {}",
        stats.participation_rate, stats.completed_count, stats.pending_count, stats.average_score
    );
    for entry in &stats.theme_scores {
        println!("  - {}: {}", entry.theme.label(), entry.score);
    }
    for deviation in stats.compare(service.benchmark()) {
        println!(
            "  Benchmark {:.0}: z = {:.2}{}",
            deviation.benchmark,
            deviation.z_score,
            if deviation.significant {
                " (significant)"
            } else {
                ""
            }
        );
    }

    let eligibility = service.evaluate_certification_at(&unit, now)?;
    println!("\nEligibility: {}", eligibility.decision.summary());
    for check in &eligibility.checks {
        let mark = if check.passed { "pass" } else { "fail" };
        println!("  [{mark}] {}", check.notes);
    }

    print_issuance(&service, &unit, now)?;
    println!("\nRepeat issuance attempt:");
    print_issuance(&service, &unit, now + Duration::minutes(5))?;

    let history = service.certification_history_at(&unit, now)?;
    match serde_json::to_string_pretty(&history) {
        Ok(json) => println!("\nCertification history:\n{json}"),
        Err(err) => println!("\nCertification history unavailable: {err}"),
    }
    println!("Notices dispatched: {}", notifications.notices().len());

    Ok(())
}

fn print_issuance(
    service: &PulseScoreService<InMemoryPulseStore, LoggingNotificationSink>,
    unit: &UnitId,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    match service.issue_certification_at(unit, now)? {
        IssuanceOutcome::Issued(issued) => {
            println!(
                "Certified: {} valid until {}",
                issued.certification.id,
                issued.certification.expires_at.format("%Y-%m-%d")
            );
            for strength in &issued.insights.strengths {
                println!("  strength: {} ({})", strength.theme.label(), strength.score);
            }
            for opportunity in &issued.insights.opportunities {
                println!(
                    "  opportunity: {} ({})",
                    opportunity.theme.label(),
                    opportunity.score
                );
            }
            for action in &issued.insights.actions {
                println!("  action: {action}");
            }
            match issued.notification {
                NotificationStatus::Delivered => println!("  notice delivered"),
                NotificationStatus::Skipped { reason } => println!("  notice skipped: {reason}"),
                NotificationStatus::Failed { error } => println!("  notice failed: {error}"),
            }
        }
        IssuanceOutcome::Denied(reason) => println!("Not certified: {}", reason.summary()),
    }
    Ok(())
}

/// Deterministic answers drifting between 3 and 5 so themes differ.
fn demo_response(unit: &UnitId, index: usize) -> RawResponse {
    let answers: BTreeMap<String, AnswerValue> = QUESTIONS
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let value = 3 + (index + position) % 3;
            (question.to_string(), AnswerValue::Number(value as f64))
        })
        .collect();

    RawResponse {
        survey_id: SurveyId("demo-pulse".to_string()),
        unit: unit.clone(),
        respondent: RespondentId(format!("emp-{index}")),
        answers,
        sentiment: None,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
