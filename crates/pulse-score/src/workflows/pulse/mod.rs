//! Culture pulse scoring and certification.
//!
//! Raw survey answers flow through the [`aggregation`] stage into stored
//! responses, are projected per unit by [`statistics`], and feed the
//! [`eligibility`] rules that gate certification issuance in the
//! [`service`].

pub mod aggregation;
pub mod classifier;
pub mod domain;
pub mod eligibility;
pub mod insights;
pub mod repository;
pub mod router;
pub mod service;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use aggregation::{
    AggregationConfig, JitterSentiment, NoSentiment, ResponseAggregator, SentimentProvider,
    ZeroThemePolicy,
};
pub use classifier::classify_question;
pub use domain::{
    AnswerValue, Certification, CertificationId, CompletionStatus, DateRange, IssuanceKey,
    ProcessedResponse, RawResponse, RespondentId, ResponseId, ResponseRecord, RosterMember,
    SurveyId, Theme, ThemeScore, UnitId,
};
pub use eligibility::{
    DenialReason, EligibilityConfig, EligibilityDecision, EligibilityEngine, EligibilityOutcome,
    EligibilityView,
};
pub use insights::{generate_insights, CertificationInsights, InsightError};
pub use repository::{
    CertificationNotice, CertificationView, InMemoryPulseStore, NotificationError,
    NotificationSink, PulseRepository, RepositoryError,
};
pub use router::pulse_router;
pub use service::{
    IssuanceOutcome, IssuanceView, IssuedCertification, NotificationStatus, PulseScoreService,
    PulseServiceError,
};
pub use statistics::{
    compute_unit_stats, BenchmarkDeviation, BenchmarkMetric, IndustryBenchmark, StatsQuery,
    UnitStats,
};
