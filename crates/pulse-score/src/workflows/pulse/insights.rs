use serde::{Deserialize, Serialize};

use super::domain::ThemeScore;

/// Opportunities scoring below this get a dedicated workshop action.
pub const WORKSHOP_THRESHOLD: u8 = 60;

const SHARE_RESULTS: &str = "Share results with the team";
const DISPLAY_BADGE: &str = "Display the certification badge";
const PLAN_REVIEW: &str = "Plan a follow-up review";

/// Structured summary attached to a certification notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationInsights {
    pub strengths: Vec<ThemeScore>,
    pub opportunities: Vec<ThemeScore>,
    pub actions: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InsightError {
    #[error("no theme scores available to summarise")]
    NoThemeScores,
}

/// Top two themes are strengths, bottom two (lowest first) are
/// opportunities. Ties keep canonical theme order, so identical input always
/// yields identical output.
pub fn generate_insights(theme_scores: &[ThemeScore]) -> Result<CertificationInsights, InsightError> {
    if theme_scores.is_empty() {
        return Err(InsightError::NoThemeScores);
    }

    let mut ranked = theme_scores.to_vec();
    ranked.sort_by(|left, right| {
        right
            .score
            .cmp(&left.score)
            .then_with(|| left.theme.cmp(&right.theme))
    });

    let strengths: Vec<ThemeScore> = ranked.iter().take(2).copied().collect();
    let opportunities: Vec<ThemeScore> = ranked.iter().rev().take(2).copied().collect();

    let mut actions = vec![
        SHARE_RESULTS.to_string(),
        DISPLAY_BADGE.to_string(),
        PLAN_REVIEW.to_string(),
    ];
    if let Some(weakest) = opportunities
        .first()
        .filter(|entry| entry.score < WORKSHOP_THRESHOLD)
    {
        actions.push(format!("Run a focused workshop on {}", weakest.theme.label()));
    }

    Ok(CertificationInsights {
        strengths,
        opportunities,
        actions,
    })
}
