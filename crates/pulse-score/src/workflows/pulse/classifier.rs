use super::domain::Theme;

const TRUST_SAFETY_STEMS: &[&str] = &["trust", "safety", "psych"];
const ENGAGEMENT_STEMS: &[&str] = &["engage", "motivation", "recognition"];
const GROWTH_STEMS: &[&str] = &["growth", "develop", "career", "learning"];
const WELLBEING_STEMS: &[&str] = &["wellbeing", "wellness", "balance", "stress"];

/// Maps a question identifier (`trust1`, `engage_03`, `Growth-2`) to its theme.
///
/// Classification looks at the leading alphabetic stem, case-insensitively.
/// Identifiers without a recognised stem fall into [`Theme::Culture`] so every
/// answer still contributes to a score.
pub fn classify_question(question_id: &str) -> Theme {
    let stem: String = question_id
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .map(|ch| ch.to_ascii_lowercase())
        .collect();

    let matches = |stems: &[&str]| stems.iter().any(|prefix| stem.starts_with(prefix));

    if matches(TRUST_SAFETY_STEMS) {
        Theme::TrustSafety
    } else if matches(ENGAGEMENT_STEMS) {
        Theme::Engagement
    } else if matches(GROWTH_STEMS) {
        Theme::GrowthDevelopment
    } else if matches(WELLBEING_STEMS) {
        Theme::Wellbeing
    } else {
        // Culture stems (`culture`, `values`, `inclusion`) share the default bucket.
        Theme::Culture
    }
}
