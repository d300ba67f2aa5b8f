// Rule-based categorization and threat-level resolution.
//
// Independent of the ML ensemble: the categorizer works from keyword sets
// alone, and the resolver merges the ensemble's confidence with the
// rule-based severity. Categories are matched in declared order — the
// first category with any keyword hit wins, so the order below is part
// of the observable behavior.

use serde::{Deserialize, Serialize};

use crate::ensemble::ThreatAssessment;
use crate::text::contains_any;

/// Coarse threat level. Ordering is Low < Medium < High so records can be
/// sorted by level directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category keyword sets, in match priority order. First hit wins.
pub const CATEGORY_KEYWORDS: [(&str, &[&str]); 7] = [
    ("crime", &["theft", "robbery", "murder", "assault", "kidnap", "crime", "police", "arrest"]),
    ("natural", &["flood", "earthquake", "cyclone", "storm", "landslide", "drought", "tsunami"]),
    ("traffic", &["accident", "traffic", "collision", "road", "highway", "vehicle", "crash"]),
    ("violence", &["riot", "protest", "violence", "clash", "unrest", "fight"]),
    ("fire", &["fire", "explosion", "blast", "burn", "smoke"]),
    ("medical", &["disease", "outbreak", "virus", "pandemic", "health", "hospital"]),
    ("aviation", &["flight", "aircraft", "aviation", "airline", "pilot", "airport"]),
];

const HIGH_SEVERITY: &[&str] = &["death", "killed", "fatal", "emergency", "critical", "severe", "major"];
const MEDIUM_SEVERITY: &[&str] = &["injured", "damage", "warning", "alert", "concern"];

/// Assign a topic category and rule-based severity from title + description.
/// No keyword hit at all resolves to ("other", Low).
pub fn categorize(title: &str, description: &str) -> (&'static str, ThreatLevel) {
    let text = format!("{} {}", title, description).to_lowercase();

    for (category, keywords) in CATEGORY_KEYWORDS {
        if contains_any(&text, keywords) {
            return (category, severity(&text));
        }
    }

    ("other", ThreatLevel::Low)
}

/// Rule-based severity from high/medium keyword presence.
pub fn severity(text: &str) -> ThreatLevel {
    let lower = text.to_lowercase();
    if contains_any(&lower, HIGH_SEVERITY) {
        ThreatLevel::High
    } else if contains_any(&lower, MEDIUM_SEVERITY) {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Merge the ensemble's verdict with the rule-based severity.
///
/// Thresholds are fixed constants, not configurable per call. Confidence
/// below 0.3 means the ensemble had nothing to say, so the keyword
/// severity stands.
pub fn resolve_level(assessment: &ThreatAssessment, rule_level: ThreatLevel) -> ThreatLevel {
    if assessment.is_threat && assessment.final_confidence >= 0.8 {
        ThreatLevel::High
    } else if assessment.is_threat && assessment.final_confidence >= 0.6 {
        ThreatLevel::Medium
    } else if assessment.final_confidence >= 0.3 {
        ThreatLevel::Low
    } else {
        rule_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(is_threat: bool, confidence: f64) -> ThreatAssessment {
        ThreatAssessment {
            is_threat,
            final_confidence: confidence,
            ..ThreatAssessment::empty()
        }
    }

    #[test]
    fn categorize_first_match_wins() {
        // "theft" (crime) and "fire" both present — crime is declared first.
        let (category, _) = categorize("Theft suspects flee after market fire", "");
        assert_eq!(category, "crime");
    }

    #[test]
    fn categorize_explosion_is_fire_not_crime() {
        let (category, _) = categorize("Breaking: Major explosion reported downtown", "");
        assert_eq!(category, "fire");
    }

    #[test]
    fn categorize_no_match_is_other_low() {
        let (category, level) = categorize("Sunny skies expected all week", "");
        assert_eq!(category, "other");
        assert_eq!(level, ThreatLevel::Low);
    }

    #[test]
    fn categorize_uses_description_too() {
        let (category, _) = categorize("City update", "cyclone warning issued for the coast");
        assert_eq!(category, "natural");
    }

    #[test]
    fn severity_high_beats_medium() {
        assert_eq!(severity("fatal crash, several injured"), ThreatLevel::High);
        assert_eq!(severity("several injured in collision"), ThreatLevel::Medium);
        assert_eq!(severity("minor disruption reported"), ThreatLevel::Low);
    }

    #[test]
    fn resolve_level_thresholds() {
        assert_eq!(resolve_level(&assessment(true, 0.85), ThreatLevel::Low), ThreatLevel::High);
        assert_eq!(resolve_level(&assessment(true, 0.8), ThreatLevel::Low), ThreatLevel::High);
        assert_eq!(resolve_level(&assessment(true, 0.65), ThreatLevel::Low), ThreatLevel::Medium);
        assert_eq!(resolve_level(&assessment(false, 0.4), ThreatLevel::High), ThreatLevel::Low);
    }

    #[test]
    fn resolve_level_falls_back_to_rule_severity() {
        assert_eq!(resolve_level(&assessment(false, 0.1), ThreatLevel::Medium), ThreatLevel::Medium);
        assert_eq!(resolve_level(&assessment(false, 0.0), ThreatLevel::High), ThreatLevel::High);
    }

    #[test]
    fn threat_level_ordering_and_serde() {
        assert!(ThreatLevel::High > ThreatLevel::Medium);
        assert!(ThreatLevel::Medium > ThreatLevel::Low);
        assert_eq!(serde_json::to_string(&ThreatLevel::High).unwrap(), "\"high\"");
    }
}
