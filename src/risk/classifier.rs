//! Risk Classifier
//!
//! Deterministic severity tiering: a map of per-category probabilities in,
//! one verdict out. Pure logic, no model calls, no I/O.

use super::categories::SAFE_CATEGORY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-category risk probabilities keyed by wire category
pub type RiskVector = HashMap<String, f32>;

// ============================================================================
// SEVERITY
// ============================================================================

/// Dominant score strictly above this is High
pub const HIGH_THRESHOLD: f32 = 0.7;

/// Dominant score strictly above this (and not High) is Medium
pub const MEDIUM_THRESHOLD: f32 = 0.4;

/// Severity tier of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Tier a dominant score.
    ///
    /// Comparisons are strictly greater: 0.7 exactly is Medium and 0.4
    /// exactly is Low.
    pub fn from_score(score: f32) -> Self {
        if score > HIGH_THRESHOLD {
            Severity::High
        } else if score > MEDIUM_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Classification output: severity tier plus the category that drove it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub level: Severity,
    /// Non-baseline key with the highest probability. Ties go to the
    /// lexicographically smallest key; when nothing scores above zero
    /// this falls back to the baseline key.
    pub dominant_category: String,
    pub dominant_score: f32,
    /// Probability under the reserved baseline key (0 if absent)
    pub safe_score: f32,
}

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify a risk vector into a severity verdict.
///
/// Returns `None` for an empty vector. Callers must treat that as
/// "cannot classify", never as Low.
pub fn classify(scores: &RiskVector) -> Option<Verdict> {
    if scores.is_empty() {
        return None;
    }

    // Highest-scoring harmful category. Only finite scores strictly above
    // zero compete, so an all-zero vector resolves to the baseline key.
    let mut dominant: Option<(&str, f32)> = None;
    for (key, &score) in scores {
        if key == SAFE_CATEGORY || !score.is_finite() || score <= 0.0 {
            continue;
        }
        let replace = match dominant {
            None => true,
            Some((best_key, best_score)) => {
                score > best_score || (score == best_score && key.as_str() < best_key)
            }
        };
        if replace {
            dominant = Some((key.as_str(), score));
        }
    }
    let (dominant_category, dominant_score) = dominant.unwrap_or((SAFE_CATEGORY, 0.0));

    let safe_score = scores
        .get(SAFE_CATEGORY)
        .copied()
        .filter(|s| s.is_finite())
        .unwrap_or(0.0);

    Some(Verdict {
        level: Severity::from_score(dominant_score),
        dominant_category: dominant_category.to_string(),
        dominant_score,
        safe_score,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(pairs: &[(&str, f32)]) -> RiskVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_empty_vector_has_no_verdict() {
        assert_eq!(classify(&RiskVector::new()), None);
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        let medium = classify(&vector(&[(SAFE_CATEGORY, 0.0), ("Hate Speech-Defamation", 0.70)]))
            .unwrap();
        assert_eq!(medium.level, Severity::Medium);

        let high = classify(&vector(&[
            (SAFE_CATEGORY, 0.0),
            ("Hate Speech-Defamation", 0.7000001),
        ]))
        .unwrap();
        assert_eq!(high.level, Severity::High);

        let low = classify(&vector(&[(SAFE_CATEGORY, 0.0), ("Hate Speech-Defamation", 0.40)]))
            .unwrap();
        assert_eq!(low.level, Severity::Low);

        let medium_edge = classify(&vector(&[
            (SAFE_CATEGORY, 0.0),
            ("Hate Speech-Defamation", 0.4000001),
        ]))
        .unwrap();
        assert_eq!(medium_edge.level, Severity::Medium);
    }

    #[test]
    fn test_baseline_only_is_low_with_zero_dominant() {
        let verdict = classify(&vector(&[(SAFE_CATEGORY, 1.0)])).unwrap();
        assert_eq!(verdict.level, Severity::Low);
        assert_eq!(verdict.dominant_category, SAFE_CATEGORY);
        assert_eq!(verdict.dominant_score, 0.0);
        assert_eq!(verdict.safe_score, 1.0);
    }

    #[test]
    fn test_all_zero_scores_fall_back_to_baseline() {
        let verdict = classify(&vector(&[
            (SAFE_CATEGORY, 0.3),
            ("Cybersecurity-Malicious Code", 0.0),
            ("Data Privacy-Personal Privacy", 0.0),
        ]))
        .unwrap();
        assert_eq!(verdict.dominant_category, SAFE_CATEGORY);
        assert_eq!(verdict.dominant_score, 0.0);
        assert_eq!(verdict.level, Severity::Low);
    }

    #[test]
    fn test_dominant_category_selection() {
        let verdict = classify(&vector(&[
            (SAFE_CATEGORY, 0.1),
            ("Inappropriate Suggestions-Finance", 0.3),
            ("Cybersecurity-Hacker Attack", 0.9),
            ("Hate Speech-Cyberbullying", 0.2),
        ]))
        .unwrap();
        assert_eq!(verdict.dominant_category, "Cybersecurity-Hacker Attack");
        assert_eq!(verdict.dominant_score, 0.9);
        assert!((verdict.safe_score - 0.1).abs() < 1e-6);
        assert_eq!(verdict.level, Severity::High);
    }

    #[test]
    fn test_equal_scores_pick_lexicographically_smallest_key() {
        let verdict = classify(&vector(&[
            (SAFE_CATEGORY, 0.0),
            ("Hate Speech-Defamation", 0.5),
            ("Cybersecurity-Hacker Attack", 0.5),
            ("Extremism-Social Disruption", 0.5),
        ]))
        .unwrap();
        assert_eq!(verdict.dominant_category, "Cybersecurity-Hacker Attack");
        assert_eq!(verdict.dominant_score, 0.5);
    }

    #[test]
    fn test_non_finite_scores_are_skipped() {
        let verdict = classify(&vector(&[
            (SAFE_CATEGORY, f32::NAN),
            ("Cybersecurity-Malicious Code", f32::INFINITY),
            ("Hate Speech-Defamation", 0.3),
        ]))
        .unwrap();
        assert_eq!(verdict.dominant_category, "Hate Speech-Defamation");
        assert_eq!(verdict.dominant_score, 0.3);
        assert_eq!(verdict.safe_score, 0.0);
    }

    #[test]
    fn test_missing_baseline_reads_as_zero() {
        let verdict = classify(&vector(&[("Hate Speech-Defamation", 0.8)])).unwrap();
        assert_eq!(verdict.safe_score, 0.0);
        assert_eq!(verdict.level, Severity::High);
    }

    #[test]
    fn test_severity_from_score() {
        assert_eq!(Severity::from_score(0.0), Severity::Low);
        assert_eq!(Severity::from_score(0.4), Severity::Low);
        assert_eq!(Severity::from_score(0.5), Severity::Medium);
        assert_eq!(Severity::from_score(0.7), Severity::Medium);
        assert_eq!(Severity::from_score(0.71), Severity::High);
        assert_eq!(Severity::from_score(1.0), Severity::High);
        assert!(Severity::High.is_high());
        assert!(!Severity::Medium.is_high());
        assert_eq!(Severity::Medium.as_str(), "medium");
    }
}
