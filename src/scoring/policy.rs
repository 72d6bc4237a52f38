// src/scoring/policy.rs

use crate::models::attempt::Assessment;

/// Process-wide scoring constants. Import `POLICY`; never re-declare these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    /// Inclusive range of valid likert ratings.
    pub likert_min: i32,
    pub likert_max: i32,
    /// Fraction of a rubric's maximum at which a graded response is flagged correct.
    pub rubric_correct_ratio: f64,
    /// Passing percentage for assessments that do not set one.
    pub default_passing_score: f64,
}

/// Percentage points below the threshold still treated as meeting it.
const PERCENTAGE_TOLERANCE: f64 = 1e-9;

pub const POLICY: ScoringPolicy = ScoringPolicy {
    likert_min: 1,
    likert_max: 5,
    rubric_correct_ratio: 0.6,
    default_passing_score: 70.0,
};

impl ScoringPolicy {
    pub fn likert_in_range(&self, rating: i32) -> bool {
        (self.likert_min..=self.likert_max).contains(&rating)
    }

    pub fn passing_score(&self, assessment: Option<&Assessment>) -> f64 {
        assessment
            .and_then(|a| a.passing_score)
            .unwrap_or(self.default_passing_score)
    }

    /// Pass check tolerant of float noise in summed fractional points.
    pub fn meets_passing_score(&self, percentage: f64, passing_score: f64) -> bool {
        percentage + PERCENTAGE_TOLERANCE >= passing_score
    }

    /// Correctness flag for a response earning `earned` out of `max`.
    /// Only used to flag responses for reviewers, never for pass/fail.
    pub fn meets_correct_ratio(&self, earned: f64, max: f64) -> bool {
        max > 0.0 && earned / max >= self.rubric_correct_ratio
    }
}
