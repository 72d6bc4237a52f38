// src/scoring/rubric.rs

//! Grading rubrics for manually scored question types.
//!
//! Rubrics are keyed by question type, not by question. Each criterion offers
//! a fixed set of levels and a grader picks exactly one level per criterion.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        answer::{CriterionGrade, CriterionSelection},
        question::QuestionType,
    },
    scoring::policy::POLICY,
};

#[derive(Debug, Serialize)]
pub struct Level {
    pub points: u32,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Criterion {
    pub key: &'static str,
    pub name: &'static str,
    pub levels: &'static [Level],
}

impl Criterion {
    pub fn max_points(&self) -> u32 {
        self.levels.iter().map(|l| l.points).max().unwrap_or(0)
    }

    fn level(&self, points: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.points == points)
    }
}

#[derive(Debug, Serialize)]
pub struct Rubric {
    pub criteria: &'static [Criterion],
}

/// Score produced by one rubric grading pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RubricOutcome {
    pub score: u32,
    pub max: u32,
    /// Reviewer flag only; attempt pass/fail never looks at it.
    pub is_correct: bool,
    pub grades: Vec<CriterionGrade>,
}

impl Rubric {
    pub fn max_points(&self) -> u32 {
        self.criteria.iter().map(Criterion::max_points).sum()
    }

    /// Sums one selected level per criterion.
    ///
    /// Every criterion must be selected exactly once and the points must match
    /// one of its levels.
    pub fn evaluate(&self, selections: &[CriterionSelection]) -> Result<RubricOutcome, AppError> {
        let mut seen = HashSet::new();
        for selection in selections {
            if !self.criteria.iter().any(|c| c.key == selection.criterion) {
                return Err(AppError::BadRequest(format!(
                    "Unknown rubric criterion '{}'",
                    selection.criterion
                )));
            }
            if !seen.insert(selection.criterion.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "Criterion '{}' selected more than once",
                    selection.criterion
                )));
            }
        }

        let mut score = 0;
        let mut grades = Vec::with_capacity(self.criteria.len());
        for criterion in self.criteria {
            let selection = selections
                .iter()
                .find(|s| s.criterion == criterion.key)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Missing a level for criterion '{}'", criterion.key))
                })?;

            if criterion.level(selection.points).is_none() {
                return Err(AppError::BadRequest(format!(
                    "{} points is not a level of criterion '{}'",
                    selection.points, criterion.key
                )));
            }

            score += selection.points;
            grades.push(CriterionGrade {
                criterion: criterion.key.to_string(),
                points: selection.points,
                note: selection.note.clone(),
            });
        }

        let max = self.max_points();
        Ok(RubricOutcome {
            score,
            max,
            is_correct: POLICY.meets_correct_ratio(score as f64, max as f64),
            grades,
        })
    }
}

/// The rubric for a question type, if it has one.
///
/// Every manually graded type must have an arm here; objective types and
/// unrecognised tags have none.
pub fn rubric_for(question_type: &QuestionType) -> Option<&'static Rubric> {
    match question_type {
        QuestionType::Essay => Some(&ESSAY),
        QuestionType::EmailResponse => Some(&EMAIL_RESPONSE),
        QuestionType::VideoResponse => Some(&VIDEO_RESPONSE),
        QuestionType::TimedVideoResponse => Some(&TIMED_VIDEO_RESPONSE),
        QuestionType::ScenarioResponse => Some(&SCENARIO_RESPONSE),
        QuestionType::MultipleChoice
        | QuestionType::LikertScale
        | QuestionType::ForcedChoice
        | QuestionType::EthicalChoice
        | QuestionType::ScenarioChoice
        | QuestionType::Unknown(_) => None,
    }
}

const fn level(points: u32, label: &'static str, description: &'static str) -> Level {
    Level {
        points,
        label,
        description,
    }
}

static ESSAY: Rubric = Rubric {
    criteria: &[
        Criterion {
            key: "content",
            name: "Content & Ideas",
            levels: &[
                level(0, "Missing", "Does not address the prompt."),
                level(2, "Developing", "Addresses the prompt with thin or generic support."),
                level(3, "Proficient", "Clear position supported by relevant examples."),
                level(4, "Exemplary", "Insightful position with specific, well-chosen evidence."),
            ],
        },
        Criterion {
            key: "organization",
            name: "Organization",
            levels: &[
                level(0, "Missing", "No discernible structure."),
                level(1, "Developing", "Some structure; ideas jump between points."),
                level(2, "Proficient", "Logical order with working transitions."),
                level(3, "Exemplary", "Each paragraph builds on the last toward a clear conclusion."),
            ],
        },
        Criterion {
            key: "language",
            name: "Language & Mechanics",
            levels: &[
                level(0, "Missing", "Errors make the text hard to follow."),
                level(1, "Developing", "Frequent errors that distract the reader."),
                level(2, "Proficient", "Occasional errors that do not impede meaning."),
                level(3, "Exemplary", "Precise, varied language with virtually no errors."),
            ],
        },
    ],
};

static EMAIL_RESPONSE: Rubric = Rubric {
    criteria: &[
        Criterion {
            key: "tone",
            name: "Professional Tone",
            levels: &[
                level(0, "Inappropriate", "Rude, dismissive or overly casual."),
                level(1, "Uneven", "Mostly polite with lapses in register."),
                level(2, "Professional", "Courteous and appropriate throughout."),
                level(3, "Exemplary", "Warm, empathetic and consistently professional."),
            ],
        },
        Criterion {
            key: "clarity",
            name: "Clarity",
            levels: &[
                level(0, "Unclear", "The reader cannot tell what is being said."),
                level(1, "Wordy", "Main point is present but buried."),
                level(2, "Clear", "Main point is easy to find."),
                level(3, "Concise", "Every sentence earns its place."),
            ],
        },
        Criterion {
            key: "completeness",
            name: "Completeness",
            levels: &[
                level(0, "Incomplete", "Ignores most of the sender's questions."),
                level(1, "Partial", "Answers some questions."),
                level(2, "Complete", "Answers every question raised."),
            ],
        },
        Criterion {
            key: "next_steps",
            name: "Next Steps",
            levels: &[
                level(0, "None", "No follow-up or resolution offered."),
                level(1, "Vague", "Follow-up mentioned without specifics."),
                level(2, "Actionable", "Concrete next steps with owners or timing."),
            ],
        },
    ],
};

static VIDEO_RESPONSE: Rubric = Rubric {
    criteria: &[
        Criterion {
            key: "communication",
            name: "Verbal Communication",
            levels: &[
                level(0, "Missing", "Inaudible or off-topic."),
                level(2, "Developing", "Understandable with frequent hesitation."),
                level(3, "Proficient", "Clear and well paced."),
                level(4, "Exemplary", "Articulate, confident and engaging."),
            ],
        },
        Criterion {
            key: "content",
            name: "Answer Quality",
            levels: &[
                level(0, "Missing", "Does not answer the question."),
                level(2, "Developing", "Partial answer with little support."),
                level(3, "Proficient", "Complete answer with a relevant example."),
                level(4, "Exemplary", "Complete, structured answer with concrete outcomes."),
            ],
        },
        Criterion {
            key: "presence",
            name: "Professional Presence",
            levels: &[
                level(0, "Distracting", "Environment or demeanour distracts from the answer."),
                level(1, "Adequate", "Minor distractions."),
                level(2, "Strong", "Composed, attentive and professional."),
            ],
        },
    ],
};

static TIMED_VIDEO_RESPONSE: Rubric = Rubric {
    criteria: &[
        Criterion {
            key: "communication",
            name: "Verbal Communication",
            levels: &[
                level(0, "Missing", "Inaudible or off-topic."),
                level(1, "Developing", "Understandable with frequent hesitation."),
                level(2, "Proficient", "Clear and well paced."),
                level(3, "Exemplary", "Articulate and confident under time pressure."),
            ],
        },
        Criterion {
            key: "content",
            name: "Answer Quality",
            levels: &[
                level(0, "Missing", "Does not answer the question."),
                level(2, "Developing", "Partial answer with little support."),
                level(3, "Proficient", "Complete answer with a relevant example."),
                level(4, "Exemplary", "Complete, structured answer with concrete outcomes."),
            ],
        },
        Criterion {
            key: "time_management",
            name: "Time Management",
            levels: &[
                level(0, "Poor", "Cut off mid-answer or finished far too early."),
                level(1, "Uneven", "Rushed ending or long pauses."),
                level(2, "Good", "Covers the answer within the limit."),
                level(3, "Excellent", "Well-proportioned answer that lands on time."),
            ],
        },
    ],
};

static SCENARIO_RESPONSE: Rubric = Rubric {
    criteria: &[
        Criterion {
            key: "analysis",
            name: "Situation Analysis",
            levels: &[
                level(0, "Missing", "Does not engage with the scenario."),
                level(2, "Surface", "Restates the scenario without identifying the core issue."),
                level(3, "Sound", "Identifies the core issue and the people affected."),
                level(4, "Thorough", "Identifies the core issue, stakeholders and risks."),
            ],
        },
        Criterion {
            key: "decision",
            name: "Decision Quality",
            levels: &[
                level(0, "Missing", "No decision or an unsafe one."),
                level(2, "Workable", "Reasonable decision with notable gaps."),
                level(3, "Good", "Sound decision that addresses the core issue."),
                level(4, "Excellent", "Sound decision that also prevents recurrence."),
            ],
        },
        Criterion {
            key: "justification",
            name: "Justification",
            levels: &[
                level(0, "None", "No reasoning given."),
                level(1, "Partial", "Some reasoning, loosely connected to the decision."),
                level(2, "Clear", "Reasoning ties directly to the decision."),
            ],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::classify::{ScoringCategory, classify};

    fn select(criterion: &str, points: u32) -> CriterionSelection {
        CriterionSelection {
            criterion: criterion.to_string(),
            points,
            note: None,
        }
    }

    #[test]
    fn every_manual_type_has_a_rubric() {
        for tag in [
            "essay",
            "email_response",
            "video_response",
            "timed_video_response",
            "scenario_response",
        ] {
            let question_type = QuestionType::from(tag);
            assert_eq!(classify(&question_type), ScoringCategory::Manual);
            let rubric = rubric_for(&question_type).expect(tag);
            assert_eq!(rubric.max_points(), 10, "{tag}");
            for criterion in rubric.criteria {
                assert!(criterion.levels.iter().any(|l| l.points == 0), "{}", criterion.key);
            }
        }
    }

    #[test]
    fn auto_and_unknown_types_have_no_rubric() {
        assert!(rubric_for(&QuestionType::MultipleChoice).is_none());
        assert!(rubric_for(&QuestionType::from("portfolio_upload")).is_none());
    }

    #[test]
    fn evaluate_sums_selected_levels() {
        let outcome = ESSAY
            .evaluate(&[select("content", 3), select("organization", 2), select("language", 1)])
            .unwrap();
        assert_eq!(outcome.score, 6);
        assert_eq!(outcome.max, 10);
        assert!(outcome.is_correct);
        assert_eq!(outcome.grades.len(), 3);
        assert_eq!(outcome.grades[0].criterion, "content");
    }

    #[test]
    fn below_sixty_percent_is_flagged_incorrect() {
        let outcome = ESSAY
            .evaluate(&[select("language", 1), select("content", 2), select("organization", 2)])
            .unwrap();
        assert_eq!(outcome.score, 5);
        assert!(!outcome.is_correct);
    }

    #[test]
    fn rejects_incomplete_or_invalid_passes() {
        let missing = ESSAY.evaluate(&[select("content", 3), select("organization", 2)]);
        assert!(matches!(missing, Err(AppError::BadRequest(_))));

        let off_level = ESSAY.evaluate(&[
            select("content", 1),
            select("organization", 2),
            select("language", 1),
        ]);
        assert!(matches!(off_level, Err(AppError::BadRequest(_))));

        let duplicate = ESSAY.evaluate(&[
            select("content", 3),
            select("content", 4),
            select("organization", 2),
            select("language", 1),
        ]);
        assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

        let unknown = ESSAY.evaluate(&[
            select("content", 3),
            select("organization", 2),
            select("language", 1),
            select("creativity", 1),
        ]);
        assert!(matches!(unknown, Err(AppError::BadRequest(_))));
    }
}
