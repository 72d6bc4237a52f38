// src/scoring/report.rs

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        answer::Answer, attempt::AttemptScore, competency::CompetencyMapping,
        question::{Question, QuestionType},
    },
    scoring::{
        ScoringCategory, aggregate::summarize, classify,
        competency::get_competency_area,
        load_attempt,
        policy::POLICY,
        status::{ScoringStatus, status_of},
    },
    store::ScoringStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerState {
    Scored,
    Pending,
    Unanswered,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReport {
    pub question_id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub category: ScoringCategory,
    pub content: String,
    pub points_possible: f64,
    pub points_awarded: Option<f64>,
    pub is_correct: Option<bool>,
    pub state: AnswerState,
    pub competency_area: String,
}

/// Totals for one competency area over answered questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyRollup {
    pub area: String,
    pub questions: usize,
    pub points_possible: f64,
    pub points_awarded: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub attempt_id: i64,
    pub assessment_id: i64,
    pub assessment_title: Option<String>,
    pub passing_score: f64,
    /// Recomputed from the current answers; not read from the attempt row.
    pub score: AttemptScore,
    pub status: ScoringStatus,
    pub questions: Vec<QuestionReport>,
    pub competencies: Vec<CompetencyRollup>,
}

/// Read-only per-question breakdown of an attempt with a competency rollup.
pub async fn generate_assessment_report(
    store: &dyn ScoringStore,
    attempt_id: i64,
) -> Result<AssessmentReport, AppError> {
    let ctx = load_attempt(store, attempt_id).await?;
    let mappings: HashMap<i64, CompetencyMapping> = store
        .competency_mappings(ctx.attempt.assessment_id)
        .await?
        .into_iter()
        .map(|m| (m.question_id, m))
        .collect();

    let passing_score = POLICY.passing_score(ctx.assessment.as_ref());
    let answers: HashMap<i64, &Answer> = ctx
        .answered
        .iter()
        .map(|(answer, _)| (answer.question_id, answer))
        .collect();

    let questions: Vec<QuestionReport> = ctx
        .questions
        .iter()
        .map(|question| question_report(question, answers.get(&question.id).copied(), &mappings))
        .collect();

    Ok(AssessmentReport {
        attempt_id,
        assessment_id: ctx.attempt.assessment_id,
        assessment_title: ctx.assessment.as_ref().map(|a| a.title.clone()),
        passing_score,
        score: summarize(attempt_id, &ctx.answered, passing_score),
        status: status_of(attempt_id, &ctx.answered),
        competencies: rollup(&questions),
        questions,
    })
}

fn question_report(
    question: &Question,
    answer: Option<&Answer>,
    mappings: &HashMap<i64, CompetencyMapping>,
) -> QuestionReport {
    let state = match answer {
        None => AnswerState::Unanswered,
        Some(a) if a.is_scored() => AnswerState::Scored,
        Some(_) => AnswerState::Pending,
    };

    QuestionReport {
        question_id: question.id,
        question_type: question.question_type.clone(),
        category: classify(&question.question_type),
        content: question.content.clone(),
        points_possible: question.points_possible,
        points_awarded: answer.and_then(|a| a.points_awarded),
        is_correct: answer.and_then(|a| a.is_correct),
        state,
        competency_area: get_competency_area(question, mappings.get(&question.id)),
    }
}

/// Unanswered questions are left out, matching the attempt denominator.
fn rollup(questions: &[QuestionReport]) -> Vec<CompetencyRollup> {
    let mut areas: BTreeMap<&str, CompetencyRollup> = BTreeMap::new();

    for q in questions.iter().filter(|q| q.state != AnswerState::Unanswered) {
        let entry = areas
            .entry(q.competency_area.as_str())
            .or_insert_with(|| CompetencyRollup {
                area: q.competency_area.clone(),
                questions: 0,
                points_possible: 0.0,
                points_awarded: 0.0,
                percentage: 0.0,
            });
        entry.questions += 1;
        entry.points_possible += q.points_possible;
        entry.points_awarded += q.points_awarded.unwrap_or(0.0);
    }

    areas
        .into_values()
        .map(|mut r| {
            if r.points_possible > 0.0 {
                r.percentage = r.points_awarded / r.points_possible * 100.0;
            }
            r
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{
        competency::save_question_competency_mapping, fixtures::scenario_store,
        objective::score_objective_questions,
    };

    #[tokio::test]
    async fn report_covers_every_question() {
        let store = scenario_store().await;
        score_objective_questions(&store, 1).await.unwrap();
        save_question_competency_mapping(&store, 3, "Written Communication", 11)
            .await
            .unwrap();

        let report = generate_assessment_report(&store, 1).await.unwrap();
        assert_eq!(report.questions.len(), 4);
        assert_eq!(report.passing_score, 70.0);
        assert_eq!(report.assessment_title.as_deref(), Some("Customer Support Associate"));

        let states: Vec<AnswerState> = report.questions.iter().map(|q| q.state).collect();
        assert_eq!(
            states,
            vec![
                AnswerState::Scored,
                AnswerState::Scored,
                AnswerState::Pending,
                AnswerState::Unanswered
            ]
        );
        assert_eq!(report.questions[2].category, ScoringCategory::Manual);
        assert_eq!(report.questions[2].competency_area, "Written Communication");

        assert_eq!(report.score.total_possible, 13.0);
        assert_eq!(report.status.pending_manual, 1);

        let written = report
            .competencies
            .iter()
            .find(|c| c.area == "Written Communication")
            .unwrap();
        assert_eq!(written.questions, 1);
        assert_eq!(written.points_possible, 10.0);
        assert_eq!(written.points_awarded, 0.0);

        let counted: usize = report.competencies.iter().map(|c| c.questions).sum();
        assert_eq!(counted, 3);
    }

    #[tokio::test]
    async fn report_is_read_only() {
        let store = scenario_store().await;
        generate_assessment_report(&store, 1).await.unwrap();

        let attempt = store.attempt(1).await.unwrap().unwrap();
        assert_eq!(attempt.score, None);
        assert_eq!(store.answer(1).await.unwrap().unwrap().points_awarded, None);
    }
}
