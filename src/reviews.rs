use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::error::{AppError, Result};
use crate::models::{Candidate, CandidateStatus, NewReview, Phase, Review};
use crate::pipeline::{after_case_review, average};
use crate::state::AppState;
use crate::status::StatusDisplay;
use crate::store::{CandidateStore, CandidateUpdate, JobStore, ReviewStore, TransitionNote};

/// Statuses whose candidates are waiting on a case review.
pub const QUEUE_STATUSES: [CandidateStatus; 2] =
    [CandidateStatus::CaseSent, CandidateStatus::CaseReview];

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewForm {
    pub candidate_id: Uuid,
    #[validate(range(min = 0.0, max = 10.0))]
    pub technical_score: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub soft_skills_score: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub experience_score: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub case_score: Option<f64>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub final_score: Option<f64>,
    pub technical_comments: Option<String>,
    pub soft_skills_comments: Option<String>,
    pub experience_comments: Option<String>,
    pub case_comments: Option<String>,
    pub general_comments: Option<String>,
    #[serde(default)]
    pub recommend_approve: bool,
    #[serde(default)]
    pub recommend_interview: bool,
    pub suggested_seniority: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub candidate_id: Uuid,
    pub full_name: String,
    pub job_title: String,
    pub status: StatusDisplay,
    pub ai_score: Option<f64>,
    pub case_deadline: Option<DateTime<Utc>>,
    pub case_score_avg: Option<f64>,
    pub review_count: i32,
}

pub async fn queue(state: &AppState) -> Result<Vec<QueueItem>> {
    let mut candidates = state.store.candidates_in_status(&QUEUE_STATUSES).await?;
    candidates.sort_by_key(|c| c.case_deadline);
    let mut items = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let job_title = state
            .store
            .job_by_id(candidate.job_id)
            .await?
            .map(|job| job.title)
            .unwrap_or_default();
        items.push(QueueItem {
            candidate_id: candidate.id,
            full_name: candidate.full_name,
            job_title,
            status: candidate.status.into(),
            ai_score: candidate.ai_score,
            case_deadline: candidate.case_deadline,
            case_score_avg: candidate.case_score_avg,
            review_count: candidate.review_count,
        });
    }
    Ok(items)
}

/// Records an evaluator's review, refreshes the case average and moves the
/// candidate along when the review recommends approval.
pub async fn submit_review(
    state: &AppState,
    reviewer: &Principal,
    form: ReviewForm,
    now: DateTime<Utc>,
) -> Result<(Review, Candidate)> {
    form.validate()?;
    let candidate = state
        .store
        .candidate_by_id(form.candidate_id)
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    if !QUEUE_STATUSES.contains(&candidate.status) {
        return Err(AppError::Validation(format!(
            "candidate is not awaiting case review (status {})",
            candidate.status
        )));
    }

    let review = state
        .store
        .insert_review(NewReview {
            candidate_id: candidate.id,
            reviewer_id: reviewer.account_id,
            job_id: candidate.job_id,
            technical_score: form.technical_score,
            soft_skills_score: form.soft_skills_score,
            experience_score: form.experience_score,
            case_score: form.case_score,
            final_score: form.final_score,
            technical_comments: form.technical_comments,
            soft_skills_comments: form.soft_skills_comments,
            experience_comments: form.experience_comments,
            case_comments: form.case_comments,
            general_comments: form.general_comments,
            recommend_approve: form.recommend_approve,
            recommend_interview: form.recommend_interview,
            suggested_seniority: form.suggested_seniority,
            phase_reviewed: Phase::CaseReview,
            created_at: now,
        })
        .await?;

    let reviews = state.store.reviews_for(candidate.id).await?;
    let mut update = CandidateUpdate {
        case_score_avg: average(reviews.iter().filter_map(Review::effective_case_score)),
        review_count: Some(reviews.len() as i32),
        ..Default::default()
    };
    let mut note = None;
    if let Some(transition) = after_case_review(candidate.status, review.recommend_approve) {
        update.status = Some(transition.status);
        update.phase = transition.phase;
        if review.recommend_approve {
            update.case_approved = Some(true);
        }
        note = Some(TransitionNote {
            reason: format!("revisão do case por {}", reviewer.full_name),
            actor_id: Some(reviewer.account_id),
            at: now,
        });
    }

    let updated = state
        .store
        .update_candidate(candidate.id, &update, note)
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    tracing::info!(
        candidate_id = %updated.id,
        reviewer = %reviewer.account_id,
        review_count = updated.review_count,
        status = updated.status.code(),
        "case review recorded"
    );
    Ok((review, updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::testing::{harness, sample_candidate, Harness};

    fn evaluator() -> Principal {
        Principal {
            account_id: Uuid::new_v4(),
            email: "ana@empresa.com".into(),
            full_name: "Ana Lima".into(),
            role: Role::Evaluator,
        }
    }

    async fn candidate_with_case(h: &Harness) -> Candidate {
        let candidate = sample_candidate(&h.store).await;
        h.store
            .update_candidate(
                candidate.id,
                &CandidateUpdate {
                    status: Some(CandidateStatus::CaseSent),
                    phase: Some(Phase::Case),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn non_approving_review_moves_case_into_review() {
        let h = harness();
        let candidate = candidate_with_case(&h).await;
        assert_eq!(candidate.phase, Phase::Case);

        let (review, updated) = submit_review(
            &h.state,
            &evaluator(),
            ReviewForm {
                candidate_id: candidate.id,
                case_score: Some(6.0),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(review.phase_reviewed, Phase::CaseReview);
        assert_eq!(updated.status, CandidateStatus::CaseReview);
        assert_eq!(updated.phase, Phase::CaseReview);
        assert_eq!(updated.case_score_avg, Some(6.0));
        assert_eq!(updated.review_count, 1);
        assert_eq!(updated.case_approved, None);
    }

    #[tokio::test]
    async fn approval_averages_all_reviews() {
        let h = harness();
        let candidate = candidate_with_case(&h).await;
        submit_review(
            &h.state,
            &evaluator(),
            ReviewForm {
                candidate_id: candidate.id,
                case_score: Some(7.0),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

        let (review, updated) = submit_review(
            &h.state,
            &evaluator(),
            ReviewForm {
                candidate_id: candidate.id,
                final_score: Some(9.0),
                recommend_approve: true,
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(review.phase_reviewed, Phase::CaseReview);
        assert_eq!(updated.status, CandidateStatus::CaseApproved);
        assert_eq!(updated.phase, Phase::TechnicalInterview);
        assert_eq!(updated.case_score_avg, Some(8.0));
        assert_eq!(updated.review_count, 2);
        assert_eq!(updated.case_approved, Some(true));

        let history = h.store.status_history(candidate.id).await.unwrap();
        assert_eq!(history[0].new_status, "aprovado_case");
        assert!(h.state.store.candidates_in_status(&QUEUE_STATUSES).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reviews_outside_the_queue_are_refused() {
        let h = harness();
        let candidate = sample_candidate(&h.store).await;
        let err = submit_review(
            &h.state,
            &evaluator(),
            ReviewForm {
                candidate_id: candidate.id,
                recommend_approve: true,
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(h.store.reviews_for(candidate.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scores_must_be_on_the_ten_point_scale() {
        let h = harness();
        let candidate = candidate_with_case(&h).await;
        let err = submit_review(
            &h.state,
            &evaluator(),
            ReviewForm {
                candidate_id: candidate.id,
                case_score: Some(11.0),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn queue_lists_candidates_with_open_cases() {
        let h = harness();
        let waiting = candidate_with_case(&h).await;
        sample_candidate(&h.store).await;

        let items = queue(&h.state).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].candidate_id, waiting.id);
        assert_eq!(items[0].job_title, "Desenvolvedor Rust");
        assert_eq!(items[0].status.label, "Case Enviado");
    }
}
