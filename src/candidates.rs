use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, Result};
use crate::models::{
    Candidate, CandidateStatus, InterviewStage, Job, Notification, Review, StatusHistoryEntry,
};
use crate::notify::NotificationEvent;
use crate::pipeline::{is_consistent, manual};
use crate::state::AppState;
use crate::status::{phase_label, style, StatusDisplay};
use crate::store::{
    CandidateStore, CandidateUpdate, JobStore, NotificationStore, ReviewStore, TransitionNote,
};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: CandidateStatus,
    pub reason: Option<String>,
    #[serde(default = "default_notify")]
    pub notify: bool,
    pub next_steps: Option<String>,
    pub internal_notes: Option<String>,
}

fn default_notify() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewRequest {
    pub stage: InterviewStage,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub interviewer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateDetail {
    pub candidate: Candidate,
    pub job: Option<Job>,
    pub status: StatusDisplay,
    pub phase_label: &'static str,
    /// False when the stored phase disagrees with the status.
    pub consistent: bool,
    pub history: Vec<StatusHistoryEntry>,
    pub reviews: Vec<Review>,
    pub notifications: Vec<Notification>,
}

async fn load(state: &AppState, id: Uuid) -> Result<(Candidate, Job)> {
    let candidate = state
        .store
        .candidate_by_id(id)
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    let job = state
        .store
        .job_by_id(candidate.job_id)
        .await?
        .ok_or(AppError::NotFound("job"))?;
    Ok((candidate, job))
}

/// Newest applications first, optionally restricted to one job.
pub async fn list(state: &AppState, job_id: Option<Uuid>) -> Result<Vec<Candidate>> {
    let mut candidates = state.store.list_candidates(job_id).await?;
    candidates.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
    Ok(candidates)
}

pub async fn detail(state: &AppState, id: Uuid) -> Result<CandidateDetail> {
    let candidate = state
        .store
        .candidate_by_id(id)
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    let job = state.store.job_by_id(candidate.job_id).await?;
    Ok(CandidateDetail {
        status: candidate.status.into(),
        phase_label: phase_label(candidate.phase),
        consistent: is_consistent(candidate.status, candidate.phase),
        history: state.store.status_history(id).await?,
        reviews: state.store.reviews_for(id).await?,
        notifications: state.store.notifications_for(id).await?,
        job,
        candidate,
    })
}

/// Moves the candidate to any status, recording who did it. Final approval
/// sends the approval email; other statuses send the generic update.
pub async fn change_status(
    state: &AppState,
    actor: &Principal,
    id: Uuid,
    change: StatusChange,
    now: DateTime<Utc>,
) -> Result<(Candidate, Option<JoinHandle<()>>)> {
    let (candidate, job) = load(state, id).await?;
    let transition = manual(change.status);
    let update = CandidateUpdate {
        status: Some(transition.status),
        phase: transition.phase,
        internal_notes: change.internal_notes,
        ..Default::default()
    };
    let note = TransitionNote {
        reason: change
            .reason
            .unwrap_or_else(|| format!("alterado por {}", actor.full_name)),
        actor_id: Some(actor.account_id),
        at: now,
    };
    let updated = state
        .store
        .update_candidate(candidate.id, &update, Some(note))
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    tracing::info!(
        candidate_id = %updated.id,
        from = candidate.status.code(),
        to = updated.status.code(),
        actor = %actor.account_id,
        "status changed"
    );

    if !change.notify {
        return Ok((updated, None));
    }
    let event = if updated.status == CandidateStatus::Approved {
        NotificationEvent::FinalApproval {
            next_steps: change.next_steps,
        }
    } else {
        let look = style(updated.status);
        NotificationEvent::StatusChanged {
            status_label: look.candidate_label.to_string(),
            status_message: look.message.to_string(),
        }
    };
    let handle = state.notifier.dispatch(&updated, &job.title, event).await;
    Ok((updated, handle))
}

pub async fn schedule_interview(
    state: &AppState,
    actor: &Principal,
    id: Uuid,
    request: InterviewRequest,
    now: DateTime<Utc>,
) -> Result<(Candidate, Option<JoinHandle<()>>)> {
    if request.location.trim().is_empty() {
        return Err(AppError::Validation("location is required".into()));
    }
    let (candidate, job) = load(state, id).await?;
    let transition = manual(request.stage.status());
    let mut update = CandidateUpdate {
        status: Some(transition.status),
        phase: transition.phase,
        ..Default::default()
    };
    match request.stage {
        InterviewStage::Technical => update.technical_interview_at = Some(request.scheduled_at),
        InterviewStage::Partners => update.partners_interview_at = Some(request.scheduled_at),
    }
    let note = TransitionNote {
        reason: format!("{} agendada", request.stage.label()),
        actor_id: Some(actor.account_id),
        at: now,
    };
    let updated = state
        .store
        .update_candidate(candidate.id, &update, Some(note))
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    tracing::info!(
        candidate_id = %updated.id,
        stage = request.stage.label(),
        "interview scheduled"
    );

    let handle = state
        .notifier
        .dispatch(
            &updated,
            &job.title,
            NotificationEvent::InterviewScheduled {
                interview_kind: request.stage.label().to_string(),
                scheduled_at: request.scheduled_at,
                location: request.location,
                interviewer: request.interviewer,
            },
        )
        .await;
    Ok((updated, handle))
}

/// Renders and sends an email right away, surfacing transport failures.
pub async fn notify(
    state: &AppState,
    candidate_id: Uuid,
    event: NotificationEvent,
) -> Result<Notification> {
    let (candidate, job) = load(state, candidate_id).await?;
    state.notifier.send_now(&candidate, &job.title, event).await
}
