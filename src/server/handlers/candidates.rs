use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::candidates::{self, CandidateDetail, InterviewRequest, StatusChange};
use crate::error::{AppError, Result};
use crate::evaluation::{evaluate_candidate, EvaluationOutcome};
use crate::models::{Candidate, Notification, Role};
use crate::notify::NotificationEvent;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EvaluateInput {
    pub candidate_id: Uuid,
}

#[derive(Deserialize)]
pub struct SendInput {
    pub candidate_id: Uuid,
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateDetail>> {
    principal.require(&Role::STAFF)?;
    Ok(Json(candidates::detail(&state, id).await?))
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusChange>,
) -> Result<Json<Candidate>> {
    principal.require(&[Role::Admin])?;
    let (candidate, _) =
        candidates::change_status(&state, &principal, id, input, Utc::now()).await?;
    Ok(Json(candidate))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
    Json(input): Json<InterviewRequest>,
) -> Result<Json<Candidate>> {
    principal.require(&[Role::Admin])?;
    let (candidate, _) =
        candidates::schedule_interview(&state, &principal, id, input, Utc::now()).await?;
    Ok(Json(candidate))
}

pub async fn evaluate(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Json(input): Json<EvaluateInput>,
) -> Result<Json<EvaluationOutcome>> {
    principal.require(&[Role::Admin])?;
    let (outcome, _) =
        evaluate_candidate(&state, input.candidate_id, Some(principal.account_id), Utc::now())
            .await?;
    Ok(Json(outcome))
}

pub async fn send_notification(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Json(input): Json<SendInput>,
) -> Result<Json<Notification>> {
    principal.require(&[Role::Admin])?;
    let data = if input.data.is_null() { json!({}) } else { input.data };
    let event: NotificationEvent =
        serde_json::from_value(json!({ "kind": input.kind, "data": data }))
            .map_err(|e| AppError::Validation(format!("invalid notification: {e}")))?;
    Ok(Json(candidates::notify(&state, input.candidate_id, event).await?))
}
