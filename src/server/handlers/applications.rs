use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::applications::{self, ApplicationForm, ApplicationView, LookupQuery, Submission};
use crate::auth::Principal;
use crate::candidates;
use crate::error::{AppError, Result};
use crate::models::{Candidate, Role};
use crate::server::authn::session_token;
use crate::state::AppState;
use crate::status::StatusDisplay;
use crate::storage::{DocumentKind, Upload};

#[derive(Serialize)]
pub struct SubmitResponse {
    pub candidate_id: Uuid,
    pub tracking_token: String,
    pub status: StatusDisplay,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub job_id: Option<Uuid>,
}

fn multipart_error(err: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("invalid form data: {err}"))
}

/// Signed-in candidates get the application linked to their account.
async fn candidate_account(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    let token = session_token(headers)?;
    let principal = state.auth.validate(&token, Utc::now()).await.ok()?;
    (principal.role == Role::Candidate).then_some(principal.account_id)
}

pub async fn submit(
    State(state): State<AppState>,
    Path(job_key): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut resume = None;
    let mut cover_letter = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        let kind = match name.as_str() {
            "resume" | "curriculo" => Some(DocumentKind::Resume),
            "cover_letter" | "carta" => Some(DocumentKind::CoverLetter),
            _ => None,
        };
        match kind {
            Some(kind) => {
                let file_name = field.file_name().unwrap_or("documento").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                // browsers send an empty part when no file was picked
                if data.is_empty() {
                    continue;
                }
                let upload = Upload {
                    kind,
                    file_name,
                    data: data.to_vec(),
                };
                match kind {
                    DocumentKind::Resume => resume = Some(upload),
                    DocumentKind::CoverLetter => cover_letter = Some(upload),
                }
            }
            None => {
                let value = field.text().await.map_err(multipart_error)?;
                fields.insert(name, value);
            }
        }
    }

    let form: ApplicationForm = serde_json::from_value(serde_json::to_value(&fields)?)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let submission = Submission {
        form,
        resume,
        cover_letter,
        account_id: candidate_account(&state, &headers).await,
    };
    let (candidate, _) = applications::submit(&state, &job_key, submission, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            candidate_id: candidate.id,
            tracking_token: candidate.tracking_token,
            status: candidate.status.into(),
        }),
    ))
}

pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Vec<ApplicationView>>> {
    Ok(Json(applications::lookup(&state, &query).await?))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<Json<Vec<ApplicationView>>> {
    principal.require(&[Role::Candidate])?;
    let views = applications::for_account(&state, principal.account_id, &principal.email).await?;
    Ok(Json(views))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Candidate>>> {
    principal.require(&Role::STAFF)?;
    Ok(Json(candidates::list(&state, query.job_id).await?))
}
