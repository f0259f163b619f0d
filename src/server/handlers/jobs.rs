use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::Result;
use crate::jobs;
use crate::models::{Job, NewJob, Role};
use crate::state::AppState;
use crate::store::JobStore;

pub async fn public_list(State(state): State<AppState>) -> Result<Json<Vec<Job>>> {
    Ok(Json(state.store.list_jobs(true).await?))
}

pub async fn public_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Job>> {
    Ok(Json(jobs::public_by_key(&state, &key).await?))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<Json<Vec<Job>>> {
    principal.require(&Role::STAFF)?;
    Ok(Json(state.store.list_jobs(false).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Json(input): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>)> {
    principal.require(&[Role::Admin])?;
    let job = jobs::create(&state, input, principal.account_id, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn toggle(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>> {
    principal.require(&[Role::Admin])?;
    Ok(Json(jobs::toggle(&state, id).await?))
}
