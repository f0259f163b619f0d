use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;

use crate::auth::Principal;
use crate::error::Result;
use crate::models::{Review, Role};
use crate::reviews::{self, QueueItem, ReviewForm};
use crate::state::AppState;

pub async fn queue(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<Json<Vec<QueueItem>>> {
    principal.require(&Role::STAFF)?;
    Ok(Json(reviews::queue(&state).await?))
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    principal.require(&Role::STAFF)?;
    let (review, _) = reviews::submit_review(&state, &principal, form, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
