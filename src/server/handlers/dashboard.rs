use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};

use crate::auth::Principal;
use crate::error::Result;
use crate::models::Role;
use crate::report::{summarize, PipelineSummary};
use crate::state::AppState;
use crate::store::CandidateStore;

pub async fn counts(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<Json<PipelineSummary>> {
    principal.require(&Role::STAFF)?;
    let candidates = state.store.list_candidates(None).await?;
    Ok(Json(summarize(&candidates)))
}
