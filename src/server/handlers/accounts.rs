use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::accounts::{self, ProfileForm, RoleChange};
use crate::auth::Principal;
use crate::error::Result;
use crate::models::{Account, Role};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<Json<Vec<Account>>> {
    principal.require(&[Role::Admin])?;
    Ok(Json(accounts::list(&state).await?))
}

pub async fn toggle(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Account>> {
    principal.require(&[Role::Admin])?;
    Ok(Json(accounts::toggle_active(&state, &principal, id).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Path(id): Path<Uuid>,
    Json(change): Json<RoleChange>,
) -> Result<Json<Account>> {
    principal.require(&[Role::Admin])?;
    let account = accounts::change_role(&state, &principal, id, change.role).await?;
    Ok(Json(account))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Arc<Principal>>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Account>> {
    principal.require(&[Role::Candidate])?;
    Ok(Json(accounts::update_profile(&state, &principal, &form).await?))
}
