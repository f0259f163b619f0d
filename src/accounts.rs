use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::error::{AppError, Result};
use crate::models::{Account, Role};
use crate::state::AppState;
use crate::store::AccountStore;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

pub async fn list(state: &AppState) -> Result<Vec<Account>> {
    state.store.list_accounts().await
}

async fn existing(state: &AppState, id: Uuid) -> Result<Account> {
    state
        .store
        .account_by_id(id)
        .await?
        .ok_or(AppError::NotFound("account"))
}

/// Flips the active flag. A disabled account loses its session at once.
pub async fn toggle_active(state: &AppState, actor: &Principal, id: Uuid) -> Result<Account> {
    if actor.account_id == id {
        return Err(AppError::Validation("you cannot disable your own account".into()));
    }
    let account = existing(state, id).await?;
    let account = state
        .store
        .set_account_active(id, !account.active)
        .await?
        .ok_or(AppError::NotFound("account"))?;
    if !account.active {
        state.store.delete_sessions_for(id).await?;
    }
    tracing::info!(
        account_id = %id,
        active = account.active,
        by = %actor.account_id,
        "account toggled"
    );
    Ok(account)
}

/// Sessions carry the role they were opened with, so changing it signs the
/// account out.
pub async fn change_role(
    state: &AppState,
    actor: &Principal,
    id: Uuid,
    role: Role,
) -> Result<Account> {
    if actor.account_id == id {
        return Err(AppError::Validation("you cannot change your own role".into()));
    }
    existing(state, id).await?;
    let account = state
        .store
        .set_account_role(id, role)
        .await?
        .ok_or(AppError::NotFound("account"))?;
    state.store.delete_sessions_for(id).await?;
    tracing::info!(
        account_id = %id,
        role = role.code(),
        by = %actor.account_id,
        "role changed"
    );
    Ok(account)
}

pub async fn update_profile(
    state: &AppState,
    principal: &Principal,
    form: &ProfileForm,
) -> Result<Account> {
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    form.validate()?;
    let phone = form.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    state
        .store
        .update_profile(principal.account_id, full_name, phone)
        .await?
        .ok_or(AppError::NotFound("account"))
}
