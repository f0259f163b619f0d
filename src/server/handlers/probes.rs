use axum::extract::State;

use crate::error::Result;
use crate::state::AppState;
use crate::store::StoreHealth;

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

pub async fn healthz(State(state): State<AppState>) -> Result<()> {
    state.store.ping().await?;
    tracing::debug!("service is healthy");
    Ok(())
}
