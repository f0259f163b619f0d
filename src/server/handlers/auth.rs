use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use crate::auth::{Credentials, IssuedSession, Principal, SignupForm};
use crate::error::Result;
use crate::models::Role;
use crate::server::authn::{cleared_session, session_cookie, session_token};
use crate::state::AppState;

fn issue(session: IssuedSession) -> (CookieJar, Json<IssuedSession>) {
    let jar = CookieJar::new().add(session_cookie(session.token.clone()));
    (jar, Json(session))
}

pub async fn staff_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<IssuedSession>)> {
    let session = state
        .auth
        .authenticate(&credentials, &Role::STAFF, Utc::now())
        .await?;
    tracing::info!(account_id = %session.principal.account_id, "staff logged in");
    Ok(issue(session))
}

pub async fn candidate_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Json<IssuedSession>)> {
    let session = state
        .auth
        .authenticate(&credentials, &[Role::Candidate], Utc::now())
        .await?;
    Ok(issue(session))
}

pub async fn candidate_signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<(StatusCode, CookieJar, Json<IssuedSession>)> {
    let session = state.auth.signup_candidate(&form, Utc::now()).await?;
    let (jar, body) = issue(session);
    Ok((StatusCode::CREATED, jar, body))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Arc<Principal>>,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await?;
    }
    tracing::info!("User {} logged out successfully", principal.email);
    Ok((cleared_session(CookieJar::from_headers(&headers)), StatusCode::NO_CONTENT))
}

pub async fn me(Extension(principal): Extension<Arc<Principal>>) -> Json<Principal> {
    Json(principal.as_ref().clone())
}
