use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::authn;
use super::handlers::{
    accounts, applications, auth, candidates, dashboard, jobs, probes, reviews,
};
use crate::state::AppState;
use crate::storage::MAX_UPLOAD_BYTES;

/// Resume and cover letter plus the text fields.
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES + 256 * 1024;

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/candidate/applications", get(applications::mine))
        .route("/candidate/profile", put(accounts::update_profile))
        .route("/accounts", get(accounts::list))
        .route("/accounts/{id}/toggle", post(accounts::toggle))
        .route("/accounts/{id}/role", post(accounts::change_role))
        .route("/jobs", get(jobs::list).post(jobs::create))
        .route("/jobs/{id}/toggle", post(jobs::toggle))
        .route("/applications", get(applications::list))
        .route("/candidates/{id}", get(candidates::detail))
        .route("/candidates/{id}/status", post(candidates::change_status))
        .route("/candidates/{id}/interview", post(candidates::schedule_interview))
        .route("/ai/evaluate", post(candidates::evaluate))
        .route("/notifications/send", post(candidates::send_notification))
        .route("/reviews/queue", get(reviews::queue))
        .route("/reviews", post(reviews::submit))
        .route("/dashboard", get(dashboard::counts))
        .layer(from_fn_with_state(state.clone(), authn::authenticate))
        .route("/auth/staff/login", post(auth::staff_login))
        .route("/auth/candidate/login", post(auth::candidate_login))
        .route("/auth/candidate/signup", post(auth::candidate_signup))
        .route("/jobs/public", get(jobs::public_list))
        .route("/jobs/public/{key}", get(jobs::public_get))
        .route(
            "/applications/{job_key}",
            post(applications::submit).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/applications/lookup", get(applications::lookup))
        .route("/healthz", get(probes::healthz))
        .route("/livez", get(probes::livez))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
