use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Account, Candidate, CandidateStatus, Job, NewAccount, NewCandidate, NewJob, NewNotification,
    NewReview, NewSession, Notification, Phase, Review, Role, Session, StatusHistoryEntry,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Partial update of a candidate row. `None` leaves a column untouched; the
/// doubly optional deadline can also be cleared with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct CandidateUpdate {
    pub status: Option<CandidateStatus>,
    pub phase: Option<Phase>,
    pub ai_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
    pub case_enabled: Option<bool>,
    pub case_deadline: Option<Option<DateTime<Utc>>>,
    pub case_score_avg: Option<f64>,
    pub review_count: Option<i32>,
    pub case_approved: Option<bool>,
    pub technical_interview_at: Option<DateTime<Utc>>,
    pub partners_interview_at: Option<DateTime<Utc>>,
    pub internal_notes: Option<String>,
}

/// Why a status moved; stored in the candidate's history.
#[derive(Debug, Clone)]
pub struct TransitionNote {
    pub reason: String,
    pub actor_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: NewJob) -> Result<Job>;
    async fn list_jobs(&self, only_active: bool) -> Result<Vec<Job>>;
    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>>;
    async fn job_by_key(&self, key: &str) -> Result<Option<Job>>;
    async fn set_job_active(&self, id: Uuid, active: bool) -> Result<Option<Job>>;
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn application_exists(&self, email: &str, job_id: Uuid) -> Result<bool>;
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;
    async fn candidate_by_id(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn candidate_by_tracking_token(&self, token: &str) -> Result<Option<Candidate>>;
    async fn candidates_by_email(&self, email: &str) -> Result<Vec<Candidate>>;
    async fn candidates_by_account(&self, account_id: Uuid) -> Result<Vec<Candidate>>;
    async fn list_candidates(&self, job_id: Option<Uuid>) -> Result<Vec<Candidate>>;
    async fn candidates_in_status(&self, statuses: &[CandidateStatus]) -> Result<Vec<Candidate>>;
    /// Applies `update` and, when the status changes and a note is given,
    /// appends a history row in the same unit of work.
    async fn update_candidate(
        &self,
        id: Uuid,
        update: &CandidateUpdate,
        note: Option<TransitionNote>,
    ) -> Result<Option<Candidate>>;
    async fn status_history(&self, candidate_id: Uuid) -> Result<Vec<StatusHistoryEntry>>;
    async fn recent_transitions(&self, limit: i64) -> Result<Vec<StatusHistoryEntry>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>>;
    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn insert_account(&self, account: NewAccount) -> Result<Account>;
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn set_account_active(&self, id: Uuid, active: bool) -> Result<Option<Account>>;
    async fn set_account_role(&self, id: Uuid, role: Role) -> Result<Option<Account>>;
    async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Account>>;
    async fn record_login(&self, account_id: Uuid, at: DateTime<Utc>) -> Result<()>;
    /// Drops every existing session of the account and stores the new one
    /// atomically.
    async fn replace_session(&self, session: NewSession) -> Result<Session>;
    async fn session_by_hash(&self, token_hash: &str) -> Result<Option<Session>>;
    async fn touch_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()>;
    async fn delete_session(&self, token_hash: &str) -> Result<()>;
    async fn delete_sessions_for(&self, account_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: NewReview) -> Result<Review>;
    async fn reviews_for(&self, candidate_id: Uuid) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn queue_notification(&self, notification: NewNotification) -> Result<Notification>;
    async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;
    async fn notifications_for(&self, candidate_id: Uuid) -> Result<Vec<Notification>>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<()>;
}

pub trait Store:
    JobStore + CandidateStore + AccountStore + ReviewStore + NotificationStore + StoreHealth
{
}

impl<T> Store for T where
    T: JobStore + CandidateStore + AccountStore + ReviewStore + NotificationStore + StoreHealth
{
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
