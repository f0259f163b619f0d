use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    AccountStore, CandidateStore, CandidateUpdate, JobStore, NotificationStore, ReviewStore,
    StoreHealth, TransitionNote,
};
use crate::error::{AppError, Result};
use crate::models::{
    Account, Candidate, CandidateStatus, Job, NewAccount, NewCandidate, NewJob, NewNotification,
    NewReview, NewSession, Notification, Phase, Review, Role, Session, StatusHistoryEntry,
};

#[derive(Default)]
struct Tables {
    jobs: Vec<Job>,
    candidates: Vec<Candidate>,
    accounts: Vec<Account>,
    sessions: Vec<Session>,
    reviews: Vec<Review>,
    history: Vec<StatusHistoryEntry>,
    notifications: Vec<Notification>,
}

/// In-process store backing unit tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub fail_candidate_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.tables.lock().unwrap().sessions.clone()
    }

    pub fn candidate_count(&self) -> usize {
        self.tables.lock().unwrap().candidates.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: NewJob) -> Result<Job> {
        let mut tables = self.tables.lock().unwrap();
        if tables.jobs.iter().any(|j| j.job_key == job.job_key) {
            return Err(AppError::Duplicate("job key already in use".into()));
        }
        let now = Utc::now();
        let row = Job {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            department: job.department,
            requirements: job.requirements,
            benefits: job.benefits,
            contract_type: job.contract_type,
            work_model: job.work_model,
            location: job.location,
            seniority: job.seniority,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            openings: job.openings,
            job_key: job.job_key,
            active: true,
            created_by: job.created_by,
            created_at: now,
            updated_at: now,
        };
        tables.jobs.push(row.clone());
        Ok(row)
    }

    async fn list_jobs(&self, only_active: bool) -> Result<Vec<Job>> {
        let tables = self.tables.lock().unwrap();
        let mut jobs: Vec<Job> = tables
            .jobs
            .iter()
            .filter(|j| !only_active || j.active)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn job_by_key(&self, key: &str) -> Result<Option<Job>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|j| j.job_key == key).cloned())
    }

    async fn set_job_active(&self, id: Uuid, active: bool) -> Result<Option<Job>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter_mut().find(|j| j.id == id).map(|job| {
            job.active = active;
            job.updated_at = Utc::now();
            job.clone()
        }))
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn application_exists(&self, email: &str, job_id: Uuid) -> Result<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .candidates
            .iter()
            .any(|c| c.email == email && c.job_id == job_id))
    }

    async fn insert_candidate(&self, c: NewCandidate) -> Result<Candidate> {
        if self.fail_candidate_insert.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert refused".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables
            .candidates
            .iter()
            .any(|existing| existing.email == c.email && existing.job_id == c.job_id)
        {
            return Err(AppError::Duplicate(
                "you have already applied to this job".into(),
            ));
        }
        let row = Candidate {
            id: Uuid::new_v4(),
            job_id: c.job_id,
            account_id: c.account_id,
            full_name: c.full_name,
            email: c.email,
            phone: c.phone,
            birth_date: c.birth_date,
            city: c.city,
            state: c.state,
            country: c.country,
            education_level: c.education_level,
            course: c.course,
            institution: c.institution,
            graduation_year: c.graduation_year,
            experience_years: c.experience_years,
            current_role: c.current_role,
            current_company: c.current_company,
            expected_salary: c.expected_salary,
            skills: c.skills,
            linkedin: c.linkedin,
            github: c.github,
            portfolio: c.portfolio,
            motivation: c.motivation,
            availability: c.availability,
            resume_path: c.resume_path,
            cover_letter_path: c.cover_letter_path,
            tracking_token: c.tracking_token,
            ai_score: None,
            ai_analysis: None,
            status: CandidateStatus::Applied,
            phase: Phase::Application,
            case_enabled: false,
            case_path: None,
            case_deadline: None,
            case_score_avg: None,
            review_count: 0,
            case_approved: None,
            technical_interview_at: None,
            technical_feedback: None,
            technical_approved: None,
            partners_interview_at: None,
            partners_feedback: None,
            partners_approved: None,
            internal_notes: None,
            applied_at: c.applied_at,
            created_at: c.applied_at,
            updated_at: c.applied_at,
        };
        tables.candidates.push(row.clone());
        Ok(row)
    }

    async fn candidate_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn candidate_by_tracking_token(&self, token: &str) -> Result<Option<Candidate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .candidates
            .iter()
            .find(|c| c.tracking_token == token)
            .cloned())
    }

    async fn candidates_by_email(&self, email: &str) -> Result<Vec<Candidate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .candidates
            .iter()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn candidates_by_account(&self, account_id: Uuid) -> Result<Vec<Candidate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .candidates
            .iter()
            .filter(|c| c.account_id == Some(account_id))
            .cloned()
            .collect())
    }

    async fn list_candidates(&self, job_id: Option<Uuid>) -> Result<Vec<Candidate>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Candidate> = tables
            .candidates
            .iter()
            .filter(|c| job_id.map_or(true, |id| c.job_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(rows)
    }

    async fn candidates_in_status(&self, statuses: &[CandidateStatus]) -> Result<Vec<Candidate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .candidates
            .iter()
            .filter(|c| statuses.contains(&c.status))
            .cloned()
            .collect())
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        update: &CandidateUpdate,
        note: Option<TransitionNote>,
    ) -> Result<Option<Candidate>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(candidate) = tables.candidates.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let previous_status = candidate.status;
        let previous_phase = candidate.phase;

        if let Some(status) = update.status {
            candidate.status = status;
        }
        if let Some(phase) = update.phase {
            candidate.phase = phase;
        }
        if let Some(score) = update.ai_score {
            candidate.ai_score = Some(score);
        }
        if let Some(analysis) = &update.ai_analysis {
            candidate.ai_analysis = Some(analysis.clone());
        }
        if let Some(enabled) = update.case_enabled {
            candidate.case_enabled = enabled;
        }
        if let Some(deadline) = update.case_deadline {
            candidate.case_deadline = deadline;
        }
        if let Some(avg) = update.case_score_avg {
            candidate.case_score_avg = Some(avg);
        }
        if let Some(count) = update.review_count {
            candidate.review_count = count;
        }
        if let Some(approved) = update.case_approved {
            candidate.case_approved = Some(approved);
        }
        if let Some(at) = update.technical_interview_at {
            candidate.technical_interview_at = Some(at);
        }
        if let Some(at) = update.partners_interview_at {
            candidate.partners_interview_at = Some(at);
        }
        if let Some(notes) = &update.internal_notes {
            candidate.internal_notes = Some(notes.clone());
        }
        candidate.updated_at = Utc::now();
        let updated = candidate.clone();

        if let (Some(note), Some(status)) = (note, update.status) {
            tables.history.push(StatusHistoryEntry {
                id: Uuid::new_v4(),
                candidate_id: id,
                previous_status: Some(previous_status.code().to_string()),
                new_status: status.code().to_string(),
                previous_phase: Some(previous_phase.code().to_string()),
                new_phase: Some(updated.phase.code().to_string()),
                reason: Some(note.reason),
                actor_id: note.actor_id,
                created_at: note.at,
            });
        }
        Ok(Some(updated))
    }

    async fn status_history(&self, candidate_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<StatusHistoryEntry> = tables
            .history
            .iter()
            .filter(|h| h.candidate_id == candidate_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn recent_transitions(&self, limit: i64) -> Result<Vec<StatusHistoryEntry>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .history
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::Duplicate("email already registered".into()));
        }
        let row = Account {
            id: Uuid::new_v4(),
            email: account.email,
            full_name: account.full_name,
            phone: account.phone,
            password_hash: account.password_hash,
            role: account.role,
            active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        tables.accounts.push(row.clone());
        Ok(row)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let tables = self.tables.lock().unwrap();
        let mut accounts = tables.accounts.clone();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    async fn set_account_active(&self, id: Uuid, active: bool) -> Result<Option<Account>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter_mut().find(|a| a.id == id).map(|account| {
            account.active = active;
            account.clone()
        }))
    }

    async fn set_account_role(&self, id: Uuid, role: Role) -> Result<Option<Account>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter_mut().find(|a| a.id == id).map(|account| {
            account.role = role;
            account.clone()
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Account>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter_mut().find(|a| a.id == id).map(|account| {
            account.full_name = full_name.to_string();
            account.phone = phone.map(str::to_string);
            account.clone()
        }))
    }

    async fn record_login(&self, account_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.iter_mut().find(|a| a.id == account_id) {
            account.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn replace_session(&self, session: NewSession) -> Result<Session> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.retain(|s| s.account_id != session.account_id);
        let row = Session {
            id: Uuid::new_v4(),
            account_id: session.account_id,
            token_hash: session.token_hash,
            role: session.role,
            expires_at: session.expires_at,
            last_seen_at: Some(session.created_at),
            created_at: session.created_at,
        };
        tables.sessions.push(row.clone());
        Ok(row)
    }

    async fn session_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn touch_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(session) = tables.sessions.iter_mut().find(|s| s.token_hash == token_hash) {
            session.last_seen_at = Some(at);
        }
        Ok(())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.retain(|s| s.token_hash != token_hash);
        Ok(())
    }

    async fn delete_sessions_for(&self, account_id: Uuid) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables.sessions.retain(|s| s.account_id != account_id);
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let mut tables = self.tables.lock().unwrap();
        let row = Review {
            id: Uuid::new_v4(),
            candidate_id: review.candidate_id,
            reviewer_id: review.reviewer_id,
            job_id: review.job_id,
            technical_score: review.technical_score,
            soft_skills_score: review.soft_skills_score,
            experience_score: review.experience_score,
            case_score: review.case_score,
            final_score: review.final_score,
            technical_comments: review.technical_comments,
            soft_skills_comments: review.soft_skills_comments,
            experience_comments: review.experience_comments,
            case_comments: review.case_comments,
            general_comments: review.general_comments,
            recommend_approve: review.recommend_approve,
            recommend_interview: review.recommend_interview,
            suggested_seniority: review.suggested_seniority,
            phase_reviewed: review.phase_reviewed,
            created_at: review.created_at,
        };
        tables.reviews.push(row.clone());
        Ok(row)
    }

    async fn reviews_for(&self, candidate_id: Uuid) -> Result<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reviews
            .iter()
            .filter(|r| r.candidate_id == candidate_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn queue_notification(&self, n: NewNotification) -> Result<Notification> {
        let mut tables = self.tables.lock().unwrap();
        let row = Notification {
            id: Uuid::new_v4(),
            candidate_id: n.candidate_id,
            kind: n.kind,
            recipient: n.recipient,
            subject: n.subject,
            body: n.body,
            sent: false,
            sent_at: None,
            error: None,
            created_at: n.created_at,
        };
        tables.notifications.push(row.clone());
        Ok(row)
    }

    async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(n) = tables.notifications.iter_mut().find(|n| n.id == id) {
            n.sent = true;
            n.sent_at = Some(at);
            n.error = None;
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(n) = tables.notifications.iter_mut().find(|n| n.id == id) {
            n.sent = false;
            n.error = Some(error.to_string());
        }
        Ok(())
    }

    async fn notifications_for(&self, candidate_id: Uuid) -> Result<Vec<Notification>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.candidate_id == candidate_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
