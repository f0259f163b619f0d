use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
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

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Duplicate(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self, job: NewJob) -> Result<Job> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO recruitment.jobs
            (id, title, description, department, requirements, benefits, contract_type,
             work_model, location, seniority, salary_min, salary_max, openings, job_key,
             created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.department)
        .bind(&job.requirements)
        .bind(&job.benefits)
        .bind(&job.contract_type)
        .bind(&job.work_model)
        .bind(&job.location)
        .bind(&job.seniority)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(job.openings)
        .bind(&job.job_key)
        .bind(job.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "job key already in use"))?;
        Ok(row)
    }

    async fn list_jobs(&self, only_active: bool) -> Result<Vec<Job>> {
        let query = if only_active {
            "SELECT * FROM recruitment.jobs WHERE active ORDER BY created_at DESC"
        } else {
            "SELECT * FROM recruitment.jobs ORDER BY created_at DESC"
        };
        Ok(sqlx::query_as::<_, Job>(query).fetch_all(&self.pool).await?)
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(
            sqlx::query_as::<_, Job>("SELECT * FROM recruitment.jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn job_by_key(&self, key: &str) -> Result<Option<Job>> {
        Ok(
            sqlx::query_as::<_, Job>("SELECT * FROM recruitment.jobs WHERE job_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set_job_active(&self, id: Uuid, active: bool) -> Result<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            "UPDATE recruitment.jobs SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl CandidateStore for PgStore {
    async fn application_exists(&self, email: &str, job_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM recruitment.candidates WHERE email = $1 AND job_id = $2) AS found",
        )
        .bind(email)
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("found"))
    }

    async fn insert_candidate(&self, c: NewCandidate) -> Result<Candidate> {
        let row = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO recruitment.candidates
            (id, job_id, account_id, full_name, email, phone, birth_date, city, state, country,
             education_level, course, institution, graduation_year, experience_years,
             "current_role", current_company, expected_salary, skills, linkedin, github,
             portfolio, motivation, availability, resume_path, cover_letter_path,
             tracking_token, status, phase, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(c.job_id)
        .bind(c.account_id)
        .bind(&c.full_name)
        .bind(&c.email)
        .bind(&c.phone)
        .bind(c.birth_date)
        .bind(&c.city)
        .bind(&c.state)
        .bind(&c.country)
        .bind(&c.education_level)
        .bind(&c.course)
        .bind(&c.institution)
        .bind(c.graduation_year)
        .bind(c.experience_years)
        .bind(&c.current_role)
        .bind(&c.current_company)
        .bind(c.expected_salary)
        .bind(&c.skills)
        .bind(&c.linkedin)
        .bind(&c.github)
        .bind(&c.portfolio)
        .bind(&c.motivation)
        .bind(&c.availability)
        .bind(&c.resume_path)
        .bind(&c.cover_letter_path)
        .bind(&c.tracking_token)
        .bind(CandidateStatus::Applied.code())
        .bind(Phase::Application.code())
        .bind(c.applied_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "you have already applied to this job"))?;
        Ok(row)
    }

    async fn candidate_by_id(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(
            sqlx::query_as::<_, Candidate>("SELECT * FROM recruitment.candidates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn candidate_by_tracking_token(&self, token: &str) -> Result<Option<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            "SELECT * FROM recruitment.candidates WHERE tracking_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn candidates_by_email(&self, email: &str) -> Result<Vec<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            "SELECT * FROM recruitment.candidates WHERE email = $1 ORDER BY applied_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn candidates_by_account(&self, account_id: Uuid) -> Result<Vec<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            "SELECT * FROM recruitment.candidates WHERE account_id = $1 ORDER BY applied_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_candidates(&self, job_id: Option<Uuid>) -> Result<Vec<Candidate>> {
        let mut query = String::from("SELECT * FROM recruitment.candidates");
        if job_id.is_some() {
            query.push_str(" WHERE job_id = $1");
        }
        query.push_str(" ORDER BY applied_at DESC");

        let mut rows = sqlx::query_as::<_, Candidate>(&query);
        if let Some(value) = job_id {
            rows = rows.bind(value);
        }
        Ok(rows.fetch_all(&self.pool).await?)
    }

    async fn candidates_in_status(&self, statuses: &[CandidateStatus]) -> Result<Vec<Candidate>> {
        let codes: Vec<String> = statuses.iter().map(|s| s.code().to_string()).collect();
        Ok(sqlx::query_as::<_, Candidate>(
            "SELECT * FROM recruitment.candidates WHERE status = ANY($1) ORDER BY applied_at ASC",
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        update: &CandidateUpdate,
        note: Option<TransitionNote>,
    ) -> Result<Option<Candidate>> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query(
            "SELECT status, phase FROM recruitment.candidates WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };
        let previous_status: String = previous.get("status");
        let previous_phase: String = previous.get("phase");

        let mut qb = QueryBuilder::<Postgres>::new(
            "UPDATE recruitment.candidates SET updated_at = NOW()",
        );
        if let Some(status) = update.status {
            qb.push(", status = ").push_bind(status.code());
        }
        if let Some(phase) = update.phase {
            qb.push(", phase = ").push_bind(phase.code());
        }
        if let Some(score) = update.ai_score {
            qb.push(", ai_score = ").push_bind(score);
        }
        if let Some(analysis) = &update.ai_analysis {
            qb.push(", ai_analysis = ").push_bind(analysis.clone());
        }
        if let Some(enabled) = update.case_enabled {
            qb.push(", case_enabled = ").push_bind(enabled);
        }
        if let Some(deadline) = update.case_deadline {
            qb.push(", case_deadline = ").push_bind(deadline);
        }
        if let Some(avg) = update.case_score_avg {
            qb.push(", case_score_avg = ").push_bind(avg);
        }
        if let Some(count) = update.review_count {
            qb.push(", review_count = ").push_bind(count);
        }
        if let Some(approved) = update.case_approved {
            qb.push(", case_approved = ").push_bind(approved);
        }
        if let Some(at) = update.technical_interview_at {
            qb.push(", technical_interview_at = ").push_bind(at);
        }
        if let Some(at) = update.partners_interview_at {
            qb.push(", partners_interview_at = ").push_bind(at);
        }
        if let Some(notes) = &update.internal_notes {
            qb.push(", internal_notes = ").push_bind(notes.clone());
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let candidate = qb
            .build_query_as::<Candidate>()
            .fetch_one(&mut *tx)
            .await?;

        if let (Some(note), Some(status)) = (note, update.status) {
            sqlx::query(
                r#"
                INSERT INTO recruitment.status_history
                (id, candidate_id, previous_status, new_status, previous_phase, new_phase,
                 reason, actor_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(previous_status)
            .bind(status.code())
            .bind(previous_phase)
            .bind(candidate.phase.code())
            .bind(note.reason)
            .bind(note.actor_id)
            .bind(note.at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(candidate))
    }

    async fn status_history(&self, candidate_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        Ok(sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT * FROM recruitment.status_history WHERE candidate_id = $1 ORDER BY created_at DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn recent_transitions(&self, limit: i64) -> Result<Vec<StatusHistoryEntry>> {
        Ok(sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT * FROM recruitment.status_history ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn account_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(
            sqlx::query_as::<_, Account>("SELECT * FROM recruitment.accounts WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(
            sqlx::query_as::<_, Account>("SELECT * FROM recruitment.accounts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let row = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO recruitment.accounts (id, email, full_name, phone, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.phone)
        .bind(&account.password_hash)
        .bind(account.role.code())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "email already registered"))?;
        Ok(row)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "SELECT * FROM recruitment.accounts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_account_active(&self, id: Uuid, active: bool) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "UPDATE recruitment.accounts SET active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_account_role(&self, id: Uuid, role: Role) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "UPDATE recruitment.accounts SET role = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role.code())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "UPDATE recruitment.accounts SET full_name = $2, phone = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn record_login(&self, account_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE recruitment.accounts SET last_login_at = $2 WHERE id = $1")
            .bind(account_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_session(&self, session: NewSession) -> Result<Session> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM recruitment.sessions WHERE account_id = $1")
            .bind(session.account_id)
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO recruitment.sessions
            (id, account_id, token_hash, role, expires_at, last_seen_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session.account_id)
        .bind(&session.token_hash)
        .bind(session.role.code())
        .bind(session.expires_at)
        .bind(session.created_at)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn session_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        Ok(sqlx::query_as::<_, Session>(
            "SELECT * FROM recruitment.sessions WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn touch_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE recruitment.sessions SET last_seen_at = $2 WHERE token_hash = $1")
            .bind(token_hash)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM recruitment.sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_sessions_for(&self, account_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM recruitment.sessions WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO recruitment.reviews
            (id, candidate_id, reviewer_id, job_id, technical_score, soft_skills_score,
             experience_score, case_score, final_score, technical_comments,
             soft_skills_comments, experience_comments, case_comments, general_comments,
             recommend_approve, recommend_interview, suggested_seniority, phase_reviewed,
             created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.candidate_id)
        .bind(review.reviewer_id)
        .bind(review.job_id)
        .bind(review.technical_score)
        .bind(review.soft_skills_score)
        .bind(review.experience_score)
        .bind(review.case_score)
        .bind(review.final_score)
        .bind(&review.technical_comments)
        .bind(&review.soft_skills_comments)
        .bind(&review.experience_comments)
        .bind(&review.case_comments)
        .bind(&review.general_comments)
        .bind(review.recommend_approve)
        .bind(review.recommend_interview)
        .bind(&review.suggested_seniority)
        .bind(review.phase_reviewed.code())
        .bind(review.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn reviews_for(&self, candidate_id: Uuid) -> Result<Vec<Review>> {
        Ok(sqlx::query_as::<_, Review>(
            "SELECT * FROM recruitment.reviews WHERE candidate_id = $1 ORDER BY created_at ASC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn queue_notification(&self, n: NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO recruitment.notifications
            (id, candidate_id, kind, recipient, subject, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(n.candidate_id)
        .bind(&n.kind)
        .bind(&n.recipient)
        .bind(&n.subject)
        .bind(&n.body)
        .bind(n.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE recruitment.notifications SET sent = TRUE, sent_at = $2, error = NULL WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query("UPDATE recruitment.notifications SET sent = FALSE, error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn notifications_for(&self, candidate_id: Uuid) -> Result<Vec<Notification>> {
        Ok(sqlx::query_as::<_, Notification>(
            "SELECT * FROM recruitment.notifications WHERE candidate_id = $1 ORDER BY created_at ASC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
