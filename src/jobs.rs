use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Job, NewJob};
use crate::state::AppState;
use crate::store::JobStore;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Public link key: `<base36 millis>-<6 random base36 chars>`.
pub fn job_key(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{suffix}", to_base36(now.timestamp_millis().max(0) as u64))
}

fn check(job: &NewJob) -> Result<()> {
    if job.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    if job.openings < 1 {
        return Err(AppError::Validation("openings must be at least 1".into()));
    }
    if let (Some(min), Some(max)) = (job.salary_min, job.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".into(),
            ));
        }
    }
    Ok(())
}

pub async fn create(
    state: &AppState,
    mut job: NewJob,
    created_by: Uuid,
    now: DateTime<Utc>,
) -> Result<Job> {
    check(&job)?;
    job.title = job.title.trim().to_string();
    job.job_key = job_key(now);
    job.created_by = Some(created_by);
    let job = state.store.create_job(job).await?;
    tracing::info!(job_id = %job.id, job_key = %job.job_key, "job created");
    Ok(job)
}

pub async fn public_by_key(state: &AppState, key: &str) -> Result<Job> {
    state
        .store
        .job_by_key(key)
        .await?
        .filter(|job| job.active)
        .ok_or(AppError::NotFound("job"))
}

pub async fn toggle(state: &AppState, id: Uuid) -> Result<Job> {
    let job = state
        .store
        .job_by_id(id)
        .await?
        .ok_or(AppError::NotFound("job"))?;
    let job = state
        .store
        .set_job_active(id, !job.active)
        .await?
        .ok_or(AppError::NotFound("job"))?;
    tracing::info!(job_id = %job.id, active = job.active, "job toggled");
    Ok(job)
}
