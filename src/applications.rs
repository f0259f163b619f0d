use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Candidate, NewCandidate};
use crate::notify::NotificationEvent;
use crate::state::AppState;
use crate::status::{phase_label, StatusDisplay};
use crate::storage::{self, Upload};
use crate::store::{normalize_email, CandidateStore, JobStore};

const TRACKING_TOKEN_LEN: usize = 10;
const TRACKING_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ApplicationForm {
    pub full_name: Option<String>,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub education_level: Option<String>,
    pub course: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<String>,
    pub experience_years: Option<String>,
    pub current_role: Option<String>,
    pub current_company: Option<String>,
    pub expected_salary: Option<String>,
    pub skills: Option<String>,
    #[validate(url(message = "invalid linkedin url"))]
    pub linkedin: Option<String>,
    #[validate(url(message = "invalid github url"))]
    pub github: Option<String>,
    #[validate(url(message = "invalid portfolio url"))]
    pub portfolio: Option<String>,
    pub motivation: Option<String>,
    pub availability: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &Option<String>) -> Result<Option<T>> {
    present(value)
        .map(|raw| {
            raw.replace(',', ".")
                .parse::<T>()
                .map_err(|_| AppError::Validation(format!("{field} must be a number")))
        })
        .transpose()
}

impl ApplicationForm {
    /// Blank optional fields become `None`, so URL checks only see real input.
    fn normalized(&self) -> ApplicationForm {
        ApplicationForm {
            full_name: present(&self.full_name),
            email: present(&self.email).map(|e| normalize_email(&e)),
            phone: present(&self.phone),
            birth_date: present(&self.birth_date),
            city: present(&self.city),
            state: present(&self.state),
            country: present(&self.country),
            education_level: present(&self.education_level),
            course: present(&self.course),
            institution: present(&self.institution),
            graduation_year: present(&self.graduation_year),
            experience_years: present(&self.experience_years),
            current_role: present(&self.current_role),
            current_company: present(&self.current_company),
            expected_salary: present(&self.expected_salary),
            skills: present(&self.skills),
            linkedin: present(&self.linkedin),
            github: present(&self.github),
            portfolio: present(&self.portfolio),
            motivation: present(&self.motivation),
            availability: present(&self.availability),
        }
    }

    fn missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("birth_date", &self.birth_date),
            ("city", &self.city),
            ("state", &self.state),
            ("education_level", &self.education_level),
            ("experience_years", &self.experience_years),
            ("skills", &self.skills),
            ("motivation", &self.motivation),
            ("availability", &self.availability),
        ]
        .into_iter()
        .find(|(_, value)| value.is_none())
        .map(|(name, _)| name)
    }

    fn into_candidate(self, job_id: Uuid, account_id: Option<Uuid>) -> Result<NewCandidate> {
        let birth_date = self
            .birth_date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| AppError::Validation("birth_date must be YYYY-MM-DD".into()))
            })
            .transpose()?;
        Ok(NewCandidate {
            job_id,
            account_id,
            graduation_year: parse_number("graduation_year", &self.graduation_year)?,
            experience_years: parse_number("experience_years", &self.experience_years)?,
            expected_salary: parse_number("expected_salary", &self.expected_salary)?,
            birth_date,
            full_name: self.full_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            country: self.country.unwrap_or_else(|| "Brasil".to_string()),
            education_level: self.education_level,
            course: self.course,
            institution: self.institution,
            current_role: self.current_role,
            current_company: self.current_company,
            skills: self.skills,
            linkedin: self.linkedin,
            github: self.github,
            portfolio: self.portfolio,
            motivation: self.motivation,
            availability: self.availability,
            ..Default::default()
        })
    }
}

pub fn tracking_token() -> String {
    let mut rng = rand::rng();
    (0..TRACKING_TOKEN_LEN)
        .map(|_| TRACKING_ALPHABET[rng.random_range(0..TRACKING_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub form: ApplicationForm,
    pub resume: Option<Upload>,
    pub cover_letter: Option<Upload>,
    pub account_id: Option<Uuid>,
}

/// Validates and records an application for the job behind `job_key`.
///
/// Duplicate applications are refused before anything is uploaded. If the
/// insert fails after the documents were stored, they are removed again.
pub async fn submit(
    state: &AppState,
    job_key: &str,
    submission: Submission,
    now: DateTime<Utc>,
) -> Result<(Candidate, Option<JoinHandle<()>>)> {
    let form = submission.form.normalized();
    if let Some(field) = form.missing_field() {
        return Err(AppError::Validation(format!("required field: {field}")));
    }
    form.validate()?;
    let resume = submission
        .resume
        .ok_or_else(|| AppError::Validation("resume is required".into()))?;
    storage::validate_upload(&resume)?;
    if let Some(letter) = &submission.cover_letter {
        storage::validate_upload(letter)?;
    }

    let job = state
        .store
        .job_by_key(job_key)
        .await?
        .filter(|job| job.active)
        .ok_or(AppError::NotFound("job"))?;

    let email = form.email.clone().unwrap_or_default();
    if state.store.application_exists(&email, job.id).await? {
        return Err(AppError::Duplicate(
            "you have already applied to this job".into(),
        ));
    }

    let mut new_candidate = form.into_candidate(job.id, submission.account_id)?;

    let mut stored: Vec<String> = Vec::new();
    for upload in std::iter::once(&resume).chain(submission.cover_letter.as_ref()) {
        let path = storage::object_path(upload, now);
        let put = state
            .blobs
            .put(&path, &upload.data, storage::mime_type(&upload.file_name))
            .await;
        if let Err(err) = put {
            remove_documents(state, &stored).await;
            return Err(err);
        }
        stored.push(path);
    }
    let mut paths = stored.iter().cloned();
    new_candidate.resume_path = paths.next();
    new_candidate.cover_letter_path = paths.next();
    new_candidate.tracking_token = tracking_token();
    new_candidate.applied_at = now;

    let candidate = match state.store.insert_candidate(new_candidate).await {
        Ok(candidate) => candidate,
        Err(err) => {
            tracing::warn!(job_key, "application insert failed, removing uploaded documents");
            remove_documents(state, &stored).await;
            return Err(err);
        }
    };
    tracing::info!(candidate_id = %candidate.id, job_id = %job.id, "application received");

    let handle = state
        .notifier
        .dispatch(
            &candidate,
            &job.title,
            NotificationEvent::Confirmation {
                tracking_token: candidate.tracking_token.clone(),
                applied_at: candidate.applied_at,
            },
        )
        .await;
    Ok((candidate, handle))
}

async fn remove_documents(state: &AppState, paths: &[String]) {
    for path in paths {
        if let Err(err) = state.blobs.delete(path).await {
            tracing::error!(path, "could not remove orphaned document: {err}");
        }
    }
}

/// What a candidate sees about one of their applications.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub candidate_id: Uuid,
    pub tracking_token: String,
    pub full_name: String,
    pub job_title: String,
    pub status: StatusDisplay,
    pub phase: String,
    pub applied_at: DateTime<Utc>,
    pub case_deadline: Option<DateTime<Utc>>,
    pub technical_interview_at: Option<DateTime<Utc>>,
    pub partners_interview_at: Option<DateTime<Utc>>,
}

async fn views(state: &AppState, candidates: Vec<Candidate>) -> Result<Vec<ApplicationView>> {
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let job_title = state
            .store
            .job_by_id(candidate.job_id)
            .await?
            .map(|job| job.title)
            .unwrap_or_default();
        out.push(ApplicationView {
            candidate_id: candidate.id,
            tracking_token: candidate.tracking_token,
            full_name: candidate.full_name,
            job_title,
            status: candidate.status.into(),
            phase: phase_label(candidate.phase).to_string(),
            applied_at: candidate.applied_at,
            case_deadline: candidate.case_deadline,
            technical_interview_at: candidate.technical_interview_at,
            partners_interview_at: candidate.partners_interview_at,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

pub async fn lookup(state: &AppState, query: &LookupQuery) -> Result<Vec<ApplicationView>> {
    let candidates = match (present(&query.token), present(&query.email)) {
        (Some(token), _) => state
            .store
            .candidate_by_tracking_token(&token.to_uppercase())
            .await?
            .into_iter()
            .collect(),
        (None, Some(email)) => state.store.candidates_by_email(&normalize_email(&email)).await?,
        (None, None) => {
            return Err(AppError::Validation("token or email is required".into()));
        }
    };
    views(state, candidates).await
}

/// Applications linked to the account, plus older ones sent with its email.
pub async fn for_account(
    state: &AppState,
    account_id: Uuid,
    email: &str,
) -> Result<Vec<ApplicationView>> {
    let mut candidates = state.store.candidates_by_account(account_id).await?;
    for candidate in state.store.candidates_by_email(&normalize_email(email)).await? {
        if !candidates.iter().any(|c| c.id == candidate.id) {
            candidates.push(candidate);
        }
    }
    candidates.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
    views(state, candidates).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::models::{CandidateStatus, Phase};
    use crate::storage::DocumentKind;
    use crate::store::NotificationStore;
    use crate::testing::{harness, sample_job};

    fn form(email: &str) -> ApplicationForm {
        ApplicationForm {
            full_name: Some("Diego Alves".into()),
            email: Some(email.into()),
            phone: Some("+55 21 98888-1111".into()),
            birth_date: Some("1998-07-01".into()),
            city: Some("Rio de Janeiro".into()),
            state: Some("RJ".into()),
            education_level: Some("superior".into()),
            experience_years: Some("3".into()),
            skills: Some("Rust, Go".into()),
            motivation: Some("Quero crescer".into()),
            availability: Some("30 dias".into()),
            linkedin: Some("".into()),
            ..Default::default()
        }
    }

    fn resume() -> Upload {
        Upload {
            kind: DocumentKind::Resume,
            file_name: "cv diego.pdf".into(),
            data: b"%PDF-1.7".to_vec(),
        }
    }

    fn submission(email: &str) -> Submission {
        Submission {
            form: form(email),
            resume: Some(resume()),
            cover_letter: None,
            account_id: None,
        }
    }

    #[tokio::test]
    async fn accepted_application_starts_in_inscrito() {
        let h = harness();
        let job = sample_job(&h.store).await;

        let (candidate, handle) =
            submit(&h.state, &job.job_key, submission("Diego@Example.com"), Utc::now())
                .await
                .unwrap();
        handle.unwrap().await.unwrap();

        assert_eq!(candidate.status, CandidateStatus::Applied);
        assert_eq!(candidate.phase, Phase::Application);
        assert_eq!(candidate.email, "diego@example.com");
        assert_eq!(candidate.country, "Brasil");
        assert_eq!(candidate.tracking_token.len(), 10);
        assert!(candidate.linkedin.is_none());
        let path = candidate.resume_path.unwrap();
        assert!(path.starts_with("candidatos/"));
        assert!(path.ends_with("_curriculo_cv_diego.pdf"));
        assert_eq!(h.blobs.paths(), vec![path]);

        let rows = h.store.notifications_for(candidate.id).await.unwrap();
        assert_eq!(rows[0].kind, "confirmacao");
        assert!(rows[0].body.contains(&candidate.tracking_token));
    }

    #[tokio::test]
    async fn duplicate_is_rejected_before_upload() {
        let h = harness();
        let job = sample_job(&h.store).await;
        submit(&h.state, &job.job_key, submission("diego@example.com"), Utc::now())
            .await
            .unwrap();
        assert_eq!(h.blobs.put_count(), 1);

        let err = submit(&h.state, &job.job_key, submission("diego@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
        assert_eq!(h.blobs.put_count(), 1);
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_documents() {
        let h = harness();
        let job = sample_job(&h.store).await;
        h.store.fail_candidate_insert.store(true, Ordering::SeqCst);

        let mut with_letter = submission("diego@example.com");
        with_letter.cover_letter = Some(Upload {
            kind: DocumentKind::CoverLetter,
            file_name: "carta.docx".into(),
            data: b"docx".to_vec(),
        });
        assert!(submit(&h.state, &job.job_key, with_letter, Utc::now()).await.is_err());
        assert_eq!(h.blobs.put_count(), 2);
        assert!(h.blobs.paths().is_empty());
        assert_eq!(h.store.candidate_count(), 0);
    }

    #[tokio::test]
    async fn failed_letter_upload_removes_the_stored_resume() {
        let h = harness();
        let job = sample_job(&h.store).await;
        h.blobs.fail_from_put(2);

        let mut with_letter = submission("diego@example.com");
        with_letter.cover_letter = Some(Upload {
            kind: DocumentKind::CoverLetter,
            file_name: "carta.pdf".into(),
            data: b"%PDF-1.4".to_vec(),
        });
        let err = submit(&h.state, &job.job_key, with_letter, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { service: "storage", .. }));
        assert_eq!(h.blobs.put_count(), 2);
        assert!(h.blobs.paths().is_empty());
        assert_eq!(h.store.candidate_count(), 0);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_and_inactive_jobs_are_refused() {
        let h = harness();
        let job = sample_job(&h.store).await;

        let mut incomplete = submission("diego@example.com");
        incomplete.form.skills = Some("   ".into());
        let err = submit(&h.state, &job.job_key, incomplete, Utc::now()).await.unwrap_err();
        assert_eq!(err.public_message(), "required field: skills");

        let mut no_resume = submission("diego@example.com");
        no_resume.resume = None;
        assert!(matches!(
            submit(&h.state, &job.job_key, no_resume, Utc::now()).await,
            Err(AppError::Validation(_))
        ));

        h.store.set_job_active(job.id, false).await.unwrap();
        let err = submit(&h.state, &job.job_key, submission("diego@example.com"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("job")));
        assert_eq!(h.blobs.put_count(), 0);
    }

    #[tokio::test]
    async fn lookup_by_token_or_email() {
        let h = harness();
        let job = sample_job(&h.store).await;
        let (candidate, _) =
            submit(&h.state, &job.job_key, submission("diego@example.com"), Utc::now())
                .await
                .unwrap();

        let by_token = lookup(
            &h.state,
            &LookupQuery {
                token: Some(candidate.tracking_token.to_lowercase()),
                email: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(by_token.len(), 1);
        assert_eq!(by_token[0].status.candidate_label, "Inscrito");
        assert_eq!(by_token[0].job_title, job.title);

        let by_email = lookup(
            &h.state,
            &LookupQuery {
                token: None,
                email: Some(" DIEGO@example.com ".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(by_email.len(), 1);

        assert!(lookup(&h.state, &LookupQuery::default()).await.is_err());
    }

    #[test]
    fn tracking_tokens_avoid_ambiguous_characters() {
        let token = tracking_token();
        assert_eq!(token.len(), 10);
        assert!(!token.contains(['0', 'O', '1', 'I']));
    }
}
