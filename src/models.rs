use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raised when a stored or submitted code does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: String,
}

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.code)
    }
}

impl std::error::Error for UnknownCode {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateStatus {
    #[serde(rename = "inscrito")]
    Applied,
    #[serde(rename = "em_avaliacao_ia")]
    AiReview,
    #[serde(rename = "reprovado_ia")]
    AiRejected,
    #[serde(rename = "case_enviado")]
    CaseSent,
    #[serde(rename = "em_avaliacao_case")]
    CaseReview,
    #[serde(rename = "aprovado_case")]
    CaseApproved,
    #[serde(rename = "reprovado_case")]
    CaseRejected,
    #[serde(rename = "entrevista_tecnica")]
    TechnicalInterview,
    #[serde(rename = "entrevista_socios")]
    PartnersInterview,
    #[serde(rename = "aprovado")]
    Approved,
    #[serde(rename = "reprovado")]
    Rejected,
    #[serde(rename = "contratado")]
    Hired,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 12] = [
        CandidateStatus::Applied,
        CandidateStatus::AiReview,
        CandidateStatus::AiRejected,
        CandidateStatus::CaseSent,
        CandidateStatus::CaseReview,
        CandidateStatus::CaseApproved,
        CandidateStatus::CaseRejected,
        CandidateStatus::TechnicalInterview,
        CandidateStatus::PartnersInterview,
        CandidateStatus::Approved,
        CandidateStatus::Rejected,
        CandidateStatus::Hired,
    ];

    pub fn code(self) -> &'static str {
        match self {
            CandidateStatus::Applied => "inscrito",
            CandidateStatus::AiReview => "em_avaliacao_ia",
            CandidateStatus::AiRejected => "reprovado_ia",
            CandidateStatus::CaseSent => "case_enviado",
            CandidateStatus::CaseReview => "em_avaliacao_case",
            CandidateStatus::CaseApproved => "aprovado_case",
            CandidateStatus::CaseRejected => "reprovado_case",
            CandidateStatus::TechnicalInterview => "entrevista_tecnica",
            CandidateStatus::PartnersInterview => "entrevista_socios",
            CandidateStatus::Approved => "aprovado",
            CandidateStatus::Rejected => "reprovado",
            CandidateStatus::Hired => "contratado",
        }
    }

    /// Phase a candidate moves to alongside this status. `None` means the
    /// candidate stays in whatever phase they were in (rejections).
    pub fn phase(self) -> Option<Phase> {
        match self {
            CandidateStatus::Applied => Some(Phase::Application),
            CandidateStatus::AiReview => Some(Phase::AiReview),
            CandidateStatus::CaseSent => Some(Phase::Case),
            CandidateStatus::CaseReview => Some(Phase::CaseReview),
            CandidateStatus::CaseApproved | CandidateStatus::TechnicalInterview => {
                Some(Phase::TechnicalInterview)
            }
            CandidateStatus::PartnersInterview => Some(Phase::PartnersInterview),
            CandidateStatus::Approved | CandidateStatus::Hired => Some(Phase::Hiring),
            CandidateStatus::AiRejected
            | CandidateStatus::CaseRejected
            | CandidateStatus::Rejected => None,
        }
    }

    pub fn is_rejection(self) -> bool {
        matches!(
            self,
            CandidateStatus::AiRejected | CandidateStatus::CaseRejected | CandidateStatus::Rejected
        )
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CandidateStatus {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStatus::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| UnknownCode {
                kind: "candidate status",
                code: s.to_string(),
            })
    }
}

impl TryFrom<String> for CandidateStatus {
    type Error = UnknownCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "inscricao")]
    Application,
    #[serde(rename = "avaliacao_ia")]
    AiReview,
    #[serde(rename = "case_pratico")]
    Case,
    #[serde(rename = "avaliacao_case")]
    CaseReview,
    #[serde(rename = "entrevista_tecnica")]
    TechnicalInterview,
    #[serde(rename = "entrevista_socios")]
    PartnersInterview,
    #[serde(rename = "contratacao")]
    Hiring,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Application,
        Phase::AiReview,
        Phase::Case,
        Phase::CaseReview,
        Phase::TechnicalInterview,
        Phase::PartnersInterview,
        Phase::Hiring,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Phase::Application => "inscricao",
            Phase::AiReview => "avaliacao_ia",
            Phase::Case => "case_pratico",
            Phase::CaseReview => "avaliacao_case",
            Phase::TechnicalInterview => "entrevista_tecnica",
            Phase::PartnersInterview => "entrevista_socios",
            Phase::Hiring => "contratacao",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Phase {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.code() == s)
            .ok_or_else(|| UnknownCode {
                kind: "phase",
                code: s.to_string(),
            })
    }
}

impl TryFrom<String> for Phase {
    type Error = UnknownCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "avaliador")]
    Evaluator,
    #[serde(rename = "candidato")]
    Candidate,
}

impl Role {
    pub const STAFF: [Role; 2] = [Role::Admin, Role::Evaluator];

    pub fn code(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Evaluator => "avaliador",
            Role::Candidate => "candidato",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "avaliador" => Ok(Role::Evaluator),
            "candidato" => Ok(Role::Candidate),
            other => Err(UnknownCode {
                kind: "role",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub contract_type: Option<String>,
    pub work_model: Option<String>,
    pub location: Option<String>,
    pub seniority: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub openings: i32,
    pub job_key: String,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub contract_type: Option<String>,
    pub work_model: Option<String>,
    pub location: Option<String>,
    pub seniority: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    #[serde(default = "default_openings")]
    pub openings: i32,
    #[serde(skip)]
    pub job_key: String,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

fn default_openings() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub job_id: Uuid,
    pub account_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub education_level: Option<String>,
    pub course: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<i32>,
    pub experience_years: Option<i32>,
    pub current_role: Option<String>,
    pub current_company: Option<String>,
    pub expected_salary: Option<f64>,
    pub skills: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub motivation: Option<String>,
    pub availability: Option<String>,
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
    pub tracking_token: String,
    pub ai_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
    #[sqlx(try_from = "String")]
    pub status: CandidateStatus,
    #[sqlx(try_from = "String")]
    pub phase: Phase,
    pub case_enabled: bool,
    pub case_path: Option<String>,
    pub case_deadline: Option<DateTime<Utc>>,
    pub case_score_avg: Option<f64>,
    pub review_count: i32,
    pub case_approved: Option<bool>,
    pub technical_interview_at: Option<DateTime<Utc>>,
    pub technical_feedback: Option<String>,
    pub technical_approved: Option<bool>,
    pub partners_interview_at: Option<DateTime<Utc>>,
    pub partners_feedback: Option<String>,
    pub partners_approved: Option<bool>,
    pub internal_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub job_id: Uuid,
    pub account_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub education_level: Option<String>,
    pub course: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<i32>,
    pub experience_years: Option<i32>,
    pub current_role: Option<String>,
    pub current_company: Option<String>,
    pub expected_salary: Option<f64>,
    pub skills: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub motivation: Option<String>,
    pub availability: Option<String>,
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
    pub tracking_token: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewStage {
    #[serde(rename = "tecnica")]
    Technical,
    #[serde(rename = "socios")]
    Partners,
}

impl InterviewStage {
    pub fn status(self) -> CandidateStatus {
        match self {
            InterviewStage::Technical => CandidateStatus::TechnicalInterview,
            InterviewStage::Partners => CandidateStatus::PartnersInterview,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InterviewStage::Technical => "Entrevista Técnica",
            InterviewStage::Partners => "Entrevista com Sócios",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub reviewer_id: Uuid,
    pub job_id: Uuid,
    pub technical_score: Option<f64>,
    pub soft_skills_score: Option<f64>,
    pub experience_score: Option<f64>,
    pub case_score: Option<f64>,
    pub final_score: Option<f64>,
    pub technical_comments: Option<String>,
    pub soft_skills_comments: Option<String>,
    pub experience_comments: Option<String>,
    pub case_comments: Option<String>,
    pub general_comments: Option<String>,
    pub recommend_approve: bool,
    pub recommend_interview: bool,
    pub suggested_seniority: Option<String>,
    #[sqlx(try_from = "String")]
    pub phase_reviewed: Phase,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Score that feeds the candidate's case average.
    pub fn effective_case_score(&self) -> Option<f64> {
        self.case_score.or(self.final_score)
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub candidate_id: Uuid,
    pub reviewer_id: Uuid,
    pub job_id: Uuid,
    pub technical_score: Option<f64>,
    pub soft_skills_score: Option<f64>,
    pub experience_score: Option<f64>,
    pub case_score: Option<f64>,
    pub final_score: Option<f64>,
    pub technical_comments: Option<String>,
    pub soft_skills_comments: Option<String>,
    pub experience_comments: Option<String>,
    pub case_comments: Option<String>,
    pub general_comments: Option<String>,
    pub recommend_approve: bool,
    pub recommend_interview: bool,
    pub suggested_seniority: Option<String>,
    pub phase_reviewed: Phase,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub account_id: Uuid,
    pub token_hash: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub previous_phase: Option<String>,
    pub new_phase: Option<String>,
    pub reason: Option<String>,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub candidate_id: Uuid,
    pub kind: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
