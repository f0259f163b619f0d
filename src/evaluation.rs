use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::llm::{parse_analysis, AiAnalysis, CompletionRequest};
use crate::models::{Candidate, CandidateStatus, Job, Phase};
use crate::notify::NotificationEvent;
use crate::pipeline::normalize_score;
use crate::state::AppState;
use crate::store::{CandidateStore, CandidateUpdate, JobStore, TransitionNote};

const SYSTEM_PROMPT: &str =
    "Você é um recrutador experiente que avalia candidatos de forma justa e criteriosa.";

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub candidate_id: Uuid,
    pub score: f64,
    pub status: CandidateStatus,
    pub phase: Phase,
    pub case_deadline: Option<DateTime<Utc>>,
    pub analysis: AiAnalysis,
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

pub fn build_prompt(candidate: &Candidate, job: &Job) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Você está avaliando um candidato para a vaga de \"{}\".",
        job.title
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Descrição da vaga: {}", or_blank(&job.description));
    let _ = writeln!(prompt, "Requisitos: {}", or_blank(&job.requirements));
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Informações do candidato:");
    let _ = writeln!(prompt, "- Nome: {}", candidate.full_name);
    let _ = writeln!(
        prompt,
        "- Formação: {} em {} ({})",
        or_blank(&candidate.course),
        or_blank(&candidate.institution),
        or_blank(&candidate.education_level)
    );
    let _ = writeln!(
        prompt,
        "- Experiência: {} anos, atualmente {} em {}",
        candidate.experience_years.unwrap_or(0),
        or_blank(&candidate.current_role),
        or_blank(&candidate.current_company)
    );
    let _ = writeln!(prompt, "- Competências: {}", or_blank(&candidate.skills));
    let _ = writeln!(prompt, "- Motivação: {}", or_blank(&candidate.motivation));
    let _ = writeln!(prompt, "- Disponibilidade: {}", or_blank(&candidate.availability));
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Avalie adequação técnica, experiência relevante, potencial de crescimento e fit cultural."
    );
    let _ = writeln!(
        prompt,
        "Retorne um JSON com: score (0 a 10), pontos_fortes (lista), pontos_melhoria (lista), \
         adequacao_vaga (texto), recomendacao (\"aprovar\" ou \"reprovar\"), justificativa (texto)."
    );
    prompt
}

/// Scores the candidate with the model, applies the transition rule and
/// persists the outcome. When the candidate advances, the case email is
/// dispatched and its send task handle returned.
pub async fn evaluate_candidate(
    state: &AppState,
    candidate_id: Uuid,
    actor_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<(EvaluationOutcome, Option<JoinHandle<()>>)> {
    let candidate = state
        .store
        .candidate_by_id(candidate_id)
        .await?
        .ok_or(AppError::NotFound("candidate"))?;
    let job = state
        .store
        .job_by_id(candidate.job_id)
        .await?
        .ok_or(AppError::NotFound("job"))?;

    let raw = state
        .llm
        .complete(CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_prompt(&candidate, &job),
            temperature: 0.3,
            max_tokens: 1000,
        })
        .await
        .map_err(|e| AppError::upstream("llm", e))?;
    let mut analysis = parse_analysis(&raw).map_err(|e| AppError::upstream("llm", e))?;
    analysis.score = normalize_score(analysis.score)
        .ok_or_else(|| AppError::upstream("llm", "score is not a finite number"))?;

    let transition = state.policy.decide(analysis.score, now);
    let update = CandidateUpdate {
        status: Some(transition.status),
        phase: transition.phase,
        ai_score: Some(analysis.score),
        ai_analysis: Some(serde_json::to_value(&analysis)?),
        case_enabled: Some(transition.sends_case()),
        case_deadline: Some(transition.case_deadline),
        ..Default::default()
    };
    let note = TransitionNote {
        reason: format!("avaliação IA: score {:.1}", analysis.score),
        actor_id,
        at: now,
    };
    let updated = state
        .store
        .update_candidate(candidate.id, &update, Some(note))
        .await?
        .ok_or(AppError::NotFound("candidate"))?;

    tracing::info!(
        candidate_id = %updated.id,
        score = analysis.score,
        status = updated.status.code(),
        "candidate evaluated"
    );

    let mut handle = None;
    if let (true, Some(deadline)) = (transition.sends_case(), transition.case_deadline) {
        handle = state
            .notifier
            .dispatch(
                &updated,
                &job.title,
                NotificationEvent::CaseSent {
                    deadline,
                    case_link: format!("{}/candidato/dashboard", state.notifier.base_url()),
                },
            )
            .await;
    }

    Ok((
        EvaluationOutcome {
            candidate_id: updated.id,
            score: analysis.score,
            status: updated.status,
            phase: updated.phase,
            case_deadline: updated.case_deadline,
            analysis,
        },
        handle,
    ))
}
