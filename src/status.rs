use serde::Serialize;

use crate::models::{CandidateStatus, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Info,
    Warning,
    Error,
    Success,
    Cosmic,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    /// Label used on staff screens.
    pub label: &'static str,
    /// Softer label shown to the candidate.
    pub candidate_label: &'static str,
    pub message: &'static str,
    pub badge: Badge,
    pub css: &'static str,
}

const FALLBACK_CSS: &str = "bg-gray-100 text-gray-800";
const FALLBACK_MESSAGE: &str = "Status em atualização";

pub fn style(status: CandidateStatus) -> StatusStyle {
    match status {
        CandidateStatus::Applied => StatusStyle {
            label: "Inscrito",
            candidate_label: "Inscrito",
            message: "Inscrição enviada com sucesso",
            badge: Badge::Info,
            css: "bg-blue-100 text-blue-800",
        },
        CandidateStatus::AiReview => StatusStyle {
            label: "Em Avaliação IA",
            candidate_label: "Em Avaliação",
            message: "Perfil sendo analisado pela nossa IA",
            badge: Badge::Warning,
            css: "bg-yellow-100 text-yellow-800",
        },
        CandidateStatus::AiRejected => StatusStyle {
            label: "Reprovado IA",
            candidate_label: "Não Aprovado",
            message: "Perfil não atende aos requisitos da vaga",
            badge: Badge::Error,
            css: "bg-red-100 text-red-800",
        },
        CandidateStatus::CaseSent => StatusStyle {
            label: "Case Enviado",
            candidate_label: "Case Enviado",
            message: "Case prático disponível para resolução",
            badge: Badge::Info,
            css: "bg-purple-100 text-purple-800",
        },
        CandidateStatus::CaseReview => StatusStyle {
            label: "Avaliando Case",
            candidate_label: "Case em Análise",
            message: "Case sendo avaliado pela equipe técnica",
            badge: Badge::Warning,
            css: "bg-orange-100 text-orange-800",
        },
        CandidateStatus::CaseApproved => StatusStyle {
            label: "Case Aprovado",
            candidate_label: "Case Aprovado",
            message: "Case aprovado! Aguarde próximas etapas",
            badge: Badge::Success,
            css: "bg-green-100 text-green-800",
        },
        CandidateStatus::CaseRejected => StatusStyle {
            label: "Case Reprovado",
            candidate_label: "Case Reprovado",
            message: "Case não atendeu aos critérios",
            badge: Badge::Error,
            css: "bg-red-100 text-red-800",
        },
        CandidateStatus::TechnicalInterview => StatusStyle {
            label: "Entrevista Técnica",
            candidate_label: "Entrevista Técnica",
            message: "Entrevista técnica agendada",
            badge: Badge::Cosmic,
            css: "bg-indigo-100 text-indigo-800",
        },
        CandidateStatus::PartnersInterview => StatusStyle {
            label: "Entrevista Sócios",
            candidate_label: "Entrevista Sócios",
            message: "Entrevista com sócios agendada",
            badge: Badge::Cosmic,
            css: "bg-pink-100 text-pink-800",
        },
        CandidateStatus::Approved => StatusStyle {
            label: "Aprovado",
            candidate_label: "Aprovado",
            message: "Parabéns! Você foi aprovado",
            badge: Badge::Success,
            css: "bg-green-100 text-green-800",
        },
        CandidateStatus::Rejected => StatusStyle {
            label: "Reprovado",
            candidate_label: "Não Aprovado",
            message: "Processo finalizado",
            badge: Badge::Error,
            css: "bg-red-100 text-red-800",
        },
        CandidateStatus::Hired => StatusStyle {
            label: "Contratado",
            candidate_label: "Contratado",
            message: "Bem-vindo ao time!",
            badge: Badge::Success,
            css: "bg-emerald-100 text-emerald-800",
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDisplay {
    pub code: String,
    pub label: String,
    pub candidate_label: String,
    pub message: String,
    pub badge: Badge,
    pub css: String,
}

impl From<CandidateStatus> for StatusDisplay {
    fn from(status: CandidateStatus) -> Self {
        let style = style(status);
        StatusDisplay {
            code: status.code().to_string(),
            label: style.label.to_string(),
            candidate_label: style.candidate_label.to_string(),
            message: style.message.to_string(),
            badge: style.badge,
            css: style.css.to_string(),
        }
    }
}

/// Total lookup: codes outside the table are shown as-is.
pub fn describe(code: &str) -> StatusDisplay {
    match code.parse::<CandidateStatus>() {
        Ok(status) => status.into(),
        Err(_) => StatusDisplay {
            code: code.to_string(),
            label: code.to_string(),
            candidate_label: code.to_string(),
            message: FALLBACK_MESSAGE.to_string(),
            badge: Badge::Default,
            css: FALLBACK_CSS.to_string(),
        },
    }
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Application => "Inscrição",
        Phase::AiReview => "Avaliação IA",
        Phase::Case => "Case Prático",
        Phase::CaseReview => "Avaliação do Case",
        Phase::TechnicalInterview => "Entrevista Técnica",
        Phase::PartnersInterview => "Entrevista com Sócios",
        Phase::Hiring => "Contratação",
    }
}

pub fn describe_phase(code: &str) -> String {
    code.parse::<Phase>()
        .map(|phase| phase_label(phase).to_string())
        .unwrap_or_else(|_| code.to_string())
}
