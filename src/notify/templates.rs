use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who the email is addressed to and which job it is about.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub job_title: String,
    pub base_url: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum NotificationEvent {
    #[serde(rename = "confirmacao")]
    Confirmation {
        tracking_token: String,
        applied_at: DateTime<Utc>,
    },
    #[serde(rename = "status_atualizado")]
    StatusChanged {
        status_label: String,
        status_message: String,
    },
    #[serde(rename = "case_enviado")]
    CaseSent {
        deadline: DateTime<Utc>,
        case_link: String,
    },
    #[serde(rename = "entrevista_agendada")]
    InterviewScheduled {
        interview_kind: String,
        scheduled_at: DateTime<Utc>,
        location: String,
        interviewer: Option<String>,
    },
    #[serde(rename = "aprovacao_final")]
    FinalApproval { next_steps: Option<String> },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Confirmation { .. } => "confirmacao",
            NotificationEvent::StatusChanged { .. } => "status_atualizado",
            NotificationEvent::CaseSent { .. } => "case_enviado",
            NotificationEvent::InterviewScheduled { .. } => "entrevista_agendada",
            NotificationEvent::FinalApproval { .. } => "aprovacao_final",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// dd/mm/aaaa
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

/// dd/mm/aaaa às HH:MM
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y às %H:%M").to_string()
}

struct Layout<'a> {
    heading: &'a str,
    company: &'a str,
    body: String,
}

impl Display for Layout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; border-radius: 10px 10px 0 0; text-align: center; }}
        .content {{ background: white; padding: 30px; border: 1px solid #e2e8f0; border-radius: 0 0 10px 10px; }}
        .highlight {{ background: #f7fafc; border: 2px dashed #667eea; border-radius: 8px; padding: 20px; margin: 20px 0; text-align: center; }}
        .button {{ display: inline-block; background: #667eea; color: white; padding: 12px 30px; border-radius: 6px; text-decoration: none; font-weight: 600; }}
        .footer {{ margin-top: 30px; padding-top: 20px; border-top: 1px solid #e2e8f0; text-align: center; color: #718096; font-size: 14px; }}
    </style>
</head>
<body>
    <div class="header"><h1 style="margin: 0;">{heading}</h1></div>
    <div class="content">
{body}
    </div>
    <div class="footer">
        <p>Este é um email automático. Por favor, não responda.</p>
        <p style="font-size: 12px;">{company}</p>
    </div>
</body>
</html>
"#,
            heading = self.heading,
            body = self.body,
            company = escape(self.company),
        )
    }
}

pub fn render(event: &NotificationEvent, to: &Recipient) -> Rendered {
    let name = escape(&to.name);
    let job = escape(&to.job_title);
    match event {
        NotificationEvent::Confirmation {
            tracking_token,
            applied_at,
        } => Rendered {
            subject: format!("Confirmação de Candidatura - {}", to.job_title),
            html: Layout {
                heading: "Candidatura Recebida!",
                company: &to.company,
                body: format!(
                    r#"        <p>Olá <strong>{name}</strong>,</p>
        <p>Recebemos em {date} sua candidatura para a vaga de <strong>{job}</strong>.</p>
        <div class="highlight">
            <p>Seu código de acompanhamento:</p>
            <p style="font-family: monospace; font-size: 24px; font-weight: bold;">{token}</p>
            <p style="font-size: 12px;">Guarde este código para consultar o status da sua candidatura</p>
        </div>
        <p>Nossa IA avaliará seu perfil em até 48 horas.</p>
        <p><a href="{base}/candidato/consulta" class="button">Consultar Status</a></p>"#,
                    date = format_date(*applied_at),
                    token = escape(tracking_token),
                    base = to.base_url,
                ),
            }
            .to_string(),
        },
        NotificationEvent::StatusChanged {
            status_label,
            status_message,
        } => Rendered {
            subject: format!("Atualização na sua candidatura - {}", to.job_title),
            html: Layout {
                heading: "Atualização de Status",
                company: &to.company,
                body: format!(
                    r#"        <p>Olá <strong>{name}</strong>,</p>
        <p>Sua candidatura para <strong>{job}</strong> foi atualizada.</p>
        <div class="highlight">
            <p style="font-size: 18px; font-weight: bold;">{label}</p>
            <p>{message}</p>
        </div>
        <p><a href="{base}/candidato/consulta" class="button">Ver Detalhes</a></p>"#,
                    label = escape(status_label),
                    message = escape(status_message),
                    base = to.base_url,
                ),
            }
            .to_string(),
        },
        NotificationEvent::CaseSent {
            deadline,
            case_link,
        } => Rendered {
            subject: format!("Case Prático - {}", to.job_title),
            html: Layout {
                heading: "Case Prático Disponível!",
                company: &to.company,
                body: format!(
                    r#"        <p>Olá <strong>{name}</strong>,</p>
        <p>Parabéns! Você avançou para a próxima etapa do processo seletivo para <strong>{job}</strong>!</p>
        <div class="highlight">
            <p>Prazo de entrega:</p>
            <p style="font-size: 18px; font-weight: bold;">{deadline}</p>
        </div>
        <ul>
            <li>Leia atentamente as instruções</li>
            <li>Envie dentro do prazo estipulado</li>
        </ul>
        <p><a href="{link}" class="button">Acessar Case</a></p>
        <p>Boa sorte! Estamos ansiosos para ver sua solução.</p>"#,
                    deadline = format_date_time(*deadline),
                    link = escape(case_link),
                ),
            }
            .to_string(),
        },
        NotificationEvent::InterviewScheduled {
            interview_kind,
            scheduled_at,
            location,
            interviewer,
        } => {
            let interviewer = interviewer
                .as_deref()
                .map(|who| {
                    format!(
                        "\n        <p><strong>Entrevistador(a):</strong> {}</p>",
                        escape(who)
                    )
                })
                .unwrap_or_default();
            Rendered {
                subject: format!("Entrevista Agendada - {}", to.job_title),
                html: Layout {
                    heading: "Entrevista Agendada!",
                    company: &to.company,
                    body: format!(
                        r#"        <p>Olá <strong>{name}</strong>,</p>
        <p>Sua <strong>{kind}</strong> para a vaga de <strong>{job}</strong> está confirmada!</p>
        <p><strong>Data e Hora:</strong> {when}</p>
        <p><strong>Local/Link:</strong> {location}</p>{interviewer}
        <p>Em caso de imprevisto, avise-nos com pelo menos 24h de antecedência para reagendarmos.</p>"#,
                        kind = escape(interview_kind),
                        when = format_date_time(*scheduled_at),
                        location = escape(location),
                    ),
                }
                .to_string(),
            }
        }
        NotificationEvent::FinalApproval { next_steps } => Rendered {
            subject: format!("Parabéns! Você foi aprovado(a) - {}", to.job_title),
            html: Layout {
                heading: "Parabéns!",
                company: &to.company,
                body: format!(
                    r#"        <p>Olá <strong>{name}</strong>,</p>
        <p>É com grande alegria que informamos sua <strong>aprovação</strong> no processo seletivo para a vaga de <strong>{job}</strong>!</p>
        <p>{steps}</p>"#,
                    steps = escape(
                        next_steps
                            .as_deref()
                            .unwrap_or("Em breve entraremos em contato com mais detalhes.")
                    ),
                ),
            }
            .to_string(),
        },
    }
}
