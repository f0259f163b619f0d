pub mod templates;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tokio::task::JoinHandle;

use crate::conf::Settings;
use crate::error::{AppError, Result};
use crate::models::{Candidate, NewNotification, Notification};
use crate::store::{NotificationStore, Store};

pub use templates::{NotificationEvent, Recipient};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailError(pub String);

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mail transport error: {}", self.0)
    }
}

impl std::error::Error for MailError {}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> std::result::Result<(), MailError>;
}

pub struct SmtpMailer {
    from: String,
    server: String,
    port: u16,
    user: String,
    pass: String,
}

impl SmtpMailer {
    pub fn from_settings(s: &Settings) -> Self {
        SmtpMailer {
            from: format!("{} <{}>", s.service_name, s.from_email),
            server: s.smtp_server.clone(),
            port: s.smtp_port,
            user: s.smtp_user.clone(),
            pass: s.smtp_pass.clone(),
        }
    }

    fn build(&self, email: &OutgoingEmail) -> std::result::Result<Message, MailError> {
        let from = self
            .from
            .parse()
            .map_err(|e| MailError(format!("invalid sender: {e}")))?;
        let to = format!("{} <{}>", email.to_name, email.to_email)
            .parse()
            .map_err(|e| MailError(format!("invalid recipient: {e}")))?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| MailError(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> std::result::Result<(), MailError> {
        if self.server.is_empty() {
            return Err(MailError("smtp server is not configured".into()));
        }
        let message = self.build(&email)?;
        let creds = Credentials::new(self.user.clone(), self.pass.clone());
        let transport = SmtpTransport::relay(&self.server)
            .map_err(|e| MailError(e.to_string()))?
            .port(self.port)
            .credentials(creds)
            .build();
        tracing::debug!("sending email to {}", &email.to_email);
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError(format!("send task failed: {e}")))?
            .map(|_| ())
            .map_err(|e| MailError(e.to_string()))
    }
}

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    company: String,
    base_url: String,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        company: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Notifier {
            store,
            mailer,
            company: company.into(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn recipient(&self, candidate: &Candidate, job_title: &str) -> Recipient {
        Recipient {
            name: candidate.full_name.clone(),
            job_title: job_title.to_string(),
            base_url: self.base_url.clone(),
            company: self.company.clone(),
        }
    }

    async fn queue(
        &self,
        candidate: &Candidate,
        job_title: &str,
        event: &NotificationEvent,
    ) -> Result<(Notification, OutgoingEmail)> {
        let rendered = templates::render(event, &self.recipient(candidate, job_title));
        let row = self
            .store
            .queue_notification(NewNotification {
                candidate_id: candidate.id,
                kind: event.kind().to_string(),
                recipient: candidate.email.clone(),
                subject: rendered.subject.clone(),
                body: rendered.html.clone(),
                created_at: Utc::now(),
            })
            .await?;
        let email = OutgoingEmail {
            to_name: candidate.full_name.clone(),
            to_email: candidate.email.clone(),
            subject: rendered.subject,
            html: rendered.html,
        };
        Ok((row, email))
    }

    /// Records the email and sends it in the background. Failures are logged
    /// and stored on the notification row, never returned.
    pub async fn dispatch(
        &self,
        candidate: &Candidate,
        job_title: &str,
        event: NotificationEvent,
    ) -> Option<JoinHandle<()>> {
        let (row, email) = match self.queue(candidate, job_title, &event).await {
            Ok(queued) => queued,
            Err(err) => {
                tracing::error!(
                    candidate_id = %candidate.id,
                    kind = event.kind(),
                    "could not queue notification: {err}"
                );
                return None;
            }
        };
        let store = self.store.clone();
        let mailer = self.mailer.clone();
        Some(tokio::spawn(async move {
            deliver(store.as_ref(), mailer.as_ref(), &row, email).await;
        }))
    }

    /// Sends synchronously and reports transport failures to the caller.
    pub async fn send_now(
        &self,
        candidate: &Candidate,
        job_title: &str,
        event: NotificationEvent,
    ) -> Result<Notification> {
        let (row, email) = self.queue(candidate, job_title, &event).await?;
        match self.mailer.send(email).await {
            Ok(()) => {
                let at = Utc::now();
                self.store.mark_sent(row.id, at).await?;
                Ok(Notification {
                    sent: true,
                    sent_at: Some(at),
                    ..row
                })
            }
            Err(err) => {
                self.store.mark_failed(row.id, &err.0).await?;
                Err(AppError::upstream("mail", err))
            }
        }
    }
}

async fn deliver(store: &dyn Store, mailer: &dyn Mailer, row: &Notification, email: OutgoingEmail) {
    let outcome = mailer.send(email).await;
    let recorded = match &outcome {
        Ok(()) => {
            tracing::info!(notification_id = %row.id, kind = %row.kind, "email sent");
            store.mark_sent(row.id, Utc::now()).await
        }
        Err(err) => {
            tracing::warn!(
                notification_id = %row.id,
                kind = %row.kind,
                "could not send email: {err}"
            );
            store.mark_failed(row.id, &err.0).await
        }
    };
    if let Err(err) = recorded {
        tracing::error!(notification_id = %row.id, "could not record email outcome: {err}");
    }
}
