use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::conf::Settings;
use crate::error::{AppError, Result};
use crate::llm::{CompletionClient, CompletionRequest, LlmError};
use crate::models::{Candidate, Job, NewCandidate, NewJob};
use crate::notify::{MailError, Mailer, OutgoingEmail};
use crate::state::AppState;
use crate::storage::BlobStorage;
use crate::store::memory::MemoryStore;
use crate::store::{CandidateStore, JobStore};

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        RecordingMailer {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> std::result::Result<(), MailError> {
        if self.fail {
            return Err(MailError("connection refused".into()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct FakeLlm {
    reply: std::result::Result<String, LlmError>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    pub fn replying(reply: impl Into<String>) -> Self {
        FakeLlm {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn scoring(score: f64) -> Self {
        Self::replying(format!(
            r#"{{"score": {score}, "pontos_fortes": ["Rust"], "pontos_melhoria": [], "adequacao_vaga": "boa", "recomendacao": "aprovar", "justificativa": "perfil consistente"}}"#
        ))
    }

    pub fn failing() -> Self {
        FakeLlm {
            reply: Err(LlmError("upstream timeout".into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeLlm {
    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

#[derive(Default)]
pub struct MemoryBlobStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_from: Mutex<Option<usize>>,
}

impl MemoryBlobStorage {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Every put from the `nth` one on (1-based) fails.
    pub fn fail_from_put(&self, nth: usize) {
        *self.fail_from.lock().unwrap() = Some(nth);
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn put(&self, path: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let nth = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(*self.fail_from.lock().unwrap(), Some(from) if nth >= from) {
            return Err(AppError::upstream("storage", "bucket unavailable"));
        }
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(path) {
            return Err(AppError::upstream("storage", "object exists"));
        }
        objects.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }
}

pub fn test_settings() -> Settings {
    serde_json::from_value(serde_json::json!({
        "database_url": "postgres://localhost/recruitment_test",
        "base_url": "https://jobs.example.com",
    }))
    .unwrap()
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStorage>,
    pub llm: Arc<FakeLlm>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn harness_with(llm: FakeLlm) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStorage::default());
    let llm = Arc::new(llm);
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(
        &test_settings(),
        store.clone(),
        blobs.clone(),
        llm.clone(),
        mailer.clone(),
    );
    Harness {
        state,
        store,
        blobs,
        llm,
        mailer,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeLlm::scoring(8.2))
}

pub async fn sample_job(store: &MemoryStore) -> Job {
    store
        .create_job(NewJob {
            title: "Desenvolvedor Rust".into(),
            description: Some("Serviços de backend em Rust".into()),
            requirements: Some("Rust, Postgres, async".into()),
            openings: 1,
            job_key: format!("job-{}", uuid::Uuid::new_v4().simple()),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn sample_candidate(store: &MemoryStore) -> Candidate {
    let job = sample_job(store).await;
    store
        .insert_candidate(NewCandidate {
            job_id: job.id,
            full_name: "Carla Souza".into(),
            email: "carla@example.com".into(),
            phone: "+55 11 99999-0000".into(),
            birth_date: NaiveDate::from_ymd_opt(1995, 4, 12),
            city: "São Paulo".into(),
            state: "SP".into(),
            country: "Brasil".into(),
            education_level: Some("superior".into()),
            experience_years: Some(4),
            skills: Some("Rust, SQL".into()),
            motivation: Some("Gosto de sistemas".into()),
            availability: Some("imediata".into()),
            tracking_token: format!("TRK{}", uuid::Uuid::new_v4().simple()),
            applied_at: Utc::now(),
            ..Default::default()
        })
        .await
        .unwrap()
}
