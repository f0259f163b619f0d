use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod accounts;
mod applications;
mod auth;
mod candidates;
mod conf;
mod db;
mod error;
mod evaluation;
mod jobs;
mod llm;
mod models;
mod notify;
mod pipeline;
mod report;
mod reviews;
mod server;
mod state;
mod status;
mod storage;
mod store;
#[cfg(test)]
mod testing;

use conf::Settings;
use models::Role;
use state::AppState;
use store::{CandidateStore, JobStore};

#[derive(Parser)]
#[command(name = "recruit-pipeline")]
#[command(about = "Recruitment pipeline backend with AI screening", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo jobs and staff accounts
    Seed {
        /// Password given to the seeded admin and evaluator
        #[arg(long)]
        password: String,
    },
    /// Run the HTTP API
    Serve,
    /// Run the AI screening for one candidate
    Evaluate {
        #[arg(long)]
        candidate: Uuid,
    },
    /// Create a staff or candidate account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "avaliador")]
        role: Role,
    },
    /// Generate a markdown pipeline report
    Report {
        /// Restrict to one job, by its public key
        #[arg(long)]
        job: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_state(settings: &Settings, pool: sqlx::PgPool) -> anyhow::Result<AppState> {
    let llm = llm::OpenAiClient::from_settings(settings).context("failed to build LLM client")?;
    Ok(AppState::new(
        settings,
        Arc::new(store::postgres::PgStore::new(pool)),
        Arc::new(storage::FsBlobStorage::new(&settings.upload_dir)),
        Arc::new(llm),
        Arc::new(notify::SmtpMailer::from_settings(settings)),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::new().context("failed to load settings; DATABASE_URL must be set")?;
    let pool = db::connect(&settings).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { password } => {
            db::seed(&pool, &password).await?;
            println!("Seed data inserted.");
        }
        Commands::Serve => {
            db::init_db(&pool).await?;
            let state = build_state(&settings, pool)?;
            server::listen(&settings, state).await?;
        }
        Commands::Evaluate { candidate } => {
            let state = build_state(&settings, pool)?;
            let (outcome, email) =
                evaluation::evaluate_candidate(&state, candidate, None, Utc::now()).await?;
            if let Some(email) = email {
                email.await.context("case email task failed")?;
            }
            println!(
                "Candidate {} scored {:.1}: {} ({})",
                outcome.candidate_id,
                outcome.score,
                status::style(outcome.status).label,
                outcome.analysis.recommendation
            );
        }
        Commands::CreateUser {
            email,
            name,
            password,
            role,
        } => {
            let state = build_state(&settings, pool)?;
            let account = state
                .auth
                .create_account(&email, &name, None, &password, role)
                .await?;
            println!("Created {} account {}.", account.role.code(), account.email);
        }
        Commands::Report { job, out } => {
            let pg = store::postgres::PgStore::new(pool);
            let job = match job.as_deref() {
                Some(key) => Some(
                    pg.job_by_key(key)
                        .await?
                        .with_context(|| format!("no job with key {key}"))?,
                ),
                None => None,
            };
            let candidates = pg.list_candidates(job.as_ref().map(|j| j.id)).await?;
            let mut transitions = pg.recent_transitions(50).await?;
            if job.is_some() {
                transitions.retain(|t| candidates.iter().any(|c| c.id == t.candidate_id));
            }
            let report = report::build_report(
                job.as_ref().map(|j| j.title.as_str()),
                Utc::now(),
                &candidates,
                &transitions,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
