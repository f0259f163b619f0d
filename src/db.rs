use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::conf::Settings;
use crate::models::Role;

pub async fn connect(settings: &Settings) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads demo openings plus one admin and one evaluator sharing `password`.
pub async fn seed(pool: &PgPool, password: &str) -> anyhow::Result<()> {
    let password_hash = hash_password(password).await?;
    let accounts = vec![
        (
            Uuid::parse_str("6f1c2d3e-4a5b-4c6d-8e7f-9a0b1c2d3e4f")?,
            "admin@recrutamento.dev",
            "Administração",
            Role::Admin,
        ),
        (
            Uuid::parse_str("2b3c4d5e-6f70-4182-93a4-b5c6d7e8f901")?,
            "avaliador@recrutamento.dev",
            "Equipe Técnica",
            Role::Evaluator,
        ),
    ];

    for (id, email, name, role) in accounts {
        sqlx::query(
            r#"
            INSERT INTO recruitment.accounts (id, email, full_name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, password_hash = EXCLUDED.password_hash
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(&password_hash)
        .bind(role.code())
        .execute(pool)
        .await?;
    }

    let jobs = vec![
        (
            "dev-backend-rust",
            "Desenvolvedor(a) Backend Rust",
            "Tecnologia",
            "Serviços de alta disponibilidade para o nosso processo seletivo.",
            "Rust, Postgres, APIs HTTP, testes automatizados",
            "remoto",
            "pleno",
        ),
        (
            "analista-dados",
            "Analista de Dados",
            "Dados",
            "Modelagem e análise de indicadores do funil de contratação.",
            "SQL, Python, visualização de dados",
            "hibrido",
            "junior",
        ),
        (
            "product-designer",
            "Product Designer",
            "Produto",
            "Pesquisa e design das jornadas de candidatos e recrutadores.",
            "Figma, pesquisa com usuários, design system",
            "presencial",
            "senior",
        ),
    ];

    for (job_key, title, department, description, requirements, work_model, seniority) in jobs {
        sqlx::query(
            r#"
            INSERT INTO recruitment.jobs
            (id, title, department, description, requirements, work_model, seniority, job_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (job_key) DO UPDATE
            SET title = EXCLUDED.title, description = EXCLUDED.description,
                requirements = EXCLUDED.requirements, updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(department)
        .bind(description)
        .bind(requirements)
        .bind(work_model)
        .bind(seniority)
        .bind(job_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}
