use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Account, NewAccount, NewSession, Role};
use crate::store::{normalize_email, AccountStore, Store};

const TOKEN_LEN: usize = 48;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub full_name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 6, message = "password must have at least 6 characters"))]
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accepted_terms: bool,
}

impl SignupForm {
    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.password != self.confirm_password {
            return Err(AppError::Validation("passwords do not match".into()));
        }
        if !self.accepted_terms {
            return Err(AppError::Validation("terms must be accepted".into()));
        }
        Ok(())
    }
}

/// The authenticated caller, attached to requests by the session middleware.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl Principal {
    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("not allowed for this role".into()))
        }
    }
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Principal {
            account_id: account.id,
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub principal: Principal,
}

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    // a malformed stored hash is treated as a mismatch
    Ok(verified.unwrap_or(false))
}

/// Only the SHA-256 digest of a session token is persisted, one session per
/// account.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn Store>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Authenticator { store, ttl }
    }

    /// Checks credentials for any of `roles` and opens a fresh session,
    /// replacing whatever session the account had.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        roles: &[Role],
        now: DateTime<Utc>,
    ) -> Result<IssuedSession> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AppError::Validation("email and password are required".into()));
        }
        let invalid = || AppError::Unauthorized("invalid email or password".into());

        let account = self.store.account_by_email(&email).await?.ok_or_else(invalid)?;
        if !verify_password(&credentials.password, &account.password_hash).await? {
            tracing::info!(%email, "rejected login with wrong password");
            return Err(invalid());
        }
        if !account.active {
            return Err(AppError::Forbidden("account is disabled".into()));
        }
        if !roles.contains(&account.role) {
            tracing::warn!(
                %email,
                role = account.role.code(),
                "login attempted on the wrong portal"
            );
            return Err(AppError::Forbidden("account not allowed here".into()));
        }
        self.open_session(&account, now).await
    }

    pub async fn signup_candidate(
        &self,
        form: &SignupForm,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession> {
        form.check()?;
        let account = self
            .create_account(
                &form.email,
                &form.full_name,
                form.phone.clone(),
                &form.password,
                Role::Candidate,
            )
            .await?;
        tracing::info!(account_id = %account.id, "candidate account created");
        self.open_session(&account, now).await
    }

    pub async fn create_account(
        &self,
        email: &str,
        full_name: &str,
        phone: Option<String>,
        password: &str,
        role: Role,
    ) -> Result<Account> {
        let email = normalize_email(email);
        if self.store.account_by_email(&email).await?.is_some() {
            return Err(AppError::Duplicate("email already registered".into()));
        }
        let password_hash = hash_password(password).await?;
        self.store
            .insert_account(NewAccount {
                email,
                full_name: full_name.trim().to_string(),
                phone,
                password_hash,
                role,
            })
            .await
    }

    async fn open_session(&self, account: &Account, now: DateTime<Utc>) -> Result<IssuedSession> {
        let token = generate_token();
        let session = self
            .store
            .replace_session(NewSession {
                account_id: account.id,
                token_hash: hash_token(&token),
                role: account.role,
                expires_at: now + self.ttl,
                created_at: now,
            })
            .await?;
        self.store.record_login(account.id, now).await?;
        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
            principal: account.into(),
        })
    }

    /// Resolves a bearer token. Expired or orphaned sessions are deleted.
    pub async fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal> {
        let rejected = || AppError::Unauthorized("session expired or invalid".into());
        if token.is_empty() {
            return Err(rejected());
        }
        let token_hash = hash_token(token);
        let session = self
            .store
            .session_by_hash(&token_hash)
            .await?
            .ok_or_else(rejected)?;

        if session.expires_at <= now {
            tracing::debug!(account_id = %session.account_id, "session expired");
            self.store.delete_session(&token_hash).await?;
            return Err(rejected());
        }

        let account = match self.store.account_by_id(session.account_id).await? {
            Some(account) if account.active => account,
            _ => {
                self.store.delete_session(&token_hash).await?;
                return Err(rejected());
            }
        };

        self.store.touch_session(&token_hash, now).await?;
        Ok(Principal {
            role: session.role,
            ..Principal::from(&account)
        })
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.store.delete_session(&hash_token(token)).await
    }
}
