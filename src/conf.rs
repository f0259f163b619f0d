use chrono::Duration;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::pipeline::{PipelinePolicy, DEFAULT_APPROVAL_THRESHOLD, DEFAULT_CASE_WINDOW_DAYS};

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub database_pool_max_connections: u32,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    //email
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_pass: String,
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    //ai
    #[serde(default)]
    pub ai_endpoint: String,
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,
    #[serde(default)]
    pub ai_model: String,
    #[serde(default)]
    pub ai_key: String,
    //pipeline
    #[serde(default = "default_threshold")]
    pub approval_threshold: f64,
    #[serde(default = "default_case_window")]
    pub case_window_days: i64,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,
}

fn default_service_name() -> String {
    "Recrutamento".into()
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_pool_size() -> u32 {
    5
}

fn default_upload_dir() -> String {
    "uploads".into()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_ai_provider() -> String {
    "openai".into()
}

fn default_threshold() -> f64 {
    DEFAULT_APPROVAL_THRESHOLD
}

fn default_case_window() -> i64 {
    DEFAULT_CASE_WINDOW_DAYS
}

fn default_session_ttl() -> i64 {
    24
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        let mut s: Settings = conf.try_deserialize()?;
        s.apply_provider_defaults();
        Ok(s)
    }

    fn apply_provider_defaults(&mut self) {
        match self.ai_provider.as_str() {
            "ollama" => {
                self.ai_key = "ollama".into();
                if self.ai_endpoint.is_empty() {
                    self.ai_endpoint = "http://localhost:11434/v1".into();
                }
                if self.ai_model.is_empty() {
                    self.ai_model = "gemma3:12b".into();
                }
            }
            "openai" => {
                if self.ai_endpoint.is_empty() {
                    self.ai_endpoint = "https://api.openai.com/v1".into();
                }
                if self.ai_model.is_empty() {
                    self.ai_model = "gpt-4o-mini".into();
                }
            }
            "gemini" => {
                if self.ai_endpoint.is_empty() {
                    self.ai_endpoint =
                        "https://generativelanguage.googleapis.com/v1beta/openai".into();
                }
                if self.ai_model.is_empty() {
                    self.ai_model = "gemini-2.5-flash".into();
                }
            }
            _ => {}
        }
    }

    pub fn policy(&self) -> PipelinePolicy {
        PipelinePolicy {
            approval_threshold: self.approval_threshold,
            case_window_days: self.case_window_days,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.max(1))
    }
}
