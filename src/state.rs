use std::sync::Arc;

use crate::auth::Authenticator;
use crate::conf::Settings;
use crate::llm::CompletionClient;
use crate::notify::{Mailer, Notifier};
use crate::pipeline::PipelinePolicy;
use crate::storage::BlobStorage;
use crate::store::Store;

/// Collaborators shared by every request handler and CLI command.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStorage>,
    pub llm: Arc<dyn CompletionClient>,
    pub notifier: Notifier,
    pub auth: Authenticator,
    pub policy: PipelinePolicy,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStorage>,
        llm: Arc<dyn CompletionClient>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AppState {
            notifier: Notifier::new(
                store.clone(),
                mailer,
                settings.service_name.clone(),
                settings.base_url.clone(),
            ),
            auth: Authenticator::new(store.clone(), settings.session_ttl()),
            policy: settings.policy(),
            store,
            blobs,
            llm,
        }
    }
}
