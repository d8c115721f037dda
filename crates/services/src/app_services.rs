use std::sync::Arc;

use storage::repository::Storage;
use tutor_core::model::ModuleCatalog;

use crate::agent::{AgentClient, HttpAgentClient};
use crate::config::AgentConfig;
use crate::conversation::{KnowledgeConversation, TutorConversation};
use crate::documents::{DocumentStore, HttpDocumentStore, KnowledgeBaseDocuments};
use crate::error::AppServicesError;
use crate::progress::ProgressTracker;
use crate::session_ids::{ConversationSessions, SessionIdGenerator};
use crate::settings::SettingsService;
use crate::Clock;

/// Assembles app-facing services around one storage backend and agent config.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<ModuleCatalog>,
    sessions: ConversationSessions,
    progress: Arc<ProgressTracker>,
    settings: Arc<SettingsService>,
    tutor: Arc<TutorConversation>,
    knowledge: Arc<KnowledgeConversation>,
    documents: Arc<KnowledgeBaseDocuments>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and HTTP agent clients.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: AgentConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, config, clock).await)
    }

    /// Build services over `storage` with HTTP agent clients.
    ///
    /// Stored progress is loaded before this returns.
    pub async fn new(storage: &Storage, config: AgentConfig, clock: Clock) -> Self {
        let agent: Arc<dyn AgentClient> = Arc::new(HttpAgentClient::new(config.endpoint.clone()));
        let store: Arc<dyn DocumentStore> =
            Arc::new(HttpDocumentStore::new(config.endpoint.clone()));
        Self::with_clients(storage, &config, clock, agent, store).await
    }

    /// Build services with caller-supplied transports.
    pub async fn with_clients(
        storage: &Storage,
        config: &AgentConfig,
        clock: Clock,
        agent: Arc<dyn AgentClient>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let catalog = Arc::new(ModuleCatalog::product_management());
        let progress = Arc::new(ProgressTracker::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&storage.state),
        ));
        progress.load().await;

        let sessions = ConversationSessions::new(&SessionIdGenerator::new(clock));
        let tutor = Arc::new(TutorConversation::new(
            Arc::clone(&agent),
            config.tutor_agent_id.clone(),
            sessions.tutor.clone(),
            config.timeout,
            Arc::clone(&progress),
        ));
        let knowledge = Arc::new(KnowledgeConversation::new(
            agent,
            config.knowledge_agent_id.clone(),
            sessions.knowledge.clone(),
            config.timeout,
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.state)));
        let documents = Arc::new(KnowledgeBaseDocuments::new(store, config.rag_id.clone()));

        Self {
            catalog,
            sessions,
            progress,
            settings,
            tutor,
            knowledge,
            documents,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<ModuleCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn sessions(&self) -> &ConversationSessions {
        &self.sessions
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorConversation> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn knowledge(&self) -> Arc<KnowledgeConversation> {
        Arc::clone(&self.knowledge)
    }

    #[must_use]
    pub fn documents(&self) -> Arc<KnowledgeBaseDocuments> {
        Arc::clone(&self.documents)
    }
}
