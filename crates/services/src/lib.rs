#![forbid(unsafe_code)]

pub mod agent;
pub mod app_services;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod error;
pub mod progress;
pub mod session_ids;
pub mod settings;

pub use tutor_core::Clock;

pub use agent::{AgentClient, AgentEnvelope, AgentPayload, AgentRequest, HttpAgentClient};
pub use app_services::AppServices;
pub use config::{AgentConfig, AgentEndpoint};
pub use conversation::{
    Conversation, ConversationPhase, IgnoreReason, KnowledgeConversation, KnowledgeReply,
    SubmitOutcome, TranscriptEntry, TutorConversation, TutorReply,
};
pub use documents::{
    DocumentStore, DocumentUpload, HttpDocumentStore, KnowledgeBaseDocuments, KnowledgeDocument,
    UploadStatus,
};
pub use error::{
    AgentError, AppServicesError, ConfigError, DocumentError, ProgressServiceError,
    SettingsServiceError,
};
pub use progress::ProgressTracker;
pub use session_ids::{ConversationSessions, SessionId, SessionIdGenerator};
pub use settings::SettingsService;
