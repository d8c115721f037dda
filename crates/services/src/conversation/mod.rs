mod controller;
mod knowledge;
mod tutor;

pub use controller::{
    Conversation, ConversationKind, ConversationPhase, IgnoreReason, InFlight, NETWORK_ERROR,
    NO_RESPONSE, SubmitOutcome, TranscriptEntry,
};
pub use knowledge::{Knowledge, KnowledgeConversation, KnowledgeReply, SUGGESTED_QUESTIONS};
pub use tutor::{Tutor, TutorConversation, TutorReply};
