use std::sync::Arc;
use std::time::Duration;

use crate::agent::{AgentClient, AgentPayload};
use crate::session_ids::SessionId;

use super::controller::{Conversation, ConversationKind, NO_RESPONSE, SubmitOutcome};

/// Starter prompts offered when the knowledge transcript is empty.
pub const SUGGESTED_QUESTIONS: [&str; 10] = [
    "What is the RICE framework?",
    "Explain the Product Design interview framework",
    "How to calculate TAM/SAM/SOM?",
    "What is the Kano Model?",
    "How to use the STAR+ method for behavioral questions?",
    "Explain the AARRR Pirate Metrics framework",
    "What are Porter's Five Forces?",
    "How to approach a Favorite Product question?",
    "Build vs Buy vs Partner - how to decide?",
    "What is the HEART framework by Google?",
];

/// Knowledge-base agent conversation.
#[derive(Debug, Clone, Copy)]
pub struct Knowledge;

/// Structured fields of a knowledge-base answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeReply {
    pub framework_name: Option<String>,
    pub key_points: Vec<String>,
    pub interview_tip: Option<String>,
    pub related_topics: Vec<String>,
}

impl ConversationKind for Knowledge {
    type Reply = KnowledgeReply;

    const LABEL: &'static str = "knowledge";
    const FAILURE_MESSAGE: &'static str = "Failed to get response from knowledge agent.";

    fn parse_reply(payload: &AgentPayload) -> (String, KnowledgeReply) {
        let answer = payload
            .answer_text(&["answer", "text"])
            .unwrap_or_else(|| NO_RESPONSE.to_owned());
        let reply = KnowledgeReply {
            framework_name: payload.field("framework_name"),
            key_points: payload.list_field("key_points"),
            interview_tip: payload.field("interview_tip"),
            related_topics: payload.list_field("related_topics"),
        };
        (answer, reply)
    }
}

/// Question/answer exchange with the knowledge-base agent.
pub struct KnowledgeConversation {
    conversation: Conversation<Knowledge>,
}

impl KnowledgeConversation {
    #[must_use]
    pub fn new(
        client: Arc<dyn AgentClient>,
        agent_id: impl Into<String>,
        session_id: SessionId,
        timeout: Duration,
    ) -> Self {
        Self {
            conversation: Conversation::new(client, agent_id, session_id, timeout),
        }
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation<Knowledge> {
        &self.conversation
    }

    /// Ask the knowledge agent a question.
    pub async fn ask(&self, question: &str) -> SubmitOutcome<KnowledgeReply> {
        self.conversation.submit(question).await
    }

    /// Questions to offer while nothing has been asked yet.
    #[must_use]
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.conversation.transcript().is_empty() {
            &SUGGESTED_QUESTIONS
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_framework_fields() {
        let payload: AgentPayload = serde_json::from_value(json!({
            "result": {
                "answer": "The RICE framework ...",
                "framework_name": "RICE Framework",
                "key_points": "Reach measures user impact,Impact scored 0.25 to 3",
                "interview_tip": "",
                "related_topics": "ICE Scoring,MoSCoW Method"
            }
        }))
        .unwrap();

        let (answer, reply) = Knowledge::parse_reply(&payload);
        assert_eq!(answer, "The RICE framework ...");
        assert_eq!(reply.framework_name.as_deref(), Some("RICE Framework"));
        assert_eq!(reply.key_points.len(), 2);
        assert_eq!(reply.interview_tip, None);
        assert_eq!(reply.related_topics, ["ICE Scoring", "MoSCoW Method"]);
    }

    #[test]
    fn missing_answer_uses_placeholder() {
        let (answer, reply) = Knowledge::parse_reply(&AgentPayload::default());
        assert_eq!(answer, NO_RESPONSE);
        assert_eq!(reply, KnowledgeReply::default());
    }
}
