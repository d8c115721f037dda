use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::warn;

use tutor_core::model::{ExerciseRecord, ExperienceLevel, ModuleCatalog, ModuleId, ProgressError};

use crate::agent::{AgentClient, AgentPayload};
use crate::progress::ProgressTracker;
use crate::session_ids::SessionId;

use super::controller::{Conversation, ConversationKind, NO_RESPONSE, SubmitOutcome};

/// Module selected when the tutor starts.
const DEFAULT_MODULE: &str = "product-strategy";

/// Tutor agent conversation.
#[derive(Debug, Clone, Copy)]
pub struct Tutor;

/// Structured fields of a tutor answer. A present `score` means the answer
/// evaluated an exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorReply {
    pub score: Option<String>,
    pub feedback_summary: Option<String>,
    pub exercise_topic: Option<String>,
    pub exercise_number: Option<String>,
    pub difficulty_level: Option<String>,
}

impl ConversationKind for Tutor {
    type Reply = TutorReply;

    const LABEL: &'static str = "tutor";
    const FAILURE_MESSAGE: &'static str = "Failed to get response from tutor agent.";

    fn parse_reply(payload: &AgentPayload) -> (String, TutorReply) {
        let answer = payload
            .answer_text(&["response", "text"])
            .unwrap_or_else(|| NO_RESPONSE.to_owned());
        let reply = TutorReply {
            score: payload.field("score"),
            feedback_summary: payload.field("feedback_summary"),
            exercise_topic: payload.field("exercise_topic"),
            exercise_number: payload.field("exercise_number"),
            difficulty_level: payload.field("difficulty_level"),
        };
        (answer, reply)
    }
}

/// Exercise practice with the tutor agent.
///
/// Scored answers are recorded against the module that was selected when the
/// message was submitted.
pub struct TutorConversation {
    conversation: Conversation<Tutor>,
    progress: Arc<ProgressTracker>,
    selected: Mutex<ModuleId>,
}

impl TutorConversation {
    #[must_use]
    pub fn new(
        client: Arc<dyn AgentClient>,
        agent_id: impl Into<String>,
        session_id: SessionId,
        timeout: Duration,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        let selected = initial_module(progress.catalog());
        Self {
            conversation: Conversation::new(client, agent_id, session_id, timeout),
            progress,
            selected: Mutex::new(selected),
        }
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation<Tutor> {
        &self.conversation
    }

    #[must_use]
    pub fn selected_module(&self) -> ModuleId {
        self.selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch to another module and start a fresh transcript.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownModule` if `id` is not in the catalog.
    pub fn select_module(&self, id: &str) -> Result<(), ProgressError> {
        let module = self
            .progress
            .catalog()
            .get(id)
            .ok_or_else(|| ProgressError::UnknownModule(ModuleId::new(id)))?;
        *self.selected.lock().unwrap_or_else(PoisonError::into_inner) = module.id().clone();
        self.conversation.clear();
        Ok(())
    }

    /// Ask the tutor for the next exercise in the selected module.
    pub async fn start_exercise(&self, level: ExperienceLevel) -> SubmitOutcome<TutorReply> {
        let module_id = self.selected_module();
        let name = module_name(self.progress.catalog(), &module_id);
        let next = self.progress.exercise_count(&module_id).await + 1;
        let prompt = format!(
            "Start a new exercise for me. Topic: {name}. Difficulty: {level}. Exercise number: {next}."
        );
        self.submit(&prompt).await
    }

    /// Send `message` to the tutor; record the exercise if the answer is scored.
    pub async fn submit(&self, message: &str) -> SubmitOutcome<TutorReply> {
        let module_id = self.selected_module();
        let flight = match self.conversation.begin(message) {
            Ok(flight) => flight,
            Err(reason) => return SubmitOutcome::Ignored(reason),
        };

        match flight.exchange().await {
            Ok((content, reply)) => {
                if let Some(score) = reply.score.clone() {
                    self.record_scored(&module_id, score, &reply).await;
                }
                flight.succeed(content, reply)
            }
            Err(message) => flight.fail(message),
        }
    }

    async fn record_scored(&self, module_id: &ModuleId, score: String, reply: &TutorReply) {
        let topic = reply
            .exercise_topic
            .clone()
            .unwrap_or_else(|| module_name(self.progress.catalog(), module_id));
        let exercise_number = match &reply.exercise_number {
            Some(number) => number.clone(),
            None => (self.progress.exercise_count(module_id).await + 1).to_string(),
        };
        let record = ExerciseRecord::new(
            score,
            reply.feedback_summary.clone().unwrap_or_default(),
            self.progress.today(),
            topic,
            exercise_number,
        );

        if let Err(err) = self.progress.record_exercise(module_id, record).await {
            warn!(module = %module_id, error = %err, "failed to record exercise");
        }
    }
}

fn initial_module(catalog: &ModuleCatalog) -> ModuleId {
    catalog
        .get(DEFAULT_MODULE)
        .or_else(|| catalog.modules().first())
        .map_or_else(|| ModuleId::new(DEFAULT_MODULE), |m| m.id().clone())
}

fn module_name(catalog: &ModuleCatalog, id: &ModuleId) -> String {
    catalog
        .get(id.as_str())
        .map_or_else(String::new, |m| m.name().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tutor_core::model::Module;

    #[test]
    fn parses_score_and_metadata() {
        let payload: AgentPayload = serde_json::from_value(json!({
            "result": {
                "response": "Nice work",
                "score": "8",
                "feedback_summary": "Clear segments",
                "exercise_topic": "Product Design",
                "exercise_number": "",
                "difficulty_level": "Intermediate"
            }
        }))
        .unwrap();

        let (answer, reply) = Tutor::parse_reply(&payload);
        assert_eq!(answer, "Nice work");
        assert_eq!(reply.score.as_deref(), Some("8"));
        assert_eq!(reply.exercise_number, None);
        assert_eq!(reply.difficulty_level.as_deref(), Some("Intermediate"));
    }

    #[test]
    fn initial_module_prefers_strategy_then_first() {
        assert_eq!(
            initial_module(&ModuleCatalog::default()).as_str(),
            "product-strategy"
        );
        let custom = ModuleCatalog::new(vec![Module::new("x", "X", "").unwrap()]).unwrap();
        assert_eq!(initial_module(&custom).as_str(), "x");
    }
}
