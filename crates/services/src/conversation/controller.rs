use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::agent::{AgentClient, AgentEnvelope, AgentPayload, AgentRequest};
use crate::error::AgentError;
use crate::session_ids::SessionId;

pub const NETWORK_ERROR: &str = "Network error. Please try again.";
pub const NO_RESPONSE: &str = "No response received.";

/// Per-agent behaviour plugged into the generic controller.
pub trait ConversationKind: Send + Sync + 'static {
    /// Structured fields attached to assistant entries.
    type Reply: Clone + Debug + PartialEq + Send + Sync;

    /// Short name used in logs.
    const LABEL: &'static str;

    /// Shown when the agent reports failure without an error text.
    const FAILURE_MESSAGE: &'static str;

    /// Answer text plus typed fields from a successful response.
    fn parse_reply(payload: &AgentPayload) -> (String, Self::Reply);
}

/// One transcript line. User entries are written as soon as a message is
/// accepted; assistant entries only once the agent has answered.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry<R> {
    User { content: String },
    Assistant { content: String, reply: R },
}

impl<R> TranscriptEntry<R> {
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            TranscriptEntry::User { content } | TranscriptEntry::Assistant { content, .. } => {
                content
            }
        }
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, TranscriptEntry::User { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyMessage,
    InFlight,
}

/// Result of a `submit` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<R> {
    /// Rejected before anything was sent. No error is surfaced.
    Ignored(IgnoreReason),
    Answered { content: String, reply: R },
    /// The error message now exposed by `Conversation::error`.
    Failed(String),
}

struct ConversationState<R> {
    phase: ConversationPhase,
    transcript: Vec<TranscriptEntry<R>>,
    error: Option<String>,
}

/// Request/response exchange with one remote agent.
///
/// At most one request is outstanding at a time; further submissions are
/// ignored until it settles. The state lock is never held across the network
/// call.
pub struct Conversation<K: ConversationKind> {
    client: Arc<dyn AgentClient>,
    agent_id: String,
    session_id: SessionId,
    timeout: Duration,
    state: Mutex<ConversationState<K::Reply>>,
    _kind: PhantomData<K>,
}

impl<K: ConversationKind> Conversation<K> {
    #[must_use]
    pub fn new(
        client: Arc<dyn AgentClient>,
        agent_id: impl Into<String>,
        session_id: SessionId,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            agent_id: agent_id.into(),
            session_id,
            timeout,
            state: Mutex::new(ConversationState {
                phase: ConversationPhase::Idle,
                transcript: Vec::new(),
                error: None,
            }),
            _kind: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState<K::Reply>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn phase(&self) -> ConversationPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.phase() == ConversationPhase::Sending
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry<K::Reply>> {
        self.lock().transcript.clone()
    }

    /// Error from the last failed exchange, cleared by the next submission.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Drop the transcript and any error. The session id is kept.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.transcript.clear();
        state.error = None;
    }

    /// Accept `message` and move to `Sending`.
    ///
    /// Appends the user entry immediately and clears the previous error.
    ///
    /// # Errors
    ///
    /// Returns the reason when the message is blank or a request is already
    /// in flight; nothing is changed in that case.
    pub fn begin(&self, message: &str) -> Result<InFlight<'_, K>, IgnoreReason> {
        if message.trim().is_empty() {
            return Err(IgnoreReason::EmptyMessage);
        }
        let mut state = self.lock();
        if state.phase == ConversationPhase::Sending {
            return Err(IgnoreReason::InFlight);
        }
        state.phase = ConversationPhase::Sending;
        state.error = None;
        state.transcript.push(TranscriptEntry::User {
            content: message.to_owned(),
        });
        drop(state);

        Ok(InFlight {
            conversation: self,
            message: message.to_owned(),
            settled: false,
        })
    }

    /// Send `message` and record the outcome.
    pub async fn submit(&self, message: &str) -> SubmitOutcome<K::Reply> {
        let flight = match self.begin(message) {
            Ok(flight) => flight,
            Err(reason) => return SubmitOutcome::Ignored(reason),
        };
        match flight.exchange().await {
            Ok((content, reply)) => flight.succeed(content, reply),
            Err(message) => flight.fail(message),
        }
    }
}

/// A request that has been accepted and not yet settled.
///
/// Dropping it without settling returns the conversation to `Idle` and leaves
/// only the user entry in the transcript.
pub struct InFlight<'a, K: ConversationKind> {
    conversation: &'a Conversation<K>,
    message: String,
    settled: bool,
}

impl<K: ConversationKind> InFlight<'_, K> {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call the agent, bounded by the conversation timeout.
    ///
    /// # Errors
    ///
    /// Returns the user-facing error message for agent-reported failures,
    /// transport errors and timeouts.
    pub async fn exchange(&self) -> Result<(String, K::Reply), String> {
        let conversation = self.conversation;
        let request = AgentRequest {
            message: self.message.clone(),
            agent_id: conversation.agent_id.clone(),
            session_id: conversation.session_id.to_string(),
        };

        let result = tokio::time::timeout(conversation.timeout, conversation.client.call(&request))
            .await
            .unwrap_or_else(|_| Err(AgentError::Timeout(conversation.timeout)));

        match result {
            Ok(AgentEnvelope {
                success: true,
                response,
                ..
            }) => {
                let payload = response.unwrap_or_default();
                debug!(conversation = K::LABEL, "agent answered");
                Ok(K::parse_reply(&payload))
            }
            Ok(AgentEnvelope { error, .. }) => {
                let message = error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| K::FAILURE_MESSAGE.to_owned());
                warn!(conversation = K::LABEL, error = %message, "agent reported failure");
                Err(message)
            }
            Err(AgentError::Disabled) => {
                warn!(conversation = K::LABEL, "agent service is not configured");
                Err(AgentError::Disabled.to_string())
            }
            Err(err) => {
                warn!(conversation = K::LABEL, error = %err, "agent request failed");
                Err(NETWORK_ERROR.to_owned())
            }
        }
    }

    /// Append the assistant entry and return to `Idle`.
    pub fn succeed(mut self, content: String, reply: K::Reply) -> SubmitOutcome<K::Reply> {
        let mut state = self.conversation.lock();
        state.transcript.push(TranscriptEntry::Assistant {
            content: content.clone(),
            reply: reply.clone(),
        });
        state.phase = ConversationPhase::Idle;
        drop(state);
        self.settled = true;
        SubmitOutcome::Answered { content, reply }
    }

    /// Surface `message` and return to `Idle`. The transcript keeps only the
    /// user entry.
    pub fn fail(mut self, message: String) -> SubmitOutcome<K::Reply> {
        let mut state = self.conversation.lock();
        state.error = Some(message.clone());
        state.phase = ConversationPhase::Idle;
        drop(state);
        self.settled = true;
        SubmitOutcome::Failed(message)
    }
}

impl<K: ConversationKind> Drop for InFlight<'_, K> {
    fn drop(&mut self) {
        if !self.settled {
            self.conversation.lock().phase = ConversationPhase::Idle;
        }
    }
}
