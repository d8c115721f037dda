use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AgentEndpoint;
use crate::error::AgentError;

/// One prompt sent to an agent within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRequest {
    pub message: String,
    pub agent_id: String,
    pub session_id: String,
}

/// Envelope returned by the agent service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<AgentPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Agent output. `result` carries the structured fields, whose shape depends
/// on the agent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentPayload {
    #[serde(default)]
    pub result: Option<Map<String, Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AgentEnvelope {
    #[must_use]
    pub fn success(result: Map<String, Value>) -> Self {
        Self {
            success: true,
            response: Some(AgentPayload {
                result: Some(result),
                message: None,
            }),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.into()),
        }
    }
}

impl AgentPayload {
    /// Text of a structured field. Empty strings count as absent.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<String> {
        self.result.as_ref()?.get(key).and_then(value_text)
    }

    /// List-valued field, given either as an array or a comma-separated string.
    #[must_use]
    pub fn list_field(&self, key: &str) -> Vec<String> {
        let Some(value) = self.result.as_ref().and_then(|r| r.get(key)) else {
            return Vec::new();
        };
        match value {
            Value::Array(items) => items.iter().filter_map(value_text).collect(),
            other => value_text(other)
                .map(|text| {
                    text.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// First present field among `keys`, then the top-level message.
    #[must_use]
    pub fn answer_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.field(key))
            .or_else(|| self.message.clone().filter(|m| !m.trim().is_empty()))
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Transport to the external agent service.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Send one prompt and return the service's envelope.
    ///
    /// # Errors
    ///
    /// Returns `AgentError` when the request cannot be completed. An envelope
    /// with `success: false` is not an error at this level.
    async fn call(&self, request: &AgentRequest) -> Result<AgentEnvelope, AgentError>;
}

/// `AgentClient` over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpAgentClient {
    client: Client,
    endpoint: Option<AgentEndpoint>,
}

impl HttpAgentClient {
    #[must_use]
    pub fn new(endpoint: Option<AgentEndpoint>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn call(&self, request: &AgentRequest) -> Result<AgentEnvelope, AgentError> {
        let endpoint = self.endpoint.as_ref().ok_or(AgentError::Disabled)?;

        let mut builder = self.client.post(endpoint.url("agent/chat")).json(request);
        if let Some(key) = endpoint.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(AgentError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> AgentPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decodes_envelope_with_nested_result() {
        let envelope: AgentEnvelope = serde_json::from_value(json!({
            "success": true,
            "response": { "result": { "response": "Hi", "score": 8 } }
        }))
        .unwrap();
        let payload = envelope.response.unwrap();
        assert_eq!(payload.field("response").as_deref(), Some("Hi"));
        assert_eq!(payload.field("score").as_deref(), Some("8"));
    }

    #[test]
    fn empty_and_missing_fields_are_absent() {
        let p = payload(json!({ "result": { "score": "", "topic": null } }));
        assert_eq!(p.field("score"), None);
        assert_eq!(p.field("topic"), None);
        assert_eq!(p.field("missing"), None);
    }

    #[test]
    fn answer_falls_back_through_keys_then_message() {
        let p = payload(json!({ "result": { "text": "from text" }, "message": "from message" }));
        assert_eq!(p.answer_text(&["response", "text"]).as_deref(), Some("from text"));

        let p = payload(json!({ "result": {}, "message": "from message" }));
        assert_eq!(p.answer_text(&["response", "text"]).as_deref(), Some("from message"));

        assert_eq!(AgentPayload::default().answer_text(&["response"]), None);
    }

    #[test]
    fn list_field_accepts_csv_or_array() {
        let p = payload(json!({ "result": {
            "key_points": "Reach, Impact ,,Confidence",
            "related_topics": ["ICE", "", "Kano"]
        }}));
        assert_eq!(p.list_field("key_points"), ["Reach", "Impact", "Confidence"]);
        assert_eq!(p.list_field("related_topics"), ["ICE", "Kano"]);
        assert!(p.list_field("missing").is_empty());
    }

    #[tokio::test]
    async fn disabled_client_refuses_calls() {
        let client = HttpAgentClient::new(None);
        assert!(!client.enabled());
        let err = client
            .call(&AgentRequest {
                message: "hi".into(),
                agent_id: "a".into(),
                session_id: "s".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Disabled));
    }
}
