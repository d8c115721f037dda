#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use services::{
    AgentClient, AgentConfig, AgentEnvelope, AgentError, AgentRequest, AppServices, Clock,
    DocumentError, DocumentStore, DocumentUpload, KnowledgeDocument,
};
use storage::repository::Storage;
use tokio::sync::Notify;

/// Agent that answers from a queue and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<Result<AgentEnvelope, AgentError>>>,
    requests: Mutex<Vec<AgentRequest>>,
    gate: Option<Gate>,
}

/// Holds each call until released.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            ..Self::default()
        }
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("agent is gated")
    }

    pub fn push(&self, reply: Result<AgentEnvelope, AgentError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_result(&self, value: Value) {
        self.push(Ok(AgentEnvelope::success(object(value))));
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn call(&self, request: &AgentRequest) -> Result<AgentEnvelope, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Transport("no scripted reply".into())))
    }
}

/// Agent that never answers.
pub struct SilentAgent;

#[async_trait]
impl AgentClient for SilentAgent {
    async fn call(&self, _request: &AgentRequest) -> Result<AgentEnvelope, AgentError> {
        std::future::pending().await
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct FakeDocumentStore {
    pub documents: Mutex<Vec<KnowledgeDocument>>,
    pub reject_with: Mutex<Option<String>>,
    pub offline: Mutex<bool>,
}

impl FakeDocumentStore {
    fn check_online(&self) -> Result<(), DocumentError> {
        if *self.offline.lock().unwrap() {
            Err(DocumentError::Disabled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn upload_and_train(
        &self,
        _collection_id: &str,
        upload: DocumentUpload,
    ) -> Result<(), DocumentError> {
        self.check_online()?;
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(DocumentError::Rejected(reason));
        }
        self.documents.lock().unwrap().push(KnowledgeDocument {
            file_name: upload.file_name,
            file_type: None,
            status: Some("trained".into()),
            uploaded_at: None,
        });
        Ok(())
    }

    async fn list(&self, _collection_id: &str) -> Result<Vec<KnowledgeDocument>, DocumentError> {
        self.check_online()?;
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn delete(
        &self,
        _collection_id: &str,
        file_names: &[String],
    ) -> Result<(), DocumentError> {
        self.check_online()?;
        self.documents
            .lock()
            .unwrap()
            .retain(|d| !file_names.contains(&d.file_name));
        Ok(())
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub async fn services_with(
    storage: &Storage,
    clock: Clock,
    agent: Arc<dyn AgentClient>,
    store: Arc<dyn DocumentStore>,
) -> AppServices {
    AppServices::with_clients(storage, &AgentConfig::default(), clock, agent, store).await
}
