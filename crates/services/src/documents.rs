use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AgentEndpoint;
use crate::error::DocumentError;

/// A document trained into the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDocument {
    pub file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

/// File contents ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    /// Read `path` into memory.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Io` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "document".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }
}

/// Document management for a knowledge-base collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upload a file and train it into the collection.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Rejected` when the store reports failure, or a
    /// transport error.
    async fn upload_and_train(
        &self,
        collection_id: &str,
        upload: DocumentUpload,
    ) -> Result<(), DocumentError>;

    /// List documents in the collection.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` when the listing cannot be fetched.
    async fn list(&self, collection_id: &str) -> Result<Vec<KnowledgeDocument>, DocumentError>;

    /// Delete documents by file name.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` when the store does not confirm the deletion.
    async fn delete(&self, collection_id: &str, file_names: &[String]) -> Result<(), DocumentError>;
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    documents: Option<Vec<KnowledgeDocument>>,
}

impl StoreResponse {
    fn into_result(self) -> Result<Option<Vec<KnowledgeDocument>>, DocumentError> {
        if self.success {
            Ok(self.documents)
        } else {
            Err(DocumentError::Rejected(
                self.error.unwrap_or_else(|| "request failed".to_owned()),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    file_names: &'a [String],
}

/// `DocumentStore` over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    endpoint: Option<AgentEndpoint>,
}

impl HttpDocumentStore {
    #[must_use]
    pub fn new(endpoint: Option<AgentEndpoint>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        collection_id: &str,
    ) -> Result<reqwest::RequestBuilder, DocumentError> {
        let endpoint = self.endpoint.as_ref().ok_or(DocumentError::Disabled)?;
        let url = endpoint.url(&format!("rag/{collection_id}/documents"));
        let mut builder = self.client.request(method, url);
        if let Some(key) = endpoint.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }
        Ok(builder)
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<StoreResponse, DocumentError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(DocumentError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn upload_and_train(
        &self,
        collection_id: &str,
        upload: DocumentUpload,
    ) -> Result<(), DocumentError> {
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("file", part);
        let builder = self
            .request(reqwest::Method::POST, collection_id)?
            .multipart(form);
        Self::send(builder).await?.into_result().map(|_| ())
    }

    async fn list(&self, collection_id: &str) -> Result<Vec<KnowledgeDocument>, DocumentError> {
        let builder = self.request(reqwest::Method::GET, collection_id)?;
        Ok(Self::send(builder).await?.into_result()?.unwrap_or_default())
    }

    async fn delete(
        &self,
        collection_id: &str,
        file_names: &[String],
    ) -> Result<(), DocumentError> {
        let builder = self
            .request(reqwest::Method::DELETE, collection_id)?
            .json(&DeleteRequest { file_names });
        Self::send(builder).await?.into_result().map(|_| ())
    }
}

/// What happened to an upload, phrased for the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Trained,
    Rejected(String),
    Failed,
}

impl UploadStatus {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            UploadStatus::Trained => "Document uploaded and trained successfully.",
            UploadStatus::Rejected(reason) => reason,
            UploadStatus::Failed => "Upload error. Please try again.",
        }
    }
}

/// Locally cached view of the knowledge-base documents.
///
/// Listing and deletion failures are logged and otherwise ignored.
pub struct KnowledgeBaseDocuments {
    store: Arc<dyn DocumentStore>,
    collection_id: String,
    documents: Mutex<Vec<KnowledgeDocument>>,
}

impl KnowledgeBaseDocuments {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection_id: impl Into<String>) -> Self {
        Self {
            store,
            collection_id: collection_id.into(),
            documents: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn documents(&self) -> Vec<KnowledgeDocument> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reload the document list. Keeps the cached list on failure.
    pub async fn refresh(&self) -> Vec<KnowledgeDocument> {
        match self.store.list(&self.collection_id).await {
            Ok(documents) => {
                *self.documents.lock().unwrap_or_else(PoisonError::into_inner) = documents.clone();
                documents
            }
            Err(err) => {
                warn!(error = %err, "failed to list knowledge-base documents");
                self.documents()
            }
        }
    }

    /// Upload and train a file, then reload the list on success.
    pub async fn upload(&self, upload: DocumentUpload) -> UploadStatus {
        let file_name = upload.file_name.clone();
        match self.store.upload_and_train(&self.collection_id, upload).await {
            Ok(()) => {
                info!(file = %file_name, "document uploaded and trained");
                self.refresh().await;
                UploadStatus::Trained
            }
            Err(DocumentError::Rejected(reason)) => {
                warn!(file = %file_name, %reason, "document upload rejected");
                if reason.trim().is_empty() {
                    UploadStatus::Rejected("Upload failed.".to_owned())
                } else {
                    UploadStatus::Rejected(reason)
                }
            }
            Err(err) => {
                warn!(file = %file_name, error = %err, "document upload failed");
                UploadStatus::Failed
            }
        }
    }

    /// Read `path` and upload it.
    pub async fn upload_path(&self, path: &Path) -> UploadStatus {
        match DocumentUpload::from_path(path).await {
            Ok(upload) => self.upload(upload).await,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read upload");
                UploadStatus::Failed
            }
        }
    }

    /// Delete a document; the cached list drops it once the store confirms.
    pub async fn delete(&self, file_name: &str) -> bool {
        let names = [file_name.to_owned()];
        match self.store.delete(&self.collection_id, &names).await {
            Ok(()) => {
                self.documents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|d| d.file_name != file_name);
                true
            }
            Err(err) => {
                warn!(file = %file_name, error = %err, "failed to delete document");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_document_listing() {
        let response: StoreResponse = serde_json::from_value(json!({
            "success": true,
            "documents": [
                { "fileName": "pm-guide.pdf", "fileType": "pdf", "status": "trained" },
                { "fileName": "notes.txt" }
            ]
        }))
        .unwrap();
        let documents = response.into_result().unwrap().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].status.as_deref(), Some("trained"));
        assert_eq!(documents[1].uploaded_at, None);
    }

    #[test]
    fn unsuccessful_response_is_rejected() {
        let response: StoreResponse =
            serde_json::from_value(json!({ "success": false, "error": "quota exceeded" })).unwrap();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, DocumentError::Rejected(reason) if reason == "quota exceeded"));
    }

    #[test]
    fn upload_status_messages() {
        assert_eq!(
            UploadStatus::Trained.message(),
            "Document uploaded and trained successfully."
        );
        assert_eq!(UploadStatus::Rejected("nope".into()).message(), "nope");
        assert_eq!(UploadStatus::Failed.message(), "Upload error. Please try again.");
    }

    #[tokio::test]
    async fn disabled_store_is_refused() {
        let store = HttpDocumentStore::new(None);
        let err = store.list("rag").await.unwrap_err();
        assert!(matches!(err, DocumentError::Disabled));
    }
}
