mod support;

use std::sync::Arc;

use services::{DocumentUpload, UploadStatus};
use storage::repository::Storage;
use tutor_core::Clock;
use tutor_core::time::fixed_now;

use support::{FakeDocumentStore, ScriptedAgent, services_with};

fn upload(name: &str) -> DocumentUpload {
    DocumentUpload {
        file_name: name.to_owned(),
        bytes: b"Product sense notes".to_vec(),
    }
}

#[tokio::test]
async fn upload_refreshes_list_and_delete_removes_entry() {
    let storage = Storage::in_memory();
    let store = Arc::new(FakeDocumentStore::default());
    let services = services_with(
        &storage,
        Clock::fixed(fixed_now()),
        Arc::new(ScriptedAgent::new()),
        store.clone(),
    )
    .await;
    let documents = services.documents();
    assert!(documents.refresh().await.is_empty());

    let status = documents.upload(upload("frameworks.pdf")).await;
    assert_eq!(status, UploadStatus::Trained);
    assert_eq!(status.message(), "Document uploaded and trained successfully.");
    let listed = documents.documents();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "frameworks.pdf");

    assert!(documents.delete("frameworks.pdf").await);
    assert!(documents.documents().is_empty());
    assert!(store.documents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_upload_reports_reason_or_generic_failure() {
    let storage = Storage::in_memory();
    let store = Arc::new(FakeDocumentStore::default());
    let services = services_with(
        &storage,
        Clock::fixed(fixed_now()),
        Arc::new(ScriptedAgent::new()),
        store.clone(),
    )
    .await;
    let documents = services.documents();

    *store.reject_with.lock().unwrap() = Some("Unsupported file type".into());
    let status = documents.upload(upload("notes.exe")).await;
    assert_eq!(status.message(), "Unsupported file type");

    *store.reject_with.lock().unwrap() = Some(String::new());
    let status = documents.upload(upload("notes.exe")).await;
    assert_eq!(status.message(), "Upload failed.");
    assert!(documents.documents().is_empty());
}

#[tokio::test]
async fn offline_store_keeps_cached_list() {
    let storage = Storage::in_memory();
    let store = Arc::new(FakeDocumentStore::default());
    let services = services_with(
        &storage,
        Clock::fixed(fixed_now()),
        Arc::new(ScriptedAgent::new()),
        store.clone(),
    )
    .await;
    let documents = services.documents();
    documents.upload(upload("guide.md")).await;
    assert_eq!(documents.documents().len(), 1);

    *store.offline.lock().unwrap() = true;
    assert_eq!(documents.refresh().await.len(), 1);
    assert_eq!(
        documents.upload(upload("other.md")).await,
        UploadStatus::Failed
    );
    assert!(!documents.delete("guide.md").await);
    assert_eq!(documents.documents().len(), 1);
}

#[tokio::test]
async fn missing_file_is_an_upload_error() {
    let storage = Storage::in_memory();
    let services = services_with(
        &storage,
        Clock::fixed(fixed_now()),
        Arc::new(ScriptedAgent::new()),
        Arc::new(FakeDocumentStore::default()),
    )
    .await;
    let status = services
        .documents()
        .upload_path(std::path::Path::new("/definitely/not/here.pdf"))
        .await;
    assert_eq!(status.message(), "Upload error. Please try again.");
}
