use storage::repository::{KeyValueRepository, StateKey, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_persists_state_blobs() {
    let repo = SqliteRepository::connect(
        "sqlite:file:memdb_state_roundtrip?mode=memory&cache=shared",
    )
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get(StateKey::Progress).await.unwrap(), None);

    let blob = r#"{"product-design":{"exercises":[],"lastActivity":""}}"#;
    repo.put(StateKey::Progress, blob).await.unwrap();
    repo.put(StateKey::ExperienceLevel, "Intermediate").await.unwrap();

    assert_eq!(repo.get(StateKey::Progress).await.unwrap().as_deref(), Some(blob));
    assert_eq!(
        repo.get(StateKey::ExperienceLevel).await.unwrap().as_deref(),
        Some("Intermediate")
    );
    assert_eq!(repo.get(StateKey::Streak).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_put_overwrites_and_remove_clears() {
    let repo = SqliteRepository::connect(
        "sqlite:file:memdb_state_overwrite?mode=memory&cache=shared",
    )
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.put(StateKey::Streak, r#"{"lastDate":"2026-02-20","count":5}"#)
        .await
        .unwrap();
    repo.put(StateKey::Streak, r#"{"lastDate":"2026-02-21","count":6}"#)
        .await
        .unwrap();
    assert_eq!(
        repo.get(StateKey::Streak).await.unwrap().as_deref(),
        Some(r#"{"lastDate":"2026-02-21","count":6}"#)
    );

    repo.remove(StateKey::Streak).await.unwrap();
    assert_eq!(repo.get(StateKey::Streak).await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_state_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.put(StateKey::ExperienceLevel, "Advanced").await.unwrap();
    repo.migrate().await.expect("second migrate");

    assert_eq!(
        repo.get(StateKey::ExperienceLevel).await.unwrap().as_deref(),
        Some("Advanced")
    );
}

#[tokio::test]
async fn storage_sqlite_wires_state_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_state_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.state.put(StateKey::Progress, "{}").await.unwrap();
    assert_eq!(
        storage.state.get(StateKey::Progress).await.unwrap().as_deref(),
        Some("{}")
    );
}
