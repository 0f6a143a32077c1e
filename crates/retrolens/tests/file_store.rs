use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use retrolens::feedback::{FeedbackItem, FeedbackType, ReactionChange, ReactionType, Retrospective};
use retrolens::store::file::SCHEMA_VERSION;
use retrolens::store::{FeedbackSource, FileStore, RetroStore, StoreError, ThemeStore};
use retrolens::themes::Theme;

fn theme(retro_id: &str, name: &str, ids: &[&str]) -> Theme {
  Theme {
    name: name.to_string(),
    retro_id: retro_id.to_string(),
    feedback_ids: ids.iter().map(|id| id.to_string()).collect(),
    theme_type: "all".to_string(),
    embedding: Some(vec![0.25, 0.75]),
  }
}

#[tokio::test]
async fn test_missing_file_reads_as_empty_store() {
  let temp = TempDir::new().unwrap();
  let store = FileStore::new(temp.path().join("nested").join("retrolens.json"));

  assert!(store.list_retros().await.unwrap().is_empty());
  assert!(!store.path().exists());
}

#[tokio::test]
async fn test_writes_survive_reopening() {
  let temp = TempDir::new().unwrap();
  let path = temp.path().join("data").join("retrolens.json");

  let retro_id = {
    let store = FileStore::new(&path);
    let retro = store.create_retro(Retrospective::new("Q3 wrap-up".into(), None, "Search".into())).await.unwrap();
    let item = store
      .add_feedback(FeedbackItem::new(&retro.id, FeedbackType::Well, "Index rebuild was quick"))
      .await
      .unwrap();
    store.toggle_reaction(&item.id, "kim", ReactionType::Thumbsup).await.unwrap();
    store.upsert_themes(&[theme(&retro.id, "Index rebuild was quick", &[&item.id])]).await.unwrap();
    retro.id
  };

  let reopened = FileStore::new(&path);
  let retro = reopened.get_retro(&retro_id).await.unwrap();
  assert_eq!(retro.sprint_title(), "Q3 wrap-up");

  let feedback = reopened.feedback_for(&retro_id, None).await.unwrap();
  assert_eq!(feedback.len(), 1);
  assert_eq!(reopened.reactions_for(&feedback[0].id).await.unwrap().thumbsup, 1);
  assert_eq!(reopened.user_reaction(&feedback[0].id, "kim").await.unwrap(), Some(ReactionType::Thumbsup));

  let themes = reopened.themes_for(&retro_id).await.unwrap();
  assert_eq!(themes.len(), 1);
  assert_eq!(themes[0].embedding, Some(vec![0.25, 0.75]));

  let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert_eq!(raw["schema_version"], SCHEMA_VERSION);
}

#[tokio::test]
async fn test_upsert_twice_keeps_one_row_per_name() {
  let temp = TempDir::new().unwrap();
  let store = FileStore::new(temp.path().join("retrolens.json"));

  store.upsert_themes(&[theme("r1", "Flaky tests", &["a"]), theme("r1", "Slow CI", &["b"])]).await.unwrap();
  store.upsert_themes(&[theme("r1", "Flaky tests", &["a", "c"]), theme("r1", "Slow CI", &["b"])]).await.unwrap();

  let themes = store.themes_for("r1").await.unwrap();
  assert_eq!(themes.len(), 2);
  assert_eq!(themes[0].feedback_ids, vec!["a", "c"]);
}

#[tokio::test]
async fn test_v1_document_is_migrated_on_load() {
  let temp = TempDir::new().unwrap();
  let path = temp.path().join("retrolens.json");
  let v1 = json!({
    "retrospectives": [{
      "id": "legacy",
      "sprint_name": "",
      "sprint_number": "21",
      "team_name": "Mobile",
      "created_at": "2023-11-02T15:00:00Z"
    }],
    "feedback": [{
      "id": "f1",
      "retro_id": "legacy",
      "type": "didnt",
      "message": "App review took a week",
      "created_at": "2023-11-02T15:05:00Z"
    }],
    "themes": []
  });
  std::fs::write(&path, v1.to_string()).unwrap();

  let store = FileStore::new(&path);
  let retro = store.get_retro("legacy").await.unwrap();
  assert_eq!(retro.sprint_title(), "Sprint 21");

  let (change, counts) = store.toggle_reaction("f1", "ana", ReactionType::Thumbsdown).await.unwrap();
  assert_eq!(change, ReactionChange::Added);
  assert_eq!(counts.thumbsdown, 1);

  let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert_eq!(raw["schema_version"], SCHEMA_VERSION);
  assert_eq!(raw["reactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_newer_document_is_refused() {
  let temp = TempDir::new().unwrap();
  let path = temp.path().join("retrolens.json");
  std::fs::write(&path, json!({"schema_version": SCHEMA_VERSION + 5}).to_string()).unwrap();

  let store = FileStore::new(&path);
  let result = store.list_retros().await;

  assert!(matches!(result, Err(StoreError::UnsupportedSchema { .. })));
}

#[tokio::test]
async fn test_concurrent_writers_do_not_lose_updates() {
  let temp = TempDir::new().unwrap();
  let store = Arc::new(FileStore::new(temp.path().join("retrolens.json")));
  let retro = store.create_retro(Retrospective::new("S1".into(), None, "Core".into())).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..10 {
    let store = store.clone();
    let retro_id = retro.id.clone();
    handles.push(tokio::spawn(async move {
      store.add_feedback(FeedbackItem::new(&retro_id, FeedbackType::Suggestion, &format!("idea {i}"))).await
    }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  assert_eq!(store.feedback_for(&retro.id, None).await.unwrap().len(), 10);
}
