use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use droneclear::api::{BuildStore, CatalogSource, CategoryInfo};
use droneclear::build::SavedBuild;
use droneclear::catalog::{Component, Slot, StaticCatalog};
use droneclear::config::default_config;
use droneclear::error::{DroneClearError, Result};
use droneclear::session::{CategoryOutcome, Session};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn catalog() -> StaticCatalog {
    StaticCatalog::from_file(&fixture_path("catalog.json")).expect("Failed to load fixture")
}

/// Saved builds kept in memory.
#[derive(Default)]
struct MemoryStore {
    builds: Mutex<BTreeMap<String, SavedBuild>>,
}

#[async_trait]
impl BuildStore for MemoryStore {
    async fn save_build(&self, build: &SavedBuild) -> Result<SavedBuild> {
        self.builds
            .lock()
            .unwrap()
            .insert(build.pid.clone(), build.clone());
        Ok(build.clone())
    }

    async fn list_saved_builds(&self) -> Result<Vec<SavedBuild>> {
        Ok(self.builds.lock().unwrap().values().cloned().collect())
    }

    async fn get_saved_build(&self, pid: &str) -> Result<SavedBuild> {
        self.builds
            .lock()
            .unwrap()
            .get(pid)
            .cloned()
            .ok_or_else(|| DroneClearError::NotFound(pid.to_string()))
    }

    async fn delete_saved_build(&self, pid: &str) -> Result<()> {
        self.builds.lock().unwrap().remove(pid);
        Ok(())
    }
}

/// A backend that is down.
struct OfflineSource;

#[async_trait]
impl CatalogSource for OfflineSource {
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>> {
        Err(DroneClearError::Network("connection refused".to_string()))
    }

    async fn list_components(&self, _slot: Slot) -> Result<Vec<Component>> {
        Err(DroneClearError::Network("connection refused".to_string()))
    }
}

async fn session_with(parts: &[(Slot, &str)], source: &dyn CatalogSource) -> Session {
    let mut session = Session::new(default_config().wizard.steps);
    for (slot, pid) in parts {
        session.show_category(source, *slot).await;
        let component = session
            .registry()
            .get(*slot, pid)
            .unwrap_or_else(|| panic!("{} missing from fixture", pid));
        session.add_to_build(component, false);
    }
    session
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let source = catalog();
    let store = MemoryStore::default();
    let session = session_with(
        &[
            (Slot::Frames, "FRM-APEX5"),
            (Slot::Stacks, "STK-F7-55A"),
            (Slot::Batteries, "BAT-6S-1300"),
        ],
        &source,
    )
    .await;

    let saved = session
        .save_build(&store, "  Apex Freestyle ", "Daily basher")
        .await
        .unwrap();
    assert!(saved.pid.starts_with("BUILD-"));
    assert_eq!(saved.name, "Apex Freestyle");
    assert_eq!(saved.relations.get("stacks").map(String::as_str), Some("STK-F7-55A"));

    let mut fresh = Session::new(default_config().wizard.steps);
    let report = fresh.load_build(&store, &source, &saved.pid).await.unwrap();
    assert_eq!(report.restored, 3);
    assert!(report.dropped.is_empty());
    assert_eq!(fresh.build(), session.build(), "Rehydrated build should match the saved one");
    assert_eq!(fresh.warnings(), session.warnings());
}

#[tokio::test]
async fn test_save_rejects_empty_name_and_empty_build() {
    let source = catalog();
    let store = MemoryStore::default();

    let empty = Session::new(default_config().wizard.steps);
    let err = empty.save_build(&store, "Nothing", "").await.unwrap_err();
    assert!(matches!(err, DroneClearError::InvalidInput(_)), "Got {:?}", err);

    let session = session_with(&[(Slot::Frames, "FRM-APEX5")], &source).await;
    let err = session.save_build(&store, "   ", "").await.unwrap_err();
    assert!(matches!(err, DroneClearError::InvalidInput(_)), "Got {:?}", err);
    assert!(store.list_saved_builds().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_load_drops_unresolvable_relations() {
    let source = catalog();
    let store = MemoryStore::default();
    let mut record = SavedBuild {
        pid: "BUILD-OLD".to_string(),
        name: "Old build".to_string(),
        description: String::new(),
        image_file: None,
        pdf_file: None,
        vehicle_type: None,
        build_class: None,
        relations: BTreeMap::new(),
    };
    record.relations.insert("frames".to_string(), "FRM-APEX5".to_string());
    record.relations.insert("motors".to_string(), "MTR-DISCONTINUED".to_string());
    record.relations.insert("gimbals".to_string(), "GMB-1".to_string());
    store.save_build(&record).await.unwrap();

    let mut session = Session::new(default_config().wizard.steps);
    let report = session.load_build(&store, &source, "BUILD-OLD").await.unwrap();

    assert_eq!(report.restored, 1);
    let mut dropped: Vec<&str> = report.dropped.iter().map(|d| d.pid.as_str()).collect();
    dropped.sort();
    assert_eq!(dropped, vec!["GMB-1", "MTR-DISCONTINUED"]);
    assert!(session.build().is_filled(Slot::Frames));
    assert!(!session.build().is_filled(Slot::Motors));
}

#[tokio::test]
async fn test_failed_load_keeps_current_build() {
    let source = catalog();
    let store = MemoryStore::default();
    let mut session = session_with(&[(Slot::Frames, "FRM-APEX5")], &source).await;
    let before = session.build().serialize();

    let err = session.load_build(&store, &source, "BUILD-MISSING").await.unwrap_err();
    assert!(matches!(err, DroneClearError::NotFound(_)));
    assert_eq!(session.build().serialize(), before);

    let saved = session.save_build(&store, "Keep", "").await.unwrap();
    let mut other = Session::new(default_config().wizard.steps);
    assert!(other.load_build(&store, &OfflineSource, &saved.pid).await.is_err());
    assert!(other.build().is_empty(), "A failed fetch leaves the build untouched");
}

#[tokio::test]
async fn test_offline_category_fetch_is_not_fatal() {
    let source = catalog();
    let mut session = session_with(&[(Slot::Frames, "FRM-APEX5")], &source).await;

    let outcome = session.show_category(&OfflineSource, Slot::Motors).await;
    assert!(matches!(outcome, CategoryOutcome::Failed(ref m) if m.contains("connection refused")));
    assert!(session.build().is_filled(Slot::Frames));
    assert!(!session.registry().is_cached(Slot::Motors));

    let outcome = session.show_category(&OfflineSource, Slot::Frames).await;
    assert_eq!(outcome, CategoryOutcome::Displayed(4), "Cached categories need no fetch");
}

#[tokio::test]
async fn test_late_result_for_previous_category_is_stale() {
    let source = catalog();
    let mut session = Session::new(default_config().wizard.steps);

    session.begin_category(Slot::Frames);
    let frames = source.list_components(Slot::Frames).await;
    session.begin_category(Slot::Motors);
    let motors = source.list_components(Slot::Motors).await;

    assert_eq!(session.complete_category(Slot::Motors, motors), CategoryOutcome::Displayed(3));
    assert_eq!(session.complete_category(Slot::Frames, frames), CategoryOutcome::Stale);
    assert_eq!(session.displayed_category(), Some(Slot::Motors));
    assert!(session.registry().is_cached(Slot::Frames), "Stale results are still cached");
}
