use std::time::Duration;

use sitebinder_engine::{SessionError, SessionState, SessionStore, ARTIFACT_NAME};
use tempfile::TempDir;
use uuid::Uuid;

fn store_with_age(root: &TempDir, max_age: Duration) -> SessionStore {
    SessionStore::new(root.path().join("sessions"), max_age).expect("store")
}

fn long_lived_store(root: &TempDir) -> SessionStore {
    store_with_age(root, Duration::from_secs(3600))
}

#[test]
fn create_allocates_a_directory() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    assert!(store.session_dir(id).is_dir());
    assert_eq!(store.state(id), Some(SessionState::Created));
}

#[test]
fn write_artifact_is_atomic_and_advances_state() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    let path = store.write_artifact(id, b"%PDF-fake").unwrap();
    assert_eq!(path.file_name().unwrap(), ARTIFACT_NAME);
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-fake");
    assert_eq!(store.state(id), Some(SessionState::Rendered));

    // Rewriting replaces the artifact in place.
    let again = store.write_artifact(id, b"%PDF-fake-2").unwrap();
    assert_eq!(again, path);
    assert_eq!(std::fs::read(&again).unwrap(), b"%PDF-fake-2");
}

#[test]
fn acknowledged_read_cleans_exactly_once() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    store.write_artifact(id, b"%PDF-fake").unwrap();

    let artifact = store.begin_read(id).unwrap();
    assert!(artifact.is_file());
    assert_eq!(store.state(id), Some(SessionState::Served));

    store.finish_read(id, true);
    assert!(!store.session_dir(id).exists());
    assert_eq!(store.state(id), None);

    // The session is gone; a second acknowledgment cannot find it.
    assert!(matches!(
        store.begin_read(id).unwrap_err(),
        SessionError::NotFound
    ));
}

#[test]
fn unacknowledged_read_defers_cleanup() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    store.write_artifact(id, b"%PDF-fake").unwrap();

    store.begin_read(id).unwrap();
    store.finish_read(id, false);

    assert!(store.session_dir(id).is_dir());
    assert_eq!(store.state(id), Some(SessionState::CleanupDeferred));
}

#[test]
fn read_requires_an_existing_artifact() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    // No artifact written yet: indistinguishable from an unknown session.
    assert!(matches!(
        store.begin_read(id).unwrap_err(),
        SessionError::NotFound
    ));
    assert!(matches!(
        store.begin_read(Uuid::new_v4()).unwrap_err(),
        SessionError::NotFound
    ));
}

#[test]
fn sweep_removes_aged_sessions() {
    let root = TempDir::new().unwrap();
    let store = store_with_age(&root, Duration::ZERO);

    let first = store.create().unwrap();
    let second = store.create().unwrap();
    store.write_artifact(first, b"%PDF-fake").unwrap();

    assert_eq!(store.sweep(), 2);
    assert!(!store.session_dir(first).exists());
    assert!(!store.session_dir(second).exists());
    assert_eq!(store.sweep(), 0);
}

#[test]
fn sweep_skips_sessions_with_active_readers() {
    let root = TempDir::new().unwrap();
    let store = store_with_age(&root, Duration::ZERO);

    let id = store.create().unwrap();
    store.write_artifact(id, b"%PDF-fake").unwrap();
    store.begin_read(id).unwrap();

    // An in-flight download excludes the session from the sweep.
    assert_eq!(store.sweep(), 0);
    assert!(store.session_dir(id).is_dir());

    store.finish_read(id, false);
    assert_eq!(store.sweep(), 1);
    assert!(!store.session_dir(id).exists());
}

#[test]
fn young_sessions_survive_the_sweep() {
    let root = TempDir::new().unwrap();
    let store = long_lived_store(&root);

    let id = store.create().unwrap();
    assert_eq!(store.sweep(), 0);
    assert!(store.session_dir(id).is_dir());
}
