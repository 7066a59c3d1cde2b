//! Integration test: profiles survive a restart on a sled store, and telex codes move a
//! profile between two independent stores.
//!
//! ## Scenario
//! 1. Log in on "device A", study, and close the store.
//! 2. Reopen the same directory and resume from the current-user pointer.
//! 3. Export a telex code and apply it on "device B".
//! 4. A broken code leaves device B exactly as it was.

use rio_core::{ProfileStore, RioError, SledStore, SoundCues, StudySession, CURRENT_USER_KEY, USER_KEY_PREFIX};
use rio_core::KeyValueStore;
use std::sync::Arc;
use tempfile::tempdir;

fn sled_session(path: &std::path::Path) -> StudySession {
    let store = SledStore::open_path(path).unwrap();
    StudySession::new(ProfileStore::new(Arc::new(store)), SoundCues::default())
}

#[test]
fn progress_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profiles");

    {
        let mut session = sled_session(&path);
        session.login("rodrigo").unwrap();
        session.toggle_theory("hb-1").unwrap();
        session.record_study_minutes("hb-1", 50).unwrap();
        session.record_submission(Some(8.25)).unwrap();
    }

    let mut session = sled_session(&path);
    let state = session.resume().expect("pointer should name rodrigo").clone();
    assert_eq!(state.username, "rodrigo");
    // 50 (theory) + 25 (minutes) + 150 (submission) = 225 → level 2 with 25 left
    assert_eq!((state.level, state.xp), (2, 25));
    assert_eq!(state.submissions_count, 1);
    assert_eq!(state.topic("hb-1").study_minutes, 50);
    assert!(state.unlocked_reward_ids.contains("connectors"));
}

#[test]
fn telex_moves_profile_between_devices() {
    let mut device_a = StudySession::new(ProfileStore::in_memory(), SoundCues::default());
    device_a.login("rodrigo").unwrap();
    device_a.add_experience(420).unwrap();
    device_a.toggle_flashcards("geo-2").unwrap();
    let code = device_a.sync_code().unwrap();

    let mut device_b = StudySession::new(ProfileStore::in_memory(), SoundCues::default());
    let imported = device_b.apply_sync_code(&code).unwrap().clone();
    assert_eq!(&imported, device_a.state().unwrap());
    assert_eq!(device_b.profiles().current_user().as_deref(), Some("rodrigo"));
    assert_eq!(device_b.profiles().load("rodrigo"), Some(imported));
}

#[test]
fn broken_telex_writes_nothing() {
    let dir = tempdir().unwrap();
    let store = Arc::new(SledStore::open_path(dir.path().join("profiles")).unwrap());
    let mut session = StudySession::new(ProfileStore::new(store.clone()), SoundCues::default());

    let err = session.apply_sync_code("not-valid-base64!!!").unwrap_err();
    assert!(matches!(err, RioError::Decode(_)));
    assert!(session.state().is_none());
    assert!(store.get(CURRENT_USER_KEY).unwrap().is_none());
    assert!(store.keys_with_prefix(USER_KEY_PREFIX).unwrap().is_empty());
}

#[test]
fn telex_overwrites_local_progress() {
    let mut source = StudySession::new(ProfileStore::in_memory(), SoundCues::default());
    source.login("rodrigo").unwrap();
    let code = source.sync_code().unwrap();

    let mut target = StudySession::new(ProfileStore::in_memory(), SoundCues::default());
    target.login("rodrigo").unwrap();
    target.add_experience(150).unwrap();
    let state = target.apply_sync_code(&code).unwrap();
    assert_eq!(state.xp, 0);
}
