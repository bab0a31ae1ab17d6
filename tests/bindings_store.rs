//! Integration tests for binding persistence.
//!
//! Saved bindings must reload with the same per-signal order, and the
//! resolver must see exactly what was saved.

use irplus::store::{ConfigStore, StoreError};
use irplus_engine::{
    modes, ActionId, ActionResolver, Arrow, Bindings, ConcreteAction, Digit, Direction, KeySymbol,
    Mode, NamedKey, RampConfig, Signal, Timing,
};

fn sig(code: &str) -> Signal {
    Signal::new(code).unwrap()
}

fn store() -> (tempfile::TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("irplus").join("bindings.toml"));
    (dir, store)
}

// ── Save → load ──

#[test]
fn roundtrip_preserves_order() {
    let (_dir, store) = store();
    let mut bindings = Bindings::new();
    let list = vec![
        ActionId::MoveMouse(Direction::Left),
        ActionId::Arrow(Arrow::Left),
        ActionId::TypeDigit(Digit::D4),
    ];
    bindings.insert(sig("FF10EF"), list.clone()).unwrap();
    bindings
        .insert(sig("FFFFFFFF"), vec![ActionId::MouseWildcard, ActionId::TypingWildcard])
        .unwrap();
    store.save(&bindings).unwrap();

    let loaded = store.try_load().unwrap();
    assert_eq!(loaded, bindings);
    assert_eq!(loaded.get(&sig("FF10EF")).unwrap(), list.as_slice());
    assert_eq!(
        loaded.get(&sig("FF10EF")).unwrap()[0],
        ActionId::MoveMouse(Direction::Left)
    );
}

#[test]
fn missing_file_is_empty() {
    let (_dir, store) = store();
    assert!(store.try_load().unwrap().is_empty());
    assert!(store.load().is_empty());
}

#[test]
fn save_replaces_previous_file() {
    let (_dir, store) = store();
    let mut bindings = Bindings::new();
    bindings.insert(sig("A"), vec![ActionId::Enter]).unwrap();
    store.save(&bindings).unwrap();

    bindings.remove(&sig("A"));
    bindings.insert(sig("B"), vec![ActionId::Escape]).unwrap();
    store.save(&bindings).unwrap();

    let loaded = store.load();
    assert!(loaded.get(&sig("A")).is_none());
    assert_eq!(loaded.get(&sig("B")).unwrap(), &[ActionId::Escape]);
}

// ── bind() ──

#[test]
fn bind_prepends_new_default() {
    let (_dir, store) = store();
    store.bind(sig("FF18E7"), ActionId::Arrow(Arrow::Up)).unwrap();
    store
        .bind(sig("FF18E7"), ActionId::MoveMouse(Direction::Up))
        .unwrap();

    let loaded = store.load();
    assert_eq!(
        loaded.get(&sig("FF18E7")).unwrap(),
        &[ActionId::MoveMouse(Direction::Up), ActionId::Arrow(Arrow::Up)]
    );
}

#[test]
fn bind_existing_action_moves_it_to_front() {
    let (_dir, store) = store();
    store.bind(sig("X"), ActionId::Enter).unwrap();
    store.bind(sig("X"), ActionId::Space).unwrap();
    let bindings = store.bind(sig("X"), ActionId::Enter).unwrap();
    assert_eq!(
        bindings.get(&sig("X")).unwrap(),
        &[ActionId::Enter, ActionId::Space]
    );
    assert_eq!(store.load(), bindings);
}

#[test]
fn clear_removes_everything() {
    let (_dir, store) = store();
    store.bind(sig("X"), ActionId::Enter).unwrap();
    store.clear().unwrap();
    assert!(store.load().is_empty());
}

// ── Damaged files ──

#[test]
fn unsupported_version_falls_back_to_empty() {
    let (dir, store) = store();
    std::fs::create_dir_all(dir.path().join("irplus")).unwrap();
    std::fs::write(
        store.path(),
        "version = 7\n\n[[binding]]\nsignal = \"A\"\nactions = [\"Enter\"]\n",
    )
    .unwrap();
    assert!(matches!(
        store.try_load(),
        Err(StoreError::UnsupportedVersion(7))
    ));
    assert!(store.load().is_empty());
}

#[test]
fn bind_refuses_to_overwrite_unreadable_file() {
    let (dir, store) = store();
    std::fs::create_dir_all(dir.path().join("irplus")).unwrap();
    let newer = "version = 7\n\n[[binding]]\nsignal = \"A\"\nactions = [\"Enter\"]\n";
    std::fs::write(store.path(), newer).unwrap();

    assert!(matches!(
        store.bind(sig("B"), ActionId::Space),
        Err(StoreError::UnsupportedVersion(7))
    ));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), newer);

    std::fs::write(store.path(), "version = 1\n[[binding]\n").unwrap();
    assert!(store.bind(sig("B"), ActionId::Space).is_err());
    assert_eq!(
        std::fs::read_to_string(store.path()).unwrap(),
        "version = 1\n[[binding]\n"
    );
}

#[test]
fn every_action_name_survives_the_file() {
    let (_dir, store) = store();
    let mut bindings = Bindings::new();
    bindings.insert(sig("ALL"), ActionId::ALL.to_vec()).unwrap();
    store.save(&bindings).unwrap();
    assert_eq!(store.try_load().unwrap(), bindings);
}

#[test]
fn hand_edited_names_are_lenient() {
    let (dir, store) = store();
    std::fs::create_dir_all(dir.path().join("irplus")).unwrap();
    std::fs::write(
        store.path(),
        r#"
version = 1

[[binding]]
signal = "FF02FD"
actions = ["  mouse LEFT click ", "Do a barrel roll", "Enter"]
"#,
    )
    .unwrap();
    assert_eq!(
        store.load().get(&sig("FF02FD")).unwrap(),
        &[ActionId::MouseLeftClick, ActionId::Enter]
    );
}

// ── Store → resolver ──

#[test]
fn reloaded_bindings_drive_resolver() {
    let (_dir, store) = store();
    store.bind(sig("M"), ActionId::Mode).unwrap();
    store.bind(sig("K"), ActionId::Arrow(Arrow::Left)).unwrap();
    store
        .bind(sig("K"), ActionId::MoveMouse(Direction::Left))
        .unwrap();

    let bindings = store.load();
    assert_eq!(
        modes::available_modes(&bindings),
        vec![Mode::MouseControl, Mode::NavigationControl]
    );

    let mut resolver = ActionResolver::new(bindings, Timing::default(), RampConfig::default());
    assert_eq!(
        resolver.resolve(&sig("K"), 0),
        Some(ConcreteAction::MoveMouse { dx: -5, dy: 0 })
    );
    resolver.resolve(&sig("M"), 1000);
    resolver.resolve(&sig("M"), 2000);
    assert_eq!(resolver.current_mode(), Some(Mode::NavigationControl));
    assert_eq!(
        resolver.resolve(&sig("K"), 3000),
        Some(ConcreteAction::Tap(KeySymbol::Named(NamedKey::Left)))
    );
}
