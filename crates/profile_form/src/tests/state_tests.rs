use super::*;

fn snapshot() -> UserRecord {
    UserRecord::new("u1", UserFields::new("Alice", "alice@example.com", "555-1234"))
}

#[test]
fn overlay_wins_then_snapshot_then_defaults() {
    let mut overlay = UserPatch::default();
    overlay.set(UserField::Email, "new@example.com");

    let merged = effective_value(Some(&snapshot()), &overlay);
    assert_eq!(merged.name, "Alice");
    assert_eq!(merged.email, "new@example.com");
    assert_eq!(merged.phone, "555-1234");

    let without_snapshot = effective_value(None, &overlay);
    assert_eq!(without_snapshot.name, "");
    assert_eq!(without_snapshot.email, "new@example.com");
    assert_eq!(without_snapshot.phone, "");
}

#[test]
fn empty_overlay_is_never_dirty() {
    assert!(!is_dirty(Some(&snapshot()), &UserPatch::default()));
    assert!(!is_dirty(None, &UserPatch::default()));
}

#[test]
fn overlay_equal_to_snapshot_is_clean() {
    let overlay = UserPatch::from(&snapshot());
    assert!(!is_dirty(Some(&snapshot()), &overlay));
}

#[test]
fn any_differing_key_makes_the_form_dirty() {
    let mut overlay = UserPatch::default();
    overlay.set(UserField::Name, "Alice");
    overlay.set(UserField::Phone, "555-0000");

    assert!(is_dirty(Some(&snapshot()), &overlay));
}

#[test]
fn edits_without_snapshot_are_dirty() {
    let mut overlay = UserPatch::default();
    overlay.set(UserField::Name, "");

    assert!(is_dirty(None, &overlay));
}
