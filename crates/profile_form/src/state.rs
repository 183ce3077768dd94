//! Pure derivations over (server snapshot, local overlay). They are cheap
//! and are recomputed on every read; nothing here is cached.

use shared::{
    domain::{UserField, UserFields, UserRecord},
    protocol::UserPatch,
};

/// Defaults, then the snapshot, then the overlay; the overlay wins per key.
pub fn effective_value(snapshot: Option<&UserRecord>, overlay: &UserPatch) -> UserFields {
    let mut value = snapshot.map(UserRecord::fields).unwrap_or_default();
    for (field, edited) in overlay.entries() {
        value.set(field, edited);
    }
    value
}

/// True iff some key present in the overlay differs from the snapshot. With
/// no snapshot every present key counts as a difference.
pub fn is_dirty(snapshot: Option<&UserRecord>, overlay: &UserPatch) -> bool {
    overlay
        .entries()
        .any(|(field, edited)| snapshot_value(snapshot, field) != Some(edited))
}

fn snapshot_value(snapshot: Option<&UserRecord>, field: UserField) -> Option<&str> {
    snapshot.map(|record| record.get(field))
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
