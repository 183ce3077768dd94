use client_core::{MutationStatus, QueryStatus, UpdateUserMutation, UserQueries, UserQuery};
use shared::{
    domain::{UserField, UserFields, UserId, UserRecord},
    error::{RemoteError, ValidationErrors},
    protocol::UserPatch,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{state, validation};

/// How local edits relate to the server snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPolicy {
    /// Edits are a sparse overlay that is never overwritten by a snapshot.
    /// Submit validates first; reset clears the overlay.
    #[default]
    Overlay,
    /// The first snapshot is copied wholesale into local state, replacing
    /// anything typed before it arrived. Submit skips validation; reset
    /// restores the snapshot (or defaults when none has loaded).
    Seeded,
}

impl FormPolicy {
    pub fn validates_before_submit(self) -> bool {
        matches!(self, FormPolicy::Overlay)
    }

    pub fn seeds_from_snapshot(self) -> bool {
        matches!(self, FormPolicy::Seeded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("user is still loading")]
    LoadPending,
    #[error("user could not be loaded; nothing to submit against")]
    NotLoaded,
    #[error("form has no unsaved changes")]
    NothingToReset,
    #[error("form is invalid: {0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// One edit session for a single user.
pub struct ProfileForm {
    id: UserId,
    policy: FormPolicy,
    query: UserQuery,
    update: UpdateUserMutation,
    snapshot: Option<UserRecord>,
    overlay: UserPatch,
    load_error: Option<RemoteError>,
    show_errors: bool,
    seeded: bool,
}

impl ProfileForm {
    pub fn new(queries: &UserQueries, id: UserId, policy: FormPolicy) -> Self {
        Self {
            query: queries.use_user(id.clone()),
            update: queries.use_update_user(),
            id,
            policy,
            snapshot: None,
            overlay: UserPatch::default(),
            load_error: None,
            show_errors: false,
            seeded: false,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn policy(&self) -> FormPolicy {
        self.policy
    }

    /// Requests the user and adopts whatever arrives as the new snapshot.
    pub async fn load(&mut self) -> Result<(), RemoteError> {
        match self.query.fetch().await {
            QueryStatus::Success(record) => {
                self.accept_snapshot(record);
                Ok(())
            }
            QueryStatus::Error(error) => {
                warn!(user_id = %self.id, %error, "user load failed");
                self.load_error = Some(error.clone());
                Err(error)
            }
            QueryStatus::Pending => Ok(()),
        }
    }

    /// Re-syncs with the shared cache. A fresh entry is served without a
    /// round trip; an invalidated one is refetched first.
    pub async fn refresh(&mut self) -> Result<(), RemoteError> {
        self.load().await
    }

    fn accept_snapshot(&mut self, record: UserRecord) {
        if self.policy.seeds_from_snapshot() && !self.seeded {
            if !self.overlay.is_empty() {
                debug!(user_id = %self.id, "first snapshot replaces local edits");
            }
            self.overlay = UserPatch::from(&record);
            self.seeded = true;
        }
        self.snapshot = Some(record);
        self.load_error = None;
    }

    pub fn edit(&mut self, field: UserField, value: impl Into<String>) {
        self.overlay.set(field, value);
    }

    pub fn snapshot(&self) -> Option<&UserRecord> {
        self.snapshot.as_ref()
    }

    pub fn overlay(&self) -> &UserPatch {
        &self.overlay
    }

    pub fn effective_value(&self) -> UserFields {
        state::effective_value(self.snapshot.as_ref(), &self.overlay)
    }

    pub fn is_dirty(&self) -> bool {
        state::is_dirty(self.snapshot.as_ref(), &self.overlay)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(&self.effective_value())
    }

    /// Errors to render. Empty until the first rejected submit.
    pub fn visible_errors(&self) -> Option<ValidationErrors> {
        if !self.show_errors {
            return None;
        }
        self.validate().err()
    }

    pub fn is_load_pending(&self) -> bool {
        self.snapshot.is_none() && self.load_error.is_none()
    }

    pub fn load_error(&self) -> Option<&RemoteError> {
        self.load_error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.update.is_pending()
    }

    pub fn update_status(&self) -> MutationStatus<UserRecord> {
        self.update.status()
    }

    pub fn subscribe_update(&self) -> watch::Receiver<MutationStatus<UserRecord>> {
        self.update.subscribe()
    }

    pub fn can_submit(&self) -> bool {
        self.snapshot.is_some() && !self.is_submitting() && self.visible_errors().is_none()
    }

    pub fn can_reset(&self) -> bool {
        self.is_dirty() && !self.is_load_pending()
    }

    /// Sends the full effective value. Local edits survive a failed update
    /// so the operator can retry.
    pub async fn submit(&mut self) -> Result<UserRecord, FormError> {
        if self.is_load_pending() {
            return Err(FormError::LoadPending);
        }
        if self.snapshot.is_none() {
            return Err(FormError::NotLoaded);
        }

        let value = self.effective_value();
        if self.policy.validates_before_submit() {
            if let Err(errors) = validation::validate(&value) {
                self.show_errors = true;
                return Err(FormError::Invalid(errors));
            }
        }

        let saved = self.update.mutate(&self.id, UserPatch::from(value)).await?;
        info!(user_id = %self.id, "profile saved");

        self.overlay = match self.policy {
            FormPolicy::Overlay => UserPatch::default(),
            FormPolicy::Seeded => UserPatch::from(&saved),
        };
        self.snapshot = Some(saved.clone());
        Ok(saved)
    }

    pub fn reset(&mut self) -> Result<(), FormError> {
        if self.is_load_pending() {
            return Err(FormError::LoadPending);
        }
        if !self.is_dirty() {
            return Err(FormError::NothingToReset);
        }

        self.overlay = match (self.policy, &self.snapshot) {
            (FormPolicy::Overlay, _) => UserPatch::default(),
            (FormPolicy::Seeded, Some(snapshot)) => UserPatch::from(snapshot),
            (FormPolicy::Seeded, None) => UserFields::default().into(),
        };
        debug!(user_id = %self.id, "form reset");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
