use std::{collections::BTreeMap, sync::Arc};

use serde::Deserialize;
use shared::{
    domain::{UserId, UserRecord},
    error::{ApiError, ErrorCode},
    protocol::{NewUser, UserPatch},
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// In-memory users collection. Cloning shares the same records.
#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<RwLock<BTreeMap<UserId, UserRecord>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.users.write().await;
            for user in users {
                guard.insert(user.id.clone(), user);
            }
        }
        store
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub store: UserStore,
}

/// Seed file layout: `{ "users": [ ... ] }`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

pub fn users_route() -> &'static str {
    "/users"
}

pub fn user_route() -> &'static str {
    "/users/:id"
}

fn not_found(id: &UserId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("user {id} not found"))
}

fn new_user_id() -> UserId {
    UserId(Uuid::new_v4().simple().to_string())
}

pub async fn create_user(ctx: &ApiContext, fields: NewUser) -> Result<UserRecord, ApiError> {
    let mut users = ctx.store.users.write().await;
    let mut id = new_user_id();
    while users.contains_key(&id) {
        id = new_user_id();
    }
    let record = UserRecord::new(id.clone(), fields);
    users.insert(id, record.clone());
    info!(user_id = %record.id, "user created");
    Ok(record)
}

pub async fn list_users(ctx: &ApiContext) -> Result<Vec<UserRecord>, ApiError> {
    Ok(ctx.store.users.read().await.values().cloned().collect())
}

pub async fn get_user(ctx: &ApiContext, id: &UserId) -> Result<UserRecord, ApiError> {
    ctx.store
        .users
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| not_found(id))
}

pub async fn update_user(
    ctx: &ApiContext,
    id: &UserId,
    patch: UserPatch,
) -> Result<UserRecord, ApiError> {
    let mut users = ctx.store.users.write().await;
    let record = users.get_mut(id).ok_or_else(|| not_found(id))?;
    patch.apply_to(record);
    info!(user_id = %id, fields = patch.entries().count(), "user updated");
    Ok(record.clone())
}

pub async fn delete_user(ctx: &ApiContext, id: &UserId) -> Result<(), ApiError> {
    ctx.store
        .users
        .write()
        .await
        .remove(id)
        .map(|_| info!(user_id = %id, "user deleted"))
        .ok_or_else(|| not_found(id))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
