//! Cache-aware bindings over [`UserApi`]: a keyed read and an update action
//! that invalidates the read once it settles.

use std::sync::Arc;

use futures::FutureExt;
use shared::{
    domain::{UserId, UserRecord},
    error::RemoteError,
    protocol::UserPatch,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    query_cache::{Fetcher, InMemoryQueryCache, QueryCache, QueryKey, QueryStatus, RetryPolicy},
    UserApi,
};

/// Shared handle pairing the API with the injected cache. Cloning is cheap
/// and every clone sees the same cache.
#[derive(Clone)]
pub struct UserQueries {
    api: Arc<dyn UserApi>,
    cache: Arc<dyn QueryCache<UserRecord>>,
}

impl UserQueries {
    pub fn new(api: Arc<dyn UserApi>, cache: Arc<dyn QueryCache<UserRecord>>) -> Self {
        Self { api, cache }
    }

    pub fn with_retry(api: Arc<dyn UserApi>, retry: RetryPolicy) -> Self {
        Self::new(api, Arc::new(InMemoryQueryCache::new(retry)))
    }

    pub fn api(&self) -> &Arc<dyn UserApi> {
        &self.api
    }

    pub fn cache(&self) -> &Arc<dyn QueryCache<UserRecord>> {
        &self.cache
    }

    pub fn use_user(&self, id: UserId) -> UserQuery {
        UserQuery {
            key: QueryKey::user(&id),
            id,
            api: self.api.clone(),
            cache: self.cache.clone(),
        }
    }

    pub fn use_update_user(&self) -> UpdateUserMutation {
        let (status, _) = watch::channel(MutationStatus::Idle);
        UpdateUserMutation {
            api: self.api.clone(),
            cache: self.cache.clone(),
            status,
        }
    }
}

/// Read binding keyed by `["user", id]`.
pub struct UserQuery {
    id: UserId,
    key: QueryKey,
    api: Arc<dyn UserApi>,
    cache: Arc<dyn QueryCache<UserRecord>>,
}

impl UserQuery {
    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Resolves from the cache when fresh; otherwise fetches, sharing any
    /// request already in flight for this id.
    pub async fn fetch(&self) -> QueryStatus<UserRecord> {
        let api = self.api.clone();
        let id = self.id.clone();
        let fetcher: Fetcher<UserRecord> = Arc::new(move || {
            let api = api.clone();
            let id = id.clone();
            async move { api.fetch_user(&id).await }.boxed()
        });
        self.cache.fetch(self.key.clone(), fetcher).await
    }

    pub async fn status(&self) -> QueryStatus<UserRecord> {
        self.cache.status(&self.key).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStatus<T> {
    Idle,
    Pending,
    Error(RemoteError),
    Success(T),
}

impl<T> MutationStatus<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationStatus::Pending)
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            MutationStatus::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Update action. Status changes are published on a watch channel so a
/// caller can observe `Pending` while `mutate` is suspended.
pub struct UpdateUserMutation {
    api: Arc<dyn UserApi>,
    cache: Arc<dyn QueryCache<UserRecord>>,
    status: watch::Sender<MutationStatus<UserRecord>>,
}

impl UpdateUserMutation {
    pub fn status(&self) -> MutationStatus<UserRecord> {
        self.status.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.status.borrow().is_pending()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationStatus<UserRecord>> {
        self.status.subscribe()
    }

    /// Sends `patch` for `id`. On settle, success or failure, the cached
    /// read for the input `id` is invalidated.
    pub async fn mutate(&self, id: &UserId, patch: UserPatch) -> Result<UserRecord, RemoteError> {
        self.status.send_replace(MutationStatus::Pending);

        let result = self.api.update_user(id, &patch).await;

        self.cache.invalidate(&QueryKey::user(id)).await;

        match &result {
            Ok(record) => {
                debug!(user_id = %id, "user update settled");
                self.status.send_replace(MutationStatus::Success(record.clone()));
            }
            Err(error) => {
                warn!(user_id = %id, %error, "user update failed");
                self.status.send_replace(MutationStatus::Error(error.clone()));
            }
        }
        result
    }
}
