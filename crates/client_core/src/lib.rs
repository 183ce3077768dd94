//! Data access for the `/users` collection: a typed REST client behind the
//! [`UserApi`] seam, an injectable query cache, and the two cache-aware
//! bindings the edit form is built on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{UserId, UserRecord},
    error::{RemoteError, RemoteOperation},
    protocol::{user_path, NewUser, UserPatch, USERS_PATH},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod bindings;
pub mod config;
pub mod query_cache;

pub use bindings::{MutationStatus, UpdateUserMutation, UserQueries, UserQuery};
pub use config::ClientSettings;
pub use query_cache::{
    Fetcher, InMemoryQueryCache, QueryCache, QueryKey, QueryStatus, RetryPolicy,
};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
/// Artificial latency before every single-user fetch so loading states are
/// observable.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum ClientSetupError {
    #[error("invalid api url '{url}': {source}")]
    InvalidApiUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("api url '{0}' must use http or https")]
    UnsupportedScheme(String),
}

/// The five remote operations over the users collection. Every call is
/// exactly one round trip; nothing here retries.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn create_user(&self, fields: &NewUser) -> Result<UserRecord, RemoteError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, RemoteError>;
    async fn fetch_user(&self, id: &UserId) -> Result<UserRecord, RemoteError>;
    async fn update_user(&self, id: &UserId, patch: &UserPatch)
        -> Result<UserRecord, RemoteError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), RemoteError>;
}

pub struct UsersClient {
    http: Client,
    api_url: String,
    fetch_delay: Duration,
}

impl UsersClient {
    pub fn new(api_url: &str) -> Result<Self, ClientSetupError> {
        let parsed = Url::parse(api_url).map_err(|source| ClientSetupError::InvalidApiUrl {
            url: api_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientSetupError::UnsupportedScheme(api_url.to_string()));
        }

        Ok(Self {
            http: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            fetch_delay: DEFAULT_FETCH_DELAY,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientSetupError> {
        Ok(Self::new(&settings.api_url)?.with_fetch_delay(settings.fetch_delay()))
    }

    pub fn with_fetch_delay(mut self, fetch_delay: Duration) -> Self {
        self.fetch_delay = fetch_delay;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn users_url(&self) -> String {
        format!("{}{USERS_PATH}", self.api_url)
    }

    fn user_url(&self, id: &UserId) -> String {
        format!("{}{}", self.api_url, user_path(id))
    }

    async fn send(
        &self,
        operation: RemoteOperation,
        request: RequestBuilder,
    ) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|error| RemoteError::new(operation, error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!(%operation, status = status.as_u16(), "users api returned failure status");
            return Err(RemoteError::with_status(operation, status.as_u16()));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: RemoteOperation,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|error| RemoteError::new(operation, format!("invalid response body: {error}")))
    }
}

#[async_trait]
impl UserApi for UsersClient {
    async fn create_user(&self, fields: &NewUser) -> Result<UserRecord, RemoteError> {
        let created: UserRecord = self
            .send_json(
                RemoteOperation::Create,
                self.http.post(self.users_url()).json(fields),
            )
            .await?;
        debug!(user_id = %created.id, "created user");
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RemoteError> {
        self.send_json(RemoteOperation::List, self.http.get(self.users_url()))
            .await
    }

    async fn fetch_user(&self, id: &UserId) -> Result<UserRecord, RemoteError> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        self.send_json(RemoteOperation::Fetch, self.http.get(self.user_url(id)))
            .await
    }

    async fn update_user(
        &self,
        id: &UserId,
        patch: &UserPatch,
    ) -> Result<UserRecord, RemoteError> {
        debug!(user_id = %id, fields = ?patch.entries().map(|(f, _)| f).collect::<Vec<_>>(), "patching user");
        self.send_json(
            RemoteOperation::Update,
            self.http.patch(self.user_url(id)).json(patch),
        )
        .await
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), RemoteError> {
        self.send(RemoteOperation::Delete, self.http.delete(self.user_url(id)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
