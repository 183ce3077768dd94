use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{
    domain::{UserId, UserRecord},
    error::{ApiError, ErrorCode},
    protocol::{NewUser, UserPatch},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{ApiContext, UserStore};
use app_state::AppState;
use config::{load_seed_users, load_settings};

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let seed = match &settings.seed_path {
        Some(path) => load_seed_users(path)?,
        None => Vec::new(),
    };
    let store = UserStore::with_users(seed).await;
    info!(users = store.len().await, "user store ready");

    let state = AppState {
        api: ApiContext { store },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(api::users_route(), get(http_list_users).post(http_create_user))
        .route(
            api::user_route(),
            get(http_get_user)
                .patch(http_update_user)
                .delete(http_delete_user),
        )
        .with_state(state)
}

fn into_http(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match error.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_users(State(state): State<Arc<AppState>>) -> HttpResult<Json<Vec<UserRecord>>> {
    api::list_users(&state.api).await.map(Json).map_err(into_http)
}

async fn http_create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewUser>,
) -> HttpResult<(StatusCode, Json<UserRecord>)> {
    let created = api::create_user(&state.api, req).await.map_err(into_http)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<Json<UserRecord>> {
    api::get_user(&state.api, &UserId(id))
        .await
        .map(Json)
        .map_err(into_http)
}

async fn http_update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> HttpResult<Json<UserRecord>> {
    api::update_user(&state.api, &UserId(id), patch)
        .await
        .map(Json)
        .map_err(into_http)
}

async fn http_delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HttpResult<StatusCode> {
    api::delete_user(&state.api, &UserId(id))
        .await
        .map_err(into_http)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
