use super::*;
use axum::{body, body::Body, http::Request};
use shared::domain::UserFields;
use tower::ServiceExt;

async fn test_app() -> (Router, UserStore) {
    let store = UserStore::with_users([UserRecord::new(
        "u1",
        UserFields::new("Alice", "alice@example.com", "555-1234"),
    )])
    .await;
    let app = build_router(Arc::new(AppState {
        api: ApiContext {
            store: store.clone(),
        },
    }));
    (app, store)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&body).expect("json")
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _store) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_assigns_id_and_list_includes_it() {
    let (app, _store) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            serde_json::json!({ "name": "Bob", "email": "bob@example.com", "phone": "1" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: UserRecord = read_json(response).await;
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.name, "Bob");

    let list = app
        .oneshot(Request::get("/users").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(list.status(), StatusCode::OK);
    let users: Vec<UserRecord> = read_json(list).await;
    assert_eq!(users.len(), 2);
    assert!(users.contains(&created));
}

#[tokio::test]
async fn create_without_all_fields_is_rejected() {
    let (app, store) = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/users",
            serde_json::json!({ "name": "Bob" }),
        ))
        .await
        .expect("response");

    assert!(response.status().is_client_error());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn patch_updates_only_sent_fields() {
    let (app, _store) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/users/u1",
            serde_json::json!({ "email": "alice@new.example" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: UserRecord = read_json(response).await;
    assert_eq!(updated.email, "alice@new.example");
    assert_eq!(updated.name, "Alice");

    let fetched = app
        .oneshot(Request::get("/users/u1").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let fetched: UserRecord = read_json(fetched).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn unknown_user_routes_return_not_found() {
    let (app, _store) = test_app().await;

    for request in [
        Request::get("/users/missing")
            .body(Body::empty())
            .expect("request"),
        json_request("PATCH", "/users/missing", serde_json::json!({ "name": "X" })),
        Request::delete("/users/missing")
            .body(Body::empty())
            .expect("request"),
    ] {
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ApiError = read_json(response).await;
        assert!(matches!(error.code, ErrorCode::NotFound));
    }
}

#[tokio::test]
async fn delete_returns_no_content_and_removes_user() {
    let (app, store) = test_app().await;

    let response = app
        .oneshot(
            Request::delete("/users/u1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.len().await, 0);
}
