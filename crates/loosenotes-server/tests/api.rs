//! Router-level tests over the in-memory store with dev identity headers.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use loosenotes_core::UserId;
use loosenotes_server::{AppState, ServerConfig, StorageBackend, build_app};
use loosenotes_service::{LocalFileStorage, NoteAccessService};
use loosenotes_store::MemoryStore;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    _dir: tempfile::TempDir,
}

#[derive(Clone, Copy)]
struct Caller {
    id: UserId,
    role: &'static str,
}

impl Caller {
    fn user() -> Self {
        Self {
            id: UserId::new(),
            role: "user",
        }
    }

    fn admin() -> Self {
        Self {
            id: UserId::new(),
            role: "admin",
        }
    }
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        allow_dev_identity: true,
        storage_backend: StorageBackend::Memory,
        public_base_url: "https://notes.test".to_string(),
        upload_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let service = NoteAccessService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(LocalFileStorage::new(dir.path())),
        config.service_config(),
    );
    let app = build_app(AppState::new(service, config)).unwrap();
    TestApp { app, _dir: dir }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        caller: Option<Caller>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder
                .header("x-user-id", caller.id.to_string())
                .header("x-user-role", caller.role);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create_note(&self, owner: Caller, title: &str, is_public: bool) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/notes",
                Some(owner),
                Some(json!({ "title": title, "content": "some content", "is_public": is_public })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let t = test_app();
    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let t = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn create_requires_identity_and_valid_title() {
    let t = test_app();

    let (status, body) = t
        .send(
            "POST",
            "/notes",
            None,
            Some(json!({ "title": "Anonymous", "content": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = t
        .send(
            "POST",
            "/notes",
            Some(Caller::user()),
            Some(json!({ "title": "ab", "content": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn new_note_starts_with_zero_aggregate() {
    let t = test_app();
    let owner = Caller::user();
    let id = t.create_note(owner, "Fresh note", true).await;

    let (status, body) = t.send("GET", &format!("/notes/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_rating"], 0.0);
    assert_eq!(body["rating_count"], 0);
    assert_eq!(body["view_count"], 1);
    assert_eq!(body["attachments"], json!([]));
}

#[tokio::test]
async fn private_note_access_rules() {
    let t = test_app();
    let owner = Caller::user();
    let id = t.create_note(owner, "Private note", false).await;

    let (status, _) = t.send("GET", &format!("/notes/{id}"), None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send("GET", &format!("/notes/{id}"), Some(Caller::user()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send("GET", &format!("/notes/{id}"), Some(Caller::admin()), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .send("GET", &format!("/notes/{id}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let missing = UserId::new();
    let (status, body) = t
        .send("GET", &format!("/notes/{missing}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn share_link_lifecycle() {
    let t = test_app();
    let owner = Caller::user();
    let id = t.create_note(owner, "Shared note", false).await;

    // Strangers cannot share.
    let (status, _) = t
        .send("POST", &format!("/notes/{id}/share"), Some(Caller::user()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send(
            "POST",
            &format!("/notes/{id}/share"),
            Some(owner),
            Some(json!({ "ttl_days": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .send(
            "POST",
            &format!("/notes/{id}/share"),
            Some(owner),
            Some(json!({ "ttl_days": 100_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, link) = t
        .send("POST", &format!("/notes/{id}/share"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = link["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 64);
    assert_eq!(
        link["url"],
        format!("https://notes.test/notes/{id}?token={token}")
    );

    let (status, body) = t
        .send("GET", &format!("/notes/{id}?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("share").is_none());

    let (status, body) = t
        .send("GET", &format!("/notes/{id}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["share"]["token"], token.as_str());

    let wrong = "0".repeat(64);
    let (status, _) = t
        .send("GET", &format!("/notes/{id}?token={wrong}"), None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send("DELETE", &format!("/notes/{id}/share"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t
        .send("GET", &format!("/notes/{id}?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rating_upsert_updates_aggregate() {
    let t = test_app();
    let owner = Caller::user();
    let alice = Caller::user();
    let bob = Caller::user();
    let id = t.create_note(owner, "Rate me", true).await;
    let uri = format!("/notes/{id}/ratings");

    let (status, _) = t
        .send("POST", &uri, None, Some(json!({ "value": 4 })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for bad in [json!(0), json!(6), json!(4.5)] {
        let (status, _) = t
            .send("POST", &uri, Some(alice), Some(json!({ "value": bad })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = t
        .send("POST", &uri, Some(alice), Some(json!({ "value": 4, "comment": "good" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregate"]["average_rating"], 4.0);
    assert_eq!(body["aggregate"]["rating_count"], 1);
    let alice_rating = body["rating"]["id"].as_str().unwrap().to_string();

    let (_, body) = t
        .send("POST", &uri, Some(bob), Some(json!({ "value": 5 })))
        .await;
    assert_eq!(body["aggregate"]["average_rating"], 4.5);

    // Re-rating replaces rather than adds.
    let (_, body) = t
        .send("POST", &uri, Some(alice), Some(json!({ "value": 2 })))
        .await;
    assert_eq!(body["aggregate"]["rating_count"], 2);
    assert_eq!(body["aggregate"]["average_rating"], 3.5);
    assert_eq!(body["rating"]["id"], alice_rating.as_str());

    let (status, body) = t.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["pages"], 1);

    let (status, body) = t.send("GET", "/users/me/ratings", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = t
        .send("GET", &format!("/ratings/{alice_rating}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], 2);

    let (_, note) = t.send("GET", &format!("/notes/{id}"), None, None).await;
    assert_eq!(note["average_rating"], 3.5);
    assert_eq!(note["rating_count"], 2);
}

#[tokio::test]
async fn rating_removal_rules() {
    let t = test_app();
    let owner = Caller::user();
    let author = Caller::user();
    let id = t.create_note(owner, "Removal", true).await;

    let (_, body) = t
        .send(
            "POST",
            &format!("/notes/{id}/ratings"),
            Some(author),
            Some(json!({ "value": 3 })),
        )
        .await;
    let rating_id = body["rating"]["id"].as_str().unwrap().to_string();

    // The note owner is not the rating author.
    let (status, _) = t
        .send("DELETE", &format!("/ratings/{rating_id}"), Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send("DELETE", &format!("/ratings/{rating_id}"), Some(author), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregate"]["rating_count"], 0);
    assert_eq!(body["aggregate"]["average_rating"], 0.0);

    let (status, _) = t
        .send("DELETE", &format!("/ratings/{rating_id}"), Some(author), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_note_cannot_be_rated_by_stranger() {
    let t = test_app();
    let owner = Caller::user();
    let id = t.create_note(owner, "Private", false).await;

    let (status, _) = t
        .send(
            "POST",
            &format!("/notes/{id}/ratings"),
            Some(Caller::user()),
            Some(json!({ "value": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send("GET", &format!("/notes/{id}/ratings"), None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_search_and_top_rated() {
    let t = test_app();
    let owner = Caller::user();
    let public_id = t.create_note(owner, "Public rust notes", true).await;
    t.create_note(owner, "Private rust notes", false).await;

    let (_, body) = t.send("GET", "/notes", None, None).await;
    assert_eq!(body["total"], 1);
    let (_, body) = t.send("GET", "/notes", Some(owner), None).await;
    assert_eq!(body["total"], 2);

    let (status, body) = t.send("GET", "/notes/search?q=RUST", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = t.send("GET", "/notes/search?q=", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = t.send("GET", "/notes/top-rated", None, None).await;
    assert_eq!(body["total"], 0);

    t.send(
        "POST",
        &format!("/notes/{public_id}/ratings"),
        Some(Caller::user()),
        Some(json!({ "value": 5 })),
    )
    .await;
    let (_, body) = t.send("GET", "/notes/top-rated?limit=5", None, None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["items"][0]["id"], public_id.as_str());
}

#[tokio::test]
async fn update_and_delete_require_ownership() {
    let t = test_app();
    let owner = Caller::user();
    let stranger = Caller::user();
    let id = t.create_note(owner, "Owned", true).await;
    let uri = format!("/notes/{id}");

    let (status, _) = t
        .send("PUT", &uri, Some(stranger), Some(json!({ "title": "Hijacked" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send("PUT", &uri, Some(owner), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");

    let (status, _) = t.send("DELETE", &uri, Some(stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.send("DELETE", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.send("GET", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_require_admin() {
    let t = test_app();
    let owner = Caller::user();
    let admin = Caller::admin();
    let new_owner = UserId::new();
    let id = t.create_note(owner, "Transfer", false).await;
    let uri = format!("/admin/notes/{id}/owner");
    let body = json!({ "owner_id": new_owner.to_string() });

    let (status, _) = t.send("PUT", &uri, Some(owner), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, note) = t.send("PUT", &uri, Some(admin), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["owner_id"], new_owner.to_string());

    let (status, _) = t
        .send("POST", "/admin/notes/reconcile", Some(owner), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = t
        .send("POST", "/admin/notes/reconcile", Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["notes_checked"], 1);
    assert_eq!(report["notes_repaired"], 0);
}
