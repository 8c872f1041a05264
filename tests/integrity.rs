//! Database-backed integrity tests.
//!
//! These exercise the cross-table rules end to end against a live Postgres
//! instance and are ignored by default:
//!
//!     DATABASE_URL=postgresql://... cargo test -- --ignored

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use cms_backend::create_app;
use cms_backend::db::{self, AppState};

async fn test_state() -> AppState {
    let config = db::DbConfig::default();
    let pool = db::connect(&config)
        .await
        .expect("DATABASE_URL must point at a live Postgres");
    db::run_migrations(&pool).await.expect("migrations failed");
    AppState { pool }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn current_ids(pool: &sqlx::PgPool, entry_type: &str) -> Vec<Uuid> {
    sqlx::query_as::<_, (Uuid,)>(
        "SELECT id FROM timeline_entries WHERE entry_type = $1 AND is_current = true",
    )
    .bind(entry_type)
    .fetch_all(pool)
    .await
    .unwrap()
    .into_iter()
    .map(|(id,)| id)
    .collect()
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn test_current_entry_stays_singular_across_handoff_and_type_change() {
    let state = test_state().await;
    let pool = state.pool.clone();
    let app = create_app(state);

    // A is current, then B takes over; exactly one career row may be
    // current afterwards.
    let (status, a) = send(
        &app,
        "POST",
        "/api/timeline",
        Some(json!({
            "entryType": "career",
            "title": "First role",
            "startDate": "2018-02-01",
            "isCurrent": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, b) = send(
        &app,
        "POST",
        "/api/timeline",
        Some(json!({
            "entryType": "career",
            "title": "Second role",
            "startDate": "2021-09-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let b_id = b["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/timeline/{b_id}"),
        Some(json!({"isCurrent": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let b_uuid: Uuid = b_id.parse().unwrap();
    assert_eq!(current_ids(&pool, "career").await, vec![b_uuid]);

    // Changing entry_type on a row that is already current moves it into
    // the other partition and must demote that partition's current entry.
    let (status, e) = send(
        &app,
        "POST",
        "/api/timeline",
        Some(json!({
            "entryType": "education",
            "title": "Degree",
            "startDate": "2014-09-01",
            "isCurrent": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/timeline/{b_id}"),
        Some(json!({"entryType": "education"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(current_ids(&pool, "education").await, vec![b_uuid]);
    assert!(current_ids(&pool, "career").await.is_empty());

    for id in [a["id"].as_str().unwrap(), &b_id, e["id"].as_str().unwrap()] {
        let (status, _) = send(&app, "DELETE", &format!("/api/timeline/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn test_content_delete_sweeps_only_its_own_associations() {
    let state = test_state().await;
    let pool = state.pool.clone();
    let app = create_app(state);

    let post_slug = format!("post-{}", Uuid::new_v4().simple());
    let page_slug = format!("page-{}", Uuid::new_v4().simple());

    let (status, post) = send(
        &app,
        "POST",
        "/api/blog",
        Some(json!({"title": "Swept", "slug": post_slug})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = post["id"].as_str().unwrap().to_string();

    let (status, page) = send(
        &app,
        "POST",
        "/api/pages",
        Some(json!({"title": "Survivor", "slug": page_slug})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let page_id = page["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/seo/blog_post/{post_id}"),
        Some(json!({"metaTitle": "Swept"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/social/blog_post/{post_id}"),
        Some(json!({"shareTitle": "Swept"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/seo/static_page/{page_id}"),
        Some(json!({"metaTitle": "Survivor"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/api/blog/{post_slug}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // Both association tables are cleared for the deleted owner's key only.
    let post_uuid: Uuid = post_id.parse().unwrap();
    for table in ["seo_metadata", "social_sharing_settings"] {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {table} \
             WHERE content_type = 'blog_post' AND content_id = $1"
        ))
        .bind(post_uuid)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 0, "{table} not swept for the deleted post");
    }

    let (status, _) = send(&app, "GET", &format!("/api/seo/static_page/{page_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &format!("/api/pages/{page_slug}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn test_folder_delete_reassigns_media_and_children_block() {
    let state = test_state().await;
    let app = create_app(state);

    let (status, parent) = send(&app, "POST", "/api/folders", Some(json!({"name": "parent"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let parent_id = parent["id"].as_str().unwrap().to_string();

    let (status, child) = send(
        &app,
        "POST",
        "/api/folders",
        Some(json!({"name": "child", "parentId": parent_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let child_id = child["id"].as_str().unwrap().to_string();

    let (status, media) = send(
        &app,
        "POST",
        "/api/media",
        Some(json!({
            "filename": "shot.png",
            "url": "https://cdn.example.com/shot.png",
            "folderId": child_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let media_id = media["id"].as_str().unwrap().to_string();

    // Deleting the child folder moves its media up to the child's parent.
    let (status, _) = send(&app, "DELETE", &format!("/api/folders/{child_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&app, "GET", &format!("/api/media/{media_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["folderId"].as_str().unwrap(), parent_id);

    // A child folder blocks deletion of its parent.
    let (status, blocker) = send(
        &app,
        "POST",
        "/api/folders",
        Some(json!({"name": "blocker", "parentId": parent_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let blocker_id = blocker["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "DELETE", &format!("/api/folders/{parent_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "folder has child folders");

    let (status, _) = send(&app, "DELETE", &format!("/api/media/{media_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/folders/{blocker_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/folders/{parent_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}
