//! Integration tests for the CMS admin backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::{Blog, Category};
use crate::tree::{CategorySession, HttpCategoryApi};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    /// Direct database access, bypassing the API and its cache invalidation
    repo: Arc<Repository>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_cache_ttl(300).await
    }

    async fn with_cache_ttl(cache_ttl_secs: u64) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Repository::new(pool);

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            cache_ttl_secs,
            cache_max_capacity: 1_000,
        };

        let state = AppState::new(repo, &config);
        let repo = Arc::clone(&state.repo);
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn create_blog(&self, title: &str, extra: Value) -> i64 {
        let mut body = json!({ "title": title, "shortDescription": format!("About {}", title) });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        let (status, resp) = self.post("/api/blogs/proc", body).await;
        assert_eq!(status, 200, "create failed: {}", resp);
        resp["record"]["id"].as_i64().unwrap()
    }
}

fn titles(posts: &Value) -> Vec<String> {
    posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_blog_crud_and_listing() {
    let fixture = TestFixture::new().await;

    let first = fixture
        .create_blog("Rust Ownership", json!({ "body": "Long text", "isEnabled": true }))
        .await;
    fixture
        .create_blog("Async Rust", json!({ "isEnabled": false }))
        .await;

    // Listing
    let (status, resp) = fixture
        .post("/api/blogs/load", json!({ "order": "title asc" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["records"], 2);
    assert_eq!(titles(&resp["posts"]), vec!["Async Rust", "Rust Ownership"]);
    // List projection drops the body
    assert!(resp["posts"][1].get("body").is_none());
    assert_eq!(resp["posts"][1]["slug"], "rust-ownership");

    // Lookup by id returns the full record
    let (status, resp) = fixture
        .post("/api/blogs/load", json!({ "id": first, "isEnabled": "disabled" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(resp["record"]["title"], "Rust Ownership");
    assert_eq!(resp["record"]["body"], "Long text");
    assert!(resp.get("posts").is_none());

    // Update
    let (status, resp) = fixture
        .post(
            "/api/blogs/proc",
            json!({ "id": first, "title": "Rust Ownership Explained", "isEnabled": true }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(resp["record"]["slug"], "rust-ownership-explained");
    // Saving without a body keeps the stored one
    let stored = fixture.repo.get_blog(first).await.unwrap().unwrap();
    assert_eq!(stored.body.as_deref(), Some("Long text"));
}

#[tokio::test]
async fn test_advance_filter_gates_optional_filters() {
    let fixture = TestFixture::new().await;
    fixture
        .create_blog("Enabled post", json!({ "isEnabled": true, "author": "ana" }))
        .await;
    fixture
        .create_blog("Disabled post", json!({ "isEnabled": false, "author": "bo" }))
        .await;

    let (_, resp) = fixture
        .post("/api/blogs/load", json!({ "isEnabled": "enabled" }))
        .await;
    assert_eq!(resp["records"], 2);

    let (_, resp) = fixture
        .post(
            "/api/blogs/load",
            json!({ "isEnabled": "enabled", "advanceFilter": true }),
        )
        .await;
    assert_eq!(titles(&resp["posts"]), vec!["Enabled post"]);

    let (_, resp) = fixture
        .post(
            "/api/blogs/load",
            json!({ "author": "bo", "term": "POST", "advanceFilter": true }),
        )
        .await;
    assert_eq!(titles(&resp["posts"]), vec!["Disabled post"]);
}

#[tokio::test]
async fn test_pagination_and_skip_record_stats() {
    let fixture = TestFixture::new().await;
    for i in 1..=5 {
        fixture
            .create_blog(&format!("Post {}", i), json!({ "views": i }))
            .await;
    }

    let (_, resp) = fixture
        .post(
            "/api/blogs/load",
            json!({ "pageNumber": 2, "pageSize": 2, "order": "views desc" }),
        )
        .await;
    assert_eq!(resp["records"], 5);
    assert_eq!(titles(&resp["posts"]), vec!["Post 3", "Post 2"]);

    let (_, resp) = fixture
        .post(
            "/api/blogs/load",
            json!({ "pageSize": 2, "loadAll": true, "skipRecordStats": true }),
        )
        .await;
    assert_eq!(resp["posts"].as_array().unwrap().len(), 5);
    assert!(resp.get("records").is_none());
}

#[tokio::test]
async fn test_invalid_criteria_are_rejected() {
    let fixture = TestFixture::new().await;

    let (status, resp) = fixture
        .post("/api/blogs/load", json!({ "pageSize": 0 }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["code"], "INVALID_ARGUMENT");

    let (status, _) = fixture
        .post("/api/tags/load", json!({ "order": "colour desc" }))
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_update_of_unknown_record_is_not_found() {
    let fixture = TestFixture::new().await;

    let (status, resp) = fixture
        .post("/api/tags/proc", json!({ "id": 404, "title": "Ghost" }))
        .await;
    assert_eq!(status, 404);
    assert_eq!(resp["code"], "NOT_FOUND");

    // Lookup of a missing id is an empty result, not an error
    let (status, resp) = fixture
        .post("/api/tags/load", json!({ "id": 404 }))
        .await;
    assert_eq!(status, 200);
    assert!(resp.get("record").is_none());
}

#[tokio::test]
async fn test_cached_listing_until_write_through_api() {
    let fixture = TestFixture::new().await;
    fixture.create_blog("First", json!({})).await;

    let cached = json!({ "isCache": true });
    let (_, resp) = fixture.post("/api/blogs/load", cached.clone()).await;
    assert_eq!(resp["records"], 1);

    // A write behind the API's back is not seen by cached reads...
    fixture
        .repo
        .save_blog(&Blog {
            title: "Second".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let (_, resp) = fixture.post("/api/blogs/load", cached.clone()).await;
    assert_eq!(resp["records"], 1);

    // ...but uncached reads see it
    let (_, resp) = fixture.post("/api/blogs/load", json!({})).await;
    assert_eq!(resp["records"], 2);

    // Writes through the API invalidate the namespace
    fixture.create_blog("Third", json!({})).await;
    let (_, resp) = fixture.post("/api/blogs/load", cached).await;
    assert_eq!(resp["records"], 3);
}

#[tokio::test]
async fn test_zero_ttl_disables_cache() {
    let fixture = TestFixture::with_cache_ttl(0).await;
    fixture.create_blog("First", json!({})).await;

    let cached = json!({ "isCache": true });
    fixture.post("/api/blogs/load", cached.clone()).await;
    fixture
        .repo
        .save_blog(&Blog {
            title: "Second".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let (_, resp) = fixture.post("/api/blogs/load", cached).await;
    assert_eq!(resp["records"], 2);
}

#[tokio::test]
async fn test_bulk_actions() {
    let fixture = TestFixture::new().await;
    let a = fixture.create_blog("A", json!({ "isEnabled": true })).await;
    let b = fixture.create_blog("B", json!({ "isEnabled": true })).await;

    let (status, resp) = fixture
        .post(
            "/api/blogs/action",
            json!({
                "records": [{ "id": a }, { "id": b, "actionStatus": "featured" }],
                "actionStatus": "disable"
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", resp);

    let a = fixture.repo.get_blog(a).await.unwrap().unwrap();
    let b = fixture.repo.get_blog(b).await.unwrap().unwrap();
    assert!(!a.is_enabled);
    assert!(b.is_enabled && b.is_featured);

    let (status, resp) = fixture
        .post(
            "/api/errorlogs/action",
            json!({ "records": [{ "id": 1 }], "actionStatus": "enable" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(resp["status"], "error");
}

#[tokio::test]
async fn test_error_logs() {
    let fixture = TestFixture::new().await;

    let (status, resp) = fixture
        .post(
            "/api/errorlogs/proc",
            json!({ "description": "boom", "url": "/admin/blogs", "stackTrace": "at main" }),
        )
        .await;
    assert_eq!(status, 200);
    let id = resp["record"]["id"].as_i64().unwrap();

    let (_, resp) = fixture
        .post(
            "/api/errorlogs/load",
            json!({ "url": "ADMIN", "advanceFilter": true }),
        )
        .await;
    assert_eq!(resp["records"], 1);
    assert!(resp["posts"][0].get("stackTrace").is_none());

    let (status, _) = fixture
        .post(
            "/api/errorlogs/action",
            json!({ "records": [{ "id": id, "actionStatus": "delete" }] }),
        )
        .await;
    assert_eq!(status, 200);
    let (_, resp) = fixture.post("/api/errorlogs/load", json!({})).await;
    assert_eq!(resp["records"], 0);
}

#[tokio::test]
async fn test_category_delete_cascades_on_server() {
    let fixture = TestFixture::new().await;

    let (_, root) = fixture
        .post("/api/categories/proc", json!({ "title": "Electronics" }))
        .await;
    let root_id = root["record"]["id"].as_i64().unwrap();
    let (_, child) = fixture
        .post(
            "/api/categories/proc",
            json!({ "title": "Phones", "parentId": root_id }),
        )
        .await;
    let child_id = child["record"]["id"].as_i64().unwrap();
    fixture
        .post(
            "/api/categories/proc",
            json!({ "title": "Cases", "parentId": child_id }),
        )
        .await;

    let (_, resp) = fixture
        .post("/api/categories/load", json!({ "id": root_id }))
        .await;
    assert_eq!(resp["record"]["childCount"], 1);

    let (status, _) = fixture
        .post(
            "/api/categories/proc",
            json!({ "title": "Lost", "parentId": 999 }),
        )
        .await;
    assert_eq!(status, 400);

    // moving the root under its own child would loop the hierarchy
    let (status, body) = fixture
        .post(
            "/api/categories/proc",
            json!({ "id": root_id, "title": "Electronics", "parentId": child_id }),
        )
        .await;
    assert_eq!(status, 400, "{body}");
    let (_, resp) = fixture
        .post("/api/categories/load", json!({ "id": root_id }))
        .await;
    assert_eq!(resp["record"]["parentId"], 0);

    fixture
        .post(
            "/api/categories/action",
            json!({ "records": [{ "id": root_id }], "actionStatus": "delete" }),
        )
        .await;
    let (_, resp) = fixture.post("/api/categories/load", json!({})).await;
    assert_eq!(resp["records"], 0);
}

#[tokio::test]
async fn test_category_session_over_http() {
    let fixture = TestFixture::new().await;
    let mut session = CategorySession::new(HttpCategoryApi::new(fixture.base_url.clone()));

    let electronics = session
        .save(Category {
            title: "Electronics".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    for title in ["Phones", "Laptops"] {
        session
            .save(Category {
                title: title.to_string(),
                parent_id: electronics.id,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    // A fresh session sees the server state through lazy loads
    let mut fresh = CategorySession::new(HttpCategoryApi::new(fixture.base_url.clone()));
    assert_eq!(fresh.load_children(0).await.unwrap(), 1);
    assert!(fresh.nav_list()[0].has_children);
    assert_eq!(fresh.load_children(electronics.id).await.unwrap(), 2);

    let found = fresh.search("phone");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].children.len(), 1);
    assert_eq!(found[0].children[0].record.title, "Phones");

    // Deletion goes to the server first, then cascades locally
    let removed = fresh.delete(electronics.id).await.unwrap();
    assert_eq!(removed.len(), 3);
    assert!(fresh.nav_list().is_empty());
    assert_eq!(fresh.load_children(0).await.unwrap(), 0);

    // Server-side errors surface with their kind
    let err = fresh
        .save(Category {
            id: 12345,
            title: "Ghost".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, crate::errors::AppError::NotFound(_)));
}
