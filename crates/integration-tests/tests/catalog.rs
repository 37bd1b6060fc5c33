//! Catalog reads and edits: info, search, collection gateway, lesson
//! updates, images and CORS.

#![allow(clippy::unwrap_used)]

use activities_api::config::ApiConfig;
use activities_core::CollectionAllowlist;
use activities_integration_tests::{ALLOWED_ORIGIN, TestApp};
use axum::http::{Method, StatusCode, header};
use serde_json::{Value, json};

fn subjects(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|product| product["subject"].as_str().unwrap().to_string())
        .collect()
}

fn open_config() -> ApiConfig {
    let mut config = ApiConfig::for_memory_store();
    config.collections = CollectionAllowlist::Any;
    config
}

// ============================================================================
// Info and health
// ============================================================================

#[tokio::test]
async fn test_index_describes_service() {
    let app = TestApp::new();

    let res = app.get("/").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "After School Activities API");
    assert_eq!(res.body["status"], "Running");
    assert!(res.body["endpoints"].is_object());
}

#[tokio::test]
async fn test_health_reports_store_connection() {
    let app = TestApp::pending(ApiConfig::for_memory_store());

    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "OK");
    assert_eq!(res.body["database"], "disconnected");
    assert!(res.body["uptime"].as_f64().unwrap() >= 0.0);
    assert!(res.body["timestamp"].as_i64().unwrap() > 0);

    app.connect();
    let res = app.get("/health").await;
    assert_eq!(res.body["database"], "connected");
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::pending(ApiConfig::for_memory_store());
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );

    app.connect();
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();

    let res = app
        .send(Method::GET, "/", None, &[("x-request-id", "req-42")])
        .await;

    assert_eq!(res.headers.get("x-request-id").unwrap(), "req-42");
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new();

    for uri in ["/search", "/search?query=", "/search?query=%20%20"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(res.body, json!({"msg": "Search query required"}));
    }
}

#[tokio::test]
async fn test_search_is_case_insensitive_on_text_fields() {
    let app = TestApp::new();

    let res = app.get("/search?query=hEnDoN").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(subjects(&res.body), vec!["Art", "Maths"]);
}

#[tokio::test]
async fn test_search_numeric_matches_price_or_spaces() {
    let app = TestApp::new();

    let res = app.get("/search?query=100").await;

    assert_eq!(res.status, StatusCode::OK);
    // Art costs 100, Maths has 100 spaces
    assert_eq!(subjects(&res.body), vec!["Art", "Maths"]);
}

#[tokio::test]
async fn test_search_numeric_matches_double_storage() {
    let app = TestApp::new();

    let res = app.get("/search?query=95").await;

    assert_eq!(subjects(&res.body), vec!["Maths"]);
    assert_eq!(res.body[0]["price"], json!(95));
}

#[tokio::test]
async fn test_search_treats_term_literally() {
    let app = TestApp::new();

    let res = app.get("/search?query=c%2B%2B").await;
    assert_eq!(subjects(&res.body), vec!["C++ Club"]);

    let res = app.get("/search?query=.*").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn test_search_without_match_is_empty() {
    let app = TestApp::new();

    let res = app.get("/search?query=Astronomy").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn test_search_before_store_connects() {
    let app = TestApp::pending(ApiConfig::for_memory_store());

    let res = app.get("/search?query=art").await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body, json!({"msg": "Database not connected"}));
}

// ============================================================================
// Collection gateway
// ============================================================================

#[tokio::test]
async fn test_list_products() {
    let app = TestApp::new();

    let res = app.get("/collection/products").await;

    assert_eq!(res.status, StatusCode::OK);
    let products = res.body.as_array().unwrap();
    assert_eq!(products.len(), 4);
    assert!(products[0]["_id"].as_str().unwrap().len() == 24);
    assert_eq!(products[0]["Spaces"], json!(5));
}

#[tokio::test]
async fn test_any_collection_before_store_connects() {
    let app = TestApp::pending(ApiConfig::for_memory_store());

    let res = app.get("/collection/anyRandomName").await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body, json!({"msg": "Database not connected"}));
}

#[tokio::test]
async fn test_unlisted_collection_is_unknown() {
    let app = TestApp::new();

    let res = app.get("/collection/anyRandomName").await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body,
        json!({"msg": "Unknown collection", "collection": "anyRandomName"})
    );
}

#[tokio::test]
async fn test_open_allowlist_lists_empty_collection() {
    let app = TestApp::with_config(open_config());

    let res = app.get("/collection/anyRandomName").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn test_reserved_collection_name_is_rejected() {
    let app = TestApp::with_config(open_config());

    let res = app.get("/collection/system.users").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_by_id_is_repeatable() {
    let app = TestApp::new();
    let id = app.object_id_of(2).await;

    let first = app.get(&format!("/collection/products/{id}")).await;
    let second = app.get(&format!("/collection/products/{id}")).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["subject"], "Music");
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_get_by_id_absent_is_null() {
    let app = TestApp::new();

    let res = app
        .get("/collection/products/0123456789abcdef01234567")
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, Value::Null);
}

#[tokio::test]
async fn test_get_by_invalid_id() {
    let app = TestApp::new();

    let res = app.get("/collection/products/not-an-id").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({"msg": "Invalid record id"}));
}

#[tokio::test]
async fn test_update_existing_record() {
    let app = TestApp::new();
    let id = app.object_id_of(1).await;

    let res = app
        .put(&format!("/collection/products/{id}"), &json!({"Spaces": 5}))
        .await;

    // Matched but unchanged still counts as success
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"msg": "success"}));

    let res = app
        .put(&format!("/collection/products/{id}"), &json!({"Spaces": 7}))
        .await;
    assert_eq!(res.body, json!({"msg": "success"}));
    assert_eq!(app.spaces_of(1).await, 7);
}

#[tokio::test]
async fn test_update_missing_record() {
    let app = TestApp::new();

    let res = app
        .put(
            "/collection/products/0123456789abcdef01234567",
            &json!({"Spaces": 5}),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"msg": "error"}));
}

#[tokio::test]
async fn test_update_requires_object_body() {
    let app = TestApp::new();
    let id = app.object_id_of(1).await;

    let res = app
        .put(&format!("/collection/products/{id}"), &json!([1, 2]))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_rejects_number_out_of_range() {
    let app = TestApp::new();
    let id = app.object_id_of(1).await;

    let res = app
        .put(
            &format!("/collection/products/{id}"),
            &json!({"Spaces": u64::MAX}),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({"msg": "Invalid update data"}));
    assert_eq!(app.spaces_of(1).await, 5);
}

// ============================================================================
// Lesson updates
// ============================================================================

#[tokio::test]
async fn test_update_lesson_changes_fields() {
    let app = TestApp::new();

    let res = app
        .put("/update-lesson/2", &json!({"location": "Barnet", "Spaces": 9}))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["msg"], "Lesson updated successfully");
    assert_eq!(res.body["updatedFields"], json!({"location": "Barnet", "Spaces": 9}));
    assert_eq!(res.body["modifiedCount"], json!(1));
    assert_eq!(app.spaces_of(2).await, 9);
}

#[tokio::test]
async fn test_update_lesson_without_change() {
    let app = TestApp::new();

    let res = app
        .put("/update-lesson/01", &json!({"subject": "Art"}))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"msg": "No changes made", "id": "01"}));
}

#[tokio::test]
async fn test_update_lesson_not_found() {
    let app = TestApp::new();

    let res = app.put("/update-lesson/99", &json!({"Spaces": 1})).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({"msg": "Lesson not found"}));
}

#[tokio::test]
async fn test_update_lesson_invalid_input() {
    let app = TestApp::new();

    for (uri, body) in [
        ("/update-lesson/abc", json!({"Spaces": 1})),
        ("/update-lesson/1", json!({})),
        ("/update-lesson/1", json!("Spaces")),
    ] {
        let res = app.put(uri, &body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri} {body}");
        assert_eq!(res.body, json!({"msg": "Invalid ID or update data"}));
    }
}

// ============================================================================
// Images and CORS
// ============================================================================

#[tokio::test]
async fn test_missing_image() {
    let mut config = ApiConfig::for_memory_store();
    config.images_dir = std::env::temp_dir().join("activities-api-no-images");
    let app = TestApp::with_config(config);

    let res = app.get("/images/missing.jpg").await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body,
        json!({"msg": "Image not found", "requestedFile": "/missing.jpg"})
    );
}

#[tokio::test]
async fn test_image_route_answers_other_methods_with_not_found() {
    let dir = std::env::temp_dir().join(format!("activities-api-put-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("art.txt"), "painting").unwrap();

    let mut config = ApiConfig::for_memory_store();
    config.images_dir.clone_from(&dir);
    let app = TestApp::with_config(config);

    for uri in ["/images/missing.jpg", "/images/art.txt"] {
        let res = app.send(Method::PUT, uri, None, &[]).await;

        assert_eq!(res.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            res.body,
            json!({"msg": "Image not found", "requestedFile": uri.trim_start_matches("/images")})
        );
    }

    let res = app.send(Method::DELETE, "/images/missing.jpg", None, &[]).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_serves_existing_image() {
    let dir = std::env::temp_dir().join(format!("activities-api-images-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("art.txt"), "painting").unwrap();

    let mut config = ApiConfig::for_memory_store();
    config.images_dir.clone_from(&dir);
    let app = TestApp::with_config(config);

    let res = app.get("/images/art.txt").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("painting"));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new();

    let res = app
        .send(
            Method::OPTIONS,
            "/update-spaces",
            None,
            &[
                ("origin", ALLOWED_ORIGIN),
                ("access-control-request-method", "PUT"),
                ("access-control-request-headers", "content-type"),
            ],
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(
        res.headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}
