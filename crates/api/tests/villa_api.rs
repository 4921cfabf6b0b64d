//! HTTP-level integration tests for the `/villas` endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete, get, patch_json, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

fn villa_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "details": "Test villa",
        "rate": 150.0,
        "sqft": 420,
        "occupancy": 3,
        "image_url": null,
        "amenity": "Sauna"
    })
}

async fn create_villa(pool: &PgPool, name: &str) -> i64 {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/villas",
        villa_body(name),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_villa_returns_201_with_location(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/villas", villa_body("Sunset Villa")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()["location"].to_str().unwrap().to_string();

    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(location, format!("/api/v1/villas/{id}"));
    assert_eq!(json["data"]["name"], "Sunset Villa");
    assert_eq!(json["data"]["amenity"], "Sauna");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_villa_by_id(pool: PgPool) {
    let id = create_villa(&pool, "Get Me").await;

    let response = get(common::build_test_app(pool), &format!("/api/v1/villas/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Get Me");
    assert_eq!(json["data"]["rate"], 150.0);
    assert!(json["data"].get("villa_numbers").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_villas_includes_seed_data_in_id_order(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/villas").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let villas = json["data"].as_array().unwrap();
    assert_eq!(villas.len(), 5);
    assert_eq!(villas[0]["name"], "Royal Villa");
    assert_eq!(villas[4]["name"], "Diamond Pool Villa");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_villa_with_villa_numbers(pool: PgPool) {
    for no in [102, 101] {
        let response = post_json(
            common::build_test_app(pool.clone()),
            "/api/v1/villa-numbers",
            json!({"villa_no": no, "villa_id": 2}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get(
        common::build_test_app(pool),
        "/api/v1/villas/2?include=villa_numbers",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let numbers = json["data"]["villa_numbers"].as_array().unwrap();
    let nos: Vec<i64> = numbers.iter().map(|n| n["villa_no"].as_i64().unwrap()).collect();
    assert_eq!(nos, vec![101, 102]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_include_returns_400(pool: PgPool) {
    let response = get(
        common::build_test_app(pool),
        "/api/v1/villas/1?include=owners",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_nonexistent_villa_returns_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/villas/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Reserved identifier and create-time rejections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_id_zero_is_rejected_on_every_route(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/api/v1/villas/0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete(common::build_test_app(pool.clone()), "/api/v1/villas/0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = patch_json(
        common::build_test_app(pool.clone()),
        "/api/v1/villas/0",
        json!([{"op": "replace", "path": "/occupancy", "value": 2}]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = villa_body("Zero Villa");
    body["id"] = json!(0);
    let response = post_json(common::build_test_app(pool), "/api/v1/villas", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "identifier 0 is reserved");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_with_client_id_returns_400(pool: PgPool) {
    let mut body = villa_body("Client Keyed");
    body["id"] = json!(77);

    let response = post_json(common::build_test_app(pool), "/api/v1/villas", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_name_in_other_case_returns_400(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/villas",
        villa_body("ROYAL villa"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "CONSTRAINT_VIOLATION");
    assert_eq!(json["error"], "Villa already exists");

    let response = get(common::build_test_app(pool), "/api/v1/villas").await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_body_reports_field_violations(pool: PgPool) {
    let mut body = villa_body("");
    body["occupancy"] = json!(-1);

    let response = post_json(common::build_test_app(pool), "/api/v1/villas", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "occupancy"]);
}

// ---------------------------------------------------------------------------
// Update / patch / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_villa_returns_204(pool: PgPool) {
    let id = create_villa(&pool, "Original").await;

    let mut body = villa_body("Renamed");
    body["id"] = json!(id);
    body["rate"] = json!(175.5);
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/villas/{id}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(common::build_test_app(pool), &format!("/api/v1/villas/{id}")).await).await;
    assert_eq!(json["data"]["name"], "Renamed");
    assert_eq!(json["data"]["rate"], 175.5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_with_mismatched_id_returns_400(pool: PgPool) {
    let mut body = villa_body("Mismatch");
    body["id"] = json!(2);

    let response = put_json(common::build_test_app(pool), "/api/v1/villas/1", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_villa_returns_404(pool: PgPool) {
    let mut body = villa_body("Ghost");
    body["id"] = json!(999_999);

    let response = put_json(common::build_test_app(pool), "/api/v1/villas/999999", body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rename_onto_existing_name_returns_400(pool: PgPool) {
    let id = create_villa(&pool, "Unique Name").await;

    let mut body = villa_body("diamond villa");
    body["id"] = json!(id);
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/villas/{id}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONSTRAINT_VIOLATION");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_patch_villa_round_trip(pool: PgPool) {
    let id = create_villa(&pool, "Patchable").await;
    let uri = format!("/api/v1/villas/{id}");
    let before = body_json(get(common::build_test_app(pool.clone()), &uri).await).await;

    let response = patch_json(
        common::build_test_app(pool.clone()),
        &uri,
        json!([
            {"op": "replace", "path": "/occupancy", "value": 8},
            {"op": "replace", "path": "/amenity", "value": null}
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = body_json(get(common::build_test_app(pool), &uri).await).await;
    assert_eq!(after["data"]["occupancy"], 8);
    assert!(after["data"]["amenity"].is_null());
    assert_eq!(after["data"]["name"], before["data"]["name"]);
    assert_eq!(after["data"]["sqft"], before["data"]["sqft"]);
    assert_eq!(after["data"]["created_at"], before["data"]["created_at"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_patch_with_bad_operations_returns_all_violations(pool: PgPool) {
    let response = patch_json(
        common::build_test_app(pool),
        "/api/v1/villas/1",
        json!([
            {"op": "replace", "path": "/unknown", "value": 1},
            {"op": "replace", "path": "/name", "value": ""}
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_patch_missing_villa_returns_400(pool: PgPool) {
    let response = patch_json(
        common::build_test_app(pool),
        "/api/v1/villas/999999",
        json!([{"op": "replace", "path": "/occupancy", "value": 2}]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_villa_twice_returns_404(pool: PgPool) {
    let id = create_villa(&pool, "Delete Me").await;
    let uri = format!("/api/v1/villas/{id}");

    let response = delete(common::build_test_app(pool.clone()), &uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(common::build_test_app(pool.clone()), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(common::build_test_app(pool), &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Malformed bodies use the error envelope
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_type_field_returns_400_envelope(pool: PgPool) {
    let mut body = villa_body("Wrong Shape");
    body["sqft"] = json!("big");

    let response = post_json(common::build_test_app(pool), "/api/v1/villas", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["message"].as_str().unwrap().contains("sqft"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_patch_op_returns_400_envelope(pool: PgPool) {
    let response = patch_json(
        common::build_test_app(pool),
        "/api/v1/villas/1",
        json!([{"op": "increment", "path": "/occupancy", "value": 1}]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("increment"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unparsable_json_returns_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/api/v1/villas")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"name\": "))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}
