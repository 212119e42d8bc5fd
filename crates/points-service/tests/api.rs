//! HTTP API integration tests.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_reports_lock_mode() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["lock_mode"], "per-user");
}

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn get_point_of_new_user_is_zero() {
    let harness = TestHarness::new();

    let response = harness.server.get(&harness.point_path()).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], 1);
    assert_eq!(body["point"], 0);
    assert!(body.get("updated_at").is_none());
}

#[tokio::test]
async fn get_point_with_invalid_id_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/point/not-a-number").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_user");
}

// ============================================================================
// Charge / Use
// ============================================================================

#[tokio::test]
async fn charge_then_use() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch(&format!("{}/charge", harness.point_path()))
        .json(&json!({ "amount": 1000 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 1000);
    assert!(body["updated_at"].is_string());

    let response = harness
        .server
        .patch(&format!("{}/use", harness.point_path()))
        .json(&json!({ "amount": 400 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 600);

    let body: serde_json::Value = harness.server.get(&harness.point_path()).await.json();
    assert_eq!(body["point"], 600);
}

#[tokio::test]
async fn negative_charge_is_bad_request() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch(&format!("{}/charge", harness.point_path()))
        .json(&json!({ "amount": -1000 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_amount");
}

#[tokio::test]
async fn use_beyond_balance_is_conflict() {
    let harness = TestHarness::new();

    harness
        .server
        .patch(&format!("{}/charge", harness.point_path()))
        .json(&json!({ "amount": 300 }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .patch(&format!("{}/use", harness.point_path()))
        .json(&json!({ "amount": 500 }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_balance");
    assert_eq!(body["error"]["details"]["balance"], 300);
    assert_eq!(body["error"]["details"]["required"], 500);

    let body: serde_json::Value = harness.server.get(&harness.point_path()).await.json();
    assert_eq!(body["point"], 300);
}

#[tokio::test]
async fn charge_with_invalid_id_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch("/point/abc/charge")
        .json(&json!({ "amount": 10 }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn slow_charge_and_use_outlive_request_timeout() {
    // Each ledger mutation makes three table calls, so it takes longer than
    // the one-second request timeout; a single read does not.
    let harness = TestHarness::slow(Duration::from_millis(600), 1);

    let response = harness
        .server
        .patch(&format!("{}/charge", harness.point_path()))
        .json(&json!({ "amount": 10 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 10);

    let response = harness
        .server
        .patch(&format!("{}/use", harness.point_path()))
        .json(&json!({ "amount": 4 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 6);

    let response = harness.server.get(&harness.point_path()).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 6);

    let body: serde_json::Value = harness
        .server
        .get(&format!("{}/histories", harness.point_path()))
        .await
        .json();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

// ============================================================================
// Histories
// ============================================================================

#[tokio::test]
async fn histories_list_resulting_balances_in_order() {
    let harness = TestHarness::new();

    for (action, amount) in [("charge", 500), ("use", 200), ("charge", 50)] {
        harness
            .server
            .patch(&format!("{}/{action}", harness.point_path()))
            .json(&json!({ "amount": amount }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get(&format!("{}/histories", harness.point_path()))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 3);

    let amounts: Vec<_> = records.iter().map(|r| r["amount"].as_i64().unwrap()).collect();
    let types: Vec<_> = records.iter().map(|r| r["type"].as_str().unwrap()).collect();
    assert_eq!(amounts, vec![500, 300, 350]);
    assert_eq!(types, vec!["CHARGE", "USE", "CHARGE"]);
}

#[tokio::test]
async fn histories_of_other_user_are_empty() {
    let harness = TestHarness::new();

    harness
        .server
        .patch(&format!("{}/charge", harness.point_path()))
        .json(&json!({ "amount": 10 }))
        .await
        .assert_status_ok();

    let body: serde_json::Value = harness.server.get("/point/2/histories").await.json();
    assert!(body.as_array().unwrap().is_empty());
}
