//! Referral rewards and status progression.

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopcrm_integration_tests::{TestContext, seed_shop};

async fn with_referrers() -> TestContext {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.backend.insert(
        "referrers",
        json!({
            "id": "r-points", "name": "Pim", "reward_type": "point",
            "referral_code": "PIM10", "status": "open"
        }),
    );
    ctx.backend.insert(
        "referrers",
        json!({
            "id": "r-cash", "name": "Cass", "reward_type": "cash",
            "referral_code": "CASS", "status": "open"
        }),
    );
    ctx.backend.insert(
        "referrers",
        json!({
            "id": "r-closed", "name": "Old", "reward_type": "point",
            "referral_code": "OLD", "status": "close"
        }),
    );
    ctx
}

fn set_rates(ctx: &TestContext) {
    ctx.backend.insert(
        "settings-center",
        json!({
            "id": "global", "referral_point_value": 25,
            "referral_cash_value": "300.50"
        }),
    );
}

async fn refer(ctx: &TestContext, referrer_id: &str) -> reqwest::Response {
    ctx.post(
        "/api/referral-histories",
        &json!({ "referrer_id": referrer_id, "referee_id": "u-admin" }),
    )
    .await
}

#[tokio::test]
async fn test_reward_value_comes_from_settings_center() {
    let ctx = with_referrers().await;
    set_rates(&ctx);
    ctx.login("root").await;

    let resp = refer(&ctx, "r-points").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["reward_type"], "point");
    assert_eq!(history["reward_value"], "25");
    assert_eq!(history["status"], "pending");

    let resp = refer(&ctx, "r-cash").await;
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["reward_type"], "cash");
    assert_eq!(history["reward_value"], "300.50");
}

#[tokio::test]
async fn test_client_reward_value_is_ignored() {
    let ctx = with_referrers().await;
    set_rates(&ctx);
    ctx.login("root").await;

    let resp = ctx
        .post(
            "/api/referral-histories",
            &json!({
                "referrer_id": "r-points", "referee_id": "u-admin",
                "reward_value": "99999"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["reward_value"], "25");
}

#[tokio::test]
async fn test_missing_settings_center_means_zero_reward() {
    let ctx = with_referrers().await;
    ctx.login("root").await;

    let resp = refer(&ctx, "r-points").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["reward_value"], "0");
}

#[tokio::test]
async fn test_closed_referrer_takes_no_referrals() {
    let ctx = with_referrers().await;
    ctx.login("root").await;

    let resp = refer(&ctx, "r-closed").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.backend.records("referral-histories").is_empty());
}

#[tokio::test]
async fn test_referral_status_only_moves_forward() {
    let ctx = with_referrers().await;
    ctx.backend.insert(
        "referral-histories",
        json!({
            "id": "rh1", "referrer_id": "r-points", "referee_id": "u-admin",
            "reward_type": "point", "reward_value": "25", "status": "pending"
        }),
    );
    ctx.login("root").await;

    let resp = ctx
        .patch("/api/referral-histories/rh1", &json!({ "status": "approved" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .patch("/api/referral-histories/rh1", &json!({ "status": "pending" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .patch("/api/referral-histories/rh1", &json!({ "status": "paid" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let history: Value = resp.json().await.unwrap();
    assert_eq!(history["status"], "paid");

    let resp = ctx
        .patch("/api/referral-histories/rh1", &json!({ "status": "approved" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = ctx.backend.record("referral-histories", "rh1").unwrap();
    assert_eq!(stored["status"], "paid");
}

#[tokio::test]
async fn test_referrals_are_superadmin_only() {
    let ctx = with_referrers().await;
    ctx.login("admin").await;

    assert_eq!(ctx.get("/api/referrers").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        refer(&ctx, "r-points").await.status(),
        StatusCode::FORBIDDEN
    );
}
