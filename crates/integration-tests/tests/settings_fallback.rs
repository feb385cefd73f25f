//! Settings reads fall back to an all-null default when no row exists.

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopcrm_integration_tests::{TestContext, seed_shop};

async fn settings_as_admin(ctx: &TestContext) -> Value {
    ctx.login("admin").await;
    let resp = ctx.get("/api/settings").await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_missing_settings_404_yields_defaults() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);

    let body = settings_as_admin(&ctx).await;
    assert_eq!(
        body,
        json!({
            "id": null,
            "shop_id": "s1",
            "point_rate": null,
            "welcome_points": null,
            "point_expiry_days": null,
            "sms_sender": null,
            "line_channel_token": null,
        })
    );
}

#[tokio::test]
async fn test_missing_settings_400_yields_defaults() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.backend.missing_settings_status(StatusCode::BAD_REQUEST);

    let body = settings_as_admin(&ctx).await;
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["shop_id"], "s1");
}

#[tokio::test]
async fn test_saved_settings_are_returned() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.login("admin").await;

    let resp = ctx
        .client
        .put(ctx.url("/api/settings"))
        .json(&json!({ "welcome_points": 20, "sms_sender": "SUNRISE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx.get("/api/settings").await;
    let body: Value = resp.json().await.unwrap();
    assert!(body["id"].is_string());
    assert_eq!(body["welcome_points"], 20);
    assert_eq!(body["sms_sender"], "SUNRISE");
}

#[tokio::test]
async fn test_negative_settings_are_rejected_before_saving() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.login("admin").await;

    let resp = ctx
        .client
        .put(ctx.url("/api/settings"))
        .json(&json!({ "point_expiry_days": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["point_expiry_days"].is_string());
    assert!(ctx.backend.records("settings").is_empty());
}

#[tokio::test]
async fn test_settings_center_defaults_for_superadmin_only() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);

    ctx.login("admin").await;
    assert_eq!(
        ctx.get("/api/settings-center").await.status(),
        StatusCode::FORBIDDEN
    );

    ctx.login("root").await;
    let resp = ctx.get("/api/settings-center").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["referral_point_value"], Value::Null);
}

#[tokio::test]
async fn test_other_shop_settings_are_forbidden() {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.login("admin").await;

    let resp = ctx.get("/api/settings?shop_id=s2").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
