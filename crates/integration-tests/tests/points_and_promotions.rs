//! Points adjustments, promotion claims and claim approval.

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopcrm_integration_tests::{TestContext, seed_shop};

async fn with_promotions() -> TestContext {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx.backend.insert(
        "promotions",
        json!({ "id": "p-coffee", "shop_id": "s1", "name": "Free coffee", "point_cost": 30 }),
    );
    ctx.backend.insert(
        "promotions",
        json!({ "id": "p-trip", "shop_id": "s1", "name": "Weekend trip", "point_cost": 500 }),
    );
    ctx.backend.insert(
        "promotions",
        json!({
            "id": "p-old", "shop_id": "s1", "name": "Launch week", "point_cost": 10,
            "ends_at": "2020-01-07T00:00:00Z"
        }),
    );
    ctx
}

#[tokio::test]
async fn test_admin_adds_points_and_balance_follows() {
    let ctx = with_promotions().await;
    ctx.login("admin").await;

    let resp = ctx
        .post(
            "/api/points",
            &json!({ "customer_id": "c1", "detail": "bonus", "points": 50 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let entry: Value = resp.json().await.unwrap();
    assert_eq!(entry["points"], 50);
    assert_eq!(entry["detail"], "bonus");
    assert_eq!(entry["created_by"], "u-admin");

    let resp = ctx.get("/api/customers/c1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let customer: Value = resp.json().await.unwrap();
    assert_eq!(customer["points"], 150);

    let resp = ctx.get("/api/customers/c1/points").await;
    let history: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_zero_points_never_reach_the_backend() {
    let ctx = with_promotions().await;
    ctx.login("employee").await;

    let resp = ctx
        .post(
            "/api/points",
            &json!({ "customer_id": "c1", "detail": "oops", "points": 0 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!ctx.backend.calls().iter().any(|c| c == "POST /points"));
}

#[tokio::test]
async fn test_customers_cannot_add_points() {
    let ctx = with_promotions().await;
    ctx.login("verified").await;

    let resp = ctx
        .post(
            "/api/points",
            &json!({ "customer_id": "c1", "detail": "free", "points": 1000 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(ctx.backend.records("points").is_empty());
}

#[tokio::test]
async fn test_customer_claims_promotion() {
    let ctx = with_promotions().await;
    ctx.login("verified").await;

    let resp = ctx.post("/api/promotions/p-coffee/claim", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let claim: Value = resp.json().await.unwrap();
    assert_eq!(claim["customer_id"], "c1");
    assert_eq!(claim["promotion_id"], "p-coffee");
    assert_eq!(claim["status"], "pending");
}

#[tokio::test]
async fn test_claim_with_insufficient_points_creates_nothing() {
    let ctx = with_promotions().await;
    ctx.login("verified").await;

    let resp = ctx.post("/api/promotions/p-trip/claim", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["points"].is_string());

    assert!(ctx.backend.records("promotion-histories").is_empty());
    assert!(
        !ctx.backend
            .calls()
            .iter()
            .any(|c| c == "POST /promotion-histories")
    );
}

#[tokio::test]
async fn test_expired_promotion_cannot_be_claimed() {
    let ctx = with_promotions().await;
    ctx.login("employee").await;

    let resp = ctx
        .post("/api/promotions/p-old/claim", &json!({ "customer_id": "c1" }))
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["promotion_id"].is_string());
    assert!(ctx.backend.records("promotion-histories").is_empty());
}

#[tokio::test]
async fn test_employee_approves_pending_claim() {
    let ctx = with_promotions().await;
    ctx.backend.insert(
        "promotion-histories",
        json!({
            "id": "h1", "customer_id": "c1", "promotion_id": "p-coffee",
            "status": "pending"
        }),
    );
    ctx.login("employee").await;

    let resp = ctx
        .post("/api/promotion-histories/h1/approve", &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let claim: Value = resp.json().await.unwrap();
    assert_eq!(claim["status"], "approved");
    assert_eq!(claim["approved_by"], "u-emp");
    assert!(claim["approved_at"].is_string());

    // A decided claim stays decided
    let resp = ctx
        .post("/api/promotion-histories/h1/reject", &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let stored = ctx.backend.record("promotion-histories", "h1").unwrap();
    assert_eq!(stored["status"], "approved");
}

#[tokio::test]
async fn test_customers_cannot_approve_claims() {
    let ctx = with_promotions().await;
    ctx.backend.insert(
        "promotion-histories",
        json!({
            "id": "h1", "customer_id": "c1", "promotion_id": "p-coffee",
            "status": "pending"
        }),
    );
    ctx.login("verified").await;

    let resp = ctx
        .post("/api/promotion-histories/h1/approve", &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let stored = ctx.backend.record("promotion-histories", "h1").unwrap();
    assert_eq!(stored["status"], "pending");
}

#[tokio::test]
async fn test_other_shop_employee_cannot_see_claim_status() {
    let ctx = with_promotions().await;
    ctx.backend.add_user(
        "outsider",
        json!({
            "id": "u-out", "name": "Otto", "role": "employee",
            "shop_id": "s2", "branch_id": "b9"
        }),
    );
    ctx.backend.insert(
        "promotion-histories",
        json!({
            "id": "h1", "customer_id": "c1", "promotion_id": "p-coffee",
            "status": "approved", "approved_by": "u-emp"
        }),
    );
    ctx.login("outsider").await;

    // Same answer for a decided claim as for a pending one
    let resp = ctx
        .post("/api/promotion-histories/h1/reject", &json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(
        !ctx.backend
            .calls()
            .iter()
            .any(|c| c.starts_with("PATCH /promotion-histories"))
    );
}

#[tokio::test]
async fn test_claim_list_carries_names() {
    let ctx = with_promotions().await;
    ctx.backend.insert(
        "promotion-histories",
        json!({
            "id": "h1", "customer_id": "c1", "promotion_id": "p-coffee",
            "status": "pending"
        }),
    );
    ctx.login("admin").await;

    let resp = ctx.get("/api/promotion-histories").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let claims: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0]["customer_name"], "Carl");
    assert_eq!(claims[0]["promotion_name"], "Free coffee");
}
