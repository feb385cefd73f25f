//! Login, OTP and the route guard, end to end.

use reqwest::StatusCode;
use serde_json::{Value, json};

use shopcrm_integration_tests::{TestContext, VALID_OTP, seed_shop};

async fn started() -> TestContext {
    let ctx = TestContext::start().await;
    seed_shop(&ctx.backend);
    ctx
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = started().await;
    let resp = ctx.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_api_request_gets_login_redirect() {
    let ctx = started().await;

    let resp = ctx.get("/api/customers/c1").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["redirect"], "/login");

    // The backend is never asked on behalf of an anonymous user
    assert!(ctx.backend.calls().is_empty());
}

#[tokio::test]
async fn test_anonymous_page_request_is_redirected() {
    let ctx = started().await;

    let resp = ctx.get("/verify-otp").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login");
}

#[tokio::test]
async fn test_bad_password_is_rejected() {
    let ctx = started().await;

    let resp = ctx
        .post(
            "/api/auth/login",
            &json!({ "username": "admin", "password": "wrong" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = ctx.get("/api/session").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unverified_customer_is_sent_to_otp() {
    let ctx = started().await;

    let body = ctx.login("unverified").await;
    assert_eq!(body["redirect"], "/verify-otp");

    for path in ["/api/customers/c2", "/api/session", "/api/navigation"] {
        let resp = ctx.get(path).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["redirect"], "/verify-otp", "{path}");
    }

    // The OTP page itself stays reachable
    let resp = ctx.get("/verify-otp").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn test_otp_verification_unlocks_the_console() {
    let ctx = started().await;
    ctx.login("unverified").await;

    let resp = ctx
        .post("/api/auth/otp/verify", &json!({ "otp": "000000" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        ctx.get("/api/session").await.status(),
        StatusCode::FORBIDDEN
    );

    let resp = ctx
        .post("/api/auth/otp/verify", &json!({ "otp": VALID_OTP }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["otp_verify"], true);
    assert_eq!(body["redirect"], "/");

    let resp = ctx.get("/api/session").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["id"], "c2");
    assert_eq!(body["shop_id"], "s1");
}

#[tokio::test]
async fn test_staff_skip_otp() {
    let ctx = started().await;

    let body = ctx.login("employee").await;
    assert_eq!(body["redirect"], "/");

    let resp = ctx.get("/api/session").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["role"], "employee");
    assert_eq!(body["branch_id"], "b1");
    assert_eq!(body["has_line_token"], false);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let ctx = started().await;
    ctx.login("admin").await;
    assert_eq!(ctx.get("/api/session").await.status(), StatusCode::OK);

    let resp = ctx.post("/api/auth/logout", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        ctx.get("/api/session").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_navigation_follows_role() {
    let ctx = started().await;
    ctx.backend.insert(
        "packages",
        json!({
            "id": "pk-basic", "name": "Basic", "duration_days": 30, "price": "990",
            "menus": ["customers", "points", "promotions"]
        }),
    );
    ctx.backend.insert(
        "shops",
        json!({ "id": "s1", "name": "Sunrise Cafe", "package_id": "pk-basic" }),
    );
    ctx.login("employee").await;

    let resp = ctx.get("/api/navigation").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<Value> = resp.json().await.unwrap();
    let keys: Vec<&str> = items.iter().filter_map(|i| i["key"].as_str()).collect();

    // Promotions is in the package but hidden from employees
    assert_eq!(keys, ["dashboard", "customers", "points"]);
}
