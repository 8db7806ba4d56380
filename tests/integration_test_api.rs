mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use common::{TestApp, STAFF_PASSWORD};
use lab_backend::domain::models::auth::Role;
use lab_backend::domain::services::auth_service::create_account;
use lab_backend::error::AppError;
use serde_json::{json, Value};
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;

    let (status, _) = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "username": "admin", "password": "wrong"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send("POST", "/api/v1/auth/login", None, Some(json!({
        "username": "nobody", "password": "admin123"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_reports_role_and_finance_flag() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let staff = app.staff().await;

    let (status, me) = app.send("GET", "/api/v1/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert_eq!(me["can_view_finance"], true);
    assert!(me.get("password_hash").is_none());

    let (_, me) = app.send("GET", "/api/v1/me", Some(&staff), None).await;
    assert_eq!(me["role"], "employee");
    assert_eq!(me["can_view_finance"], false);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = TestApp::new().await;
    let staff = app.staff().await;

    let response = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::COOKIE, format!("refresh_token={}", staff.refresh_token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["user"]["username"], "staff");
    assert!(body["csrf_token"].as_str().unwrap().len() >= 32);

    // The used refresh token is gone after rotation.
    let replay = app.router.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::COOKIE, format!("refresh_token={}", staff.refresh_token))
            .body(Body::empty())
            .unwrap()
    ).await.unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::new().await;
    let staff = app.staff().await;

    let (status, _) = app.send("POST", "/api/v1/auth/logout", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("POST", "/api/v1/auth/refresh", Some(&staff), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new().await;
    let staff = app.staff().await;

    let (status, _) = app.send("PUT", "/api/v1/me", Some(&staff), Some(json!({
        "username": "reception",
        "current_password": "nope"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("PUT", "/api/v1/me", Some(&staff), Some(json!({
        "new_password": "abc",
        "current_password": STAFF_PASSWORD
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("PUT", "/api/v1/me", Some(&staff), Some(json!({
        "username": "admin",
        "current_password": STAFF_PASSWORD
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, me) = app.send("PUT", "/api/v1/me", Some(&staff), Some(json!({
        "username": "reception",
        "new_password": "reception-2026",
        "current_password": STAFF_PASSWORD
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "reception");

    let relogin = app.login("reception", "reception-2026").await;
    let (_, me) = app.send("GET", "/api/v1/me", Some(&relogin), None).await;
    assert_eq!(me["username"], "reception");
}

#[tokio::test]
async fn test_settings_access_and_validation() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let staff = app.staff().await;

    let (status, _) = app.send("GET", "/api/v1/settings", Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("PUT", "/api/v1/settings", Some(&staff), Some(json!({"lab_name": "X"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, settings) = app.send("GET", "/api/v1/settings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["id"], 1);
    assert_eq!(settings["default_language"], "ar");
    assert_eq!(settings["publish_link"], "");

    for bad in [json!({"lab_name": " "}), json!({"publish_link": "relay.local"}), json!({"default_language": "de"})] {
        let (status, _) = app.send("PUT", "/api/v1/settings", Some(&admin), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, updated) = app.send("PUT", "/api/v1/settings", Some(&admin), Some(json!({
        "lab_name": "Nile Diagnostics",
        "default_language": "en",
        "show_language_switch": false
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["lab_name"], "Nile Diagnostics");
    assert_eq!(updated["show_finance"], true);

    let (status, public) = app.send("GET", "/api/v1/settings/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["lab_name"], "Nile Diagnostics");
    assert_eq!(public["default_language"], "en");
    assert_eq!(public["show_language_switch"], false);
    assert!(public.get("publish_link").is_none());
}

#[tokio::test]
async fn test_finance_report_permissions_and_totals() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let staff = app.staff().await;

    app.create_order(&admin, "A", None, "CBC", 150).await;
    app.create_order(&admin, "B", None, "TSH", 250).await;
    app.send("POST", "/api/v1/orders", Some(&admin), Some(json!({
        "name": "C", "test": "Vitamin D", "price": 40, "currency": "USD"
    }))).await;

    let (status, _) = app.send("GET", "/api/v1/finance", Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = app.send("GET", "/api/v1/finance", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["orders"].as_array().unwrap().len(), 3);
    assert_eq!(report["totals"], json!([
        {"currency": "EGP", "total": 400, "order_count": 2},
        {"currency": "USD", "total": 40, "order_count": 1}
    ]));

    let (_, staff_me) = app.send("GET", "/api/v1/me", Some(&staff), None).await;
    let staff_id = staff_me["id"].as_str().unwrap();

    let (status, _) = app.send("PUT", &format!("/api/v1/users/{}/finance-access", staff_id), Some(&staff), Some(json!({"allowed": true}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, granted) = app.send("PUT", &format!("/api/v1/users/{}/finance-access", staff_id), Some(&admin), Some(json!({"allowed": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(granted["can_view_finance"], true);

    let (status, _) = app.send("GET", "/api/v1/finance", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    app.send("PUT", "/api/v1/settings", Some(&admin), Some(json!({"show_finance": false}))).await;
    let (status, _) = app.send("GET", "/api/v1/finance", Some(&staff), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let yesterday = (Utc::now() - chrono::Duration::days(1)).date_naive();
    let (status, empty) = app.send("GET", &format!("/api/v1/finance?start_date={}&end_date={}", yesterday, yesterday), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(empty["orders"].as_array().unwrap().is_empty());

    let today = Utc::now().date_naive();
    let (status, _) = app.send("GET", &format!("/api/v1/finance?start_date={}&end_date={}", today, yesterday), Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    app.create_order(&admin, "Pending", None, "CBC", 100).await;
    app.published_order(&admin, "Done", "01000000002").await;
    let old = app.create_order(&admin, "Old", None, "CBC", 100).await;
    app.backdate_order(old["id"].as_str().unwrap(), 3).await;

    let (status, stats) = app.send("GET", "/api/v1/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["patient_count"], 3);
    assert_eq!(stats["order_count"], 3);
    assert_eq!(stats["today_orders"], 2);
    assert_eq!(stats["pending_results"], 2);
}

#[tokio::test]
async fn test_patient_search() {
    let app = TestApp::new().await;
    let staff = app.staff().await;

    app.create_order(&staff, "Sara Ahmed", Some("01012345678"), "CBC", 100).await;
    app.create_order(&staff, "Omar Sarhan", None, "CBC", 100).await;
    app.create_order(&staff, "Mona Ali", Some("01199990000"), "CBC", 100).await;

    let (_, by_name) = app.send("GET", "/api/v1/patients?search=sar", Some(&staff), None).await;
    assert_eq!(by_name.as_array().unwrap().len(), 2);

    let (_, by_phone) = app.send("GET", "/api/v1/patients?search=9999", Some(&staff), None).await;
    let by_phone = by_phone.as_array().unwrap();
    assert_eq!(by_phone.len(), 1);
    assert_eq!(by_phone[0]["name"], "Mona Ali");

    let (_, all) = app.send("GET", "/api/v1/patients", Some(&staff), None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, _) = app.send("GET", "/api/v1/patients/unknown", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_account_for_cli() {
    let app = TestApp::new().await;
    let users = app.state.user_repo.as_ref();

    let created = create_account(users, "  lab-tech ", "tech-pass-1", Role::Employee).await.unwrap();
    let created = created.expect("new account was not created");
    assert_eq!(created.username, "lab-tech");
    assert_ne!(created.password_hash, "tech-pass-1");

    let again = create_account(users, "lab-tech", "other-pass", Role::Admin).await.unwrap();
    assert!(again.is_none());

    assert!(matches!(create_account(users, "   ", "pw", Role::Employee).await, Err(AppError::Validation(_))));
    assert!(matches!(create_account(users, "nurse", "", Role::Employee).await, Err(AppError::Validation(_))));

    let tech = app.login("lab-tech", "tech-pass-1").await;
    let (status, me) = app.send("GET", "/api/v1/me", Some(&tech), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "employee");
}
