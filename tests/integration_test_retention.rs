mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::TestApp;
use lab_backend::background::{run_retention_sweep, start_retention_sweeper};
use lab_backend::error::AppError;
use tokio::sync::watch;

#[tokio::test]
async fn test_sweep_expires_old_published_results() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let order = app.published_order(&admin, "Sara Ahmed", "01012345678").await;
    let id = order["id"].as_str().unwrap();
    let pin = order["pin"].as_str().unwrap();
    let file = order["result_file"].as_str().unwrap().to_string();
    assert_eq!(app.check(pin, "01012345678").await["status"], "success");

    app.backdate_order(id, 20).await;
    let expired = run_retention_sweep(&app.state).await.unwrap();
    assert_eq!(expired, 1);

    let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", id), Some(&admin), None).await;
    assert_eq!(current["state"], "EXPIRED");
    assert!(current["result_file"].is_null());
    assert_eq!(current["published"], false);
    assert!(!current["expired_at"].is_null());
    assert!(!app.result_path(&file).exists());

    assert_eq!(app.check(pin, "01012345678").await["status"], "not_found");
}

#[tokio::test]
async fn test_republish_after_sweep_fails() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let order = app.published_order(&admin, "Tamer Said", "01099988877").await;
    let id = order["id"].as_str().unwrap();
    app.backdate_order(id, 30).await;
    run_retention_sweep(&app.state).await.unwrap();

    let (status, _) = app.send("POST", &format!("/api/v1/orders/{}/republish", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", id), Some(&admin), None).await;
    assert_eq!(current["state"], "EXPIRED");
    assert_eq!(current["published"], false);
}

#[tokio::test]
async fn test_sweep_skips_recent_and_unpublished_orders() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let recent = app.published_order(&admin, "Recent Patient", "01011112222").await;

    let pending = app.create_order(&admin, "Pending Patient", None, "CBC", 100).await;
    let pending_id = pending["id"].as_str().unwrap();
    let (_, uploaded) = app.upload(&admin, pending_id, "scan.png", b"png").await;
    app.backdate_order(pending_id, 40).await;

    assert_eq!(run_retention_sweep(&app.state).await.unwrap(), 0);

    let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", recent["id"].as_str().unwrap()), Some(&admin), None).await;
    assert_eq!(current["state"], "PUBLISHED");

    let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", pending_id), Some(&admin), None).await;
    assert_eq!(current["state"], "RESULT_UPLOADED");
    assert!(app.result_path(uploaded["result_file"].as_str().unwrap()).exists());
}

#[tokio::test]
async fn test_upload_after_expiry_restarts_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let order = app.published_order(&admin, "Rana Fouad", "01066667777").await;
    let id = order["id"].as_str().unwrap();
    app.backdate_order(id, 20).await;
    run_retention_sweep(&app.state).await.unwrap();

    let (status, uploaded) = app.upload(&admin, id, "again.pdf", b"%PDF again").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["state"], "RESULT_UPLOADED");
    assert!(uploaded["expired_at"].is_null());
}

#[tokio::test]
async fn test_sweeper_task_runs_immediately_and_stops() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let order = app.published_order(&admin, "Old Result", "01033334444").await;
    let id = order["id"].as_str().unwrap();
    app.backdate_order(id, 15).await;

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(start_retention_sweeper(app.state.clone(), rx));

    let mut expired = false;
    for _ in 0..50 {
        let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", id), Some(&admin), None).await;
        if current["state"] == "EXPIRED" {
            expired = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(expired, "first sweep did not run at startup");

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_out_of_range_retention_fails_sweep_without_panicking() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let order = app.published_order(&admin, "Long Retention", "01088889999").await;
    let id = order["id"].as_str().unwrap();
    app.backdate_order(id, 20).await;

    let mut state = (*app.state).clone();
    state.config.retention_days = i64::MAX;
    let state = Arc::new(state);

    assert!(matches!(run_retention_sweep(&state).await, Err(AppError::Config(_))));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(start_retention_sweeper(state, rx));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished(), "sweeper exited after a failed sweep");

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();

    let (_, current) = app.send("GET", &format!("/api/v1/orders/{}", id), Some(&admin), None).await;
    assert_eq!(current["state"], "PUBLISHED");
}
