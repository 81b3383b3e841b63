use std::time::Duration;

use super::*;
use tokio::time::timeout;

#[test]
fn new_token_is_not_triggered() {
    let shutdown = Shutdown::new();
    assert!(!shutdown.is_triggered());
    assert!(!Shutdown::default().is_triggered());
}

#[test]
fn trigger_is_idempotent() {
    let shutdown = Shutdown::new();
    assert!(shutdown.trigger());
    assert!(!shutdown.trigger());
    assert!(shutdown.is_triggered());
}

#[tokio::test]
async fn trigger_wakes_every_clone() {
    let shutdown = Shutdown::new();
    let a = shutdown.clone();
    let b = shutdown.clone();

    let wait_a = tokio::spawn(async move { a.triggered().await });
    let wait_b = tokio::spawn(async move { b.triggered().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.trigger();

    timeout(Duration::from_secs(1), wait_a).await.expect("clone a not woken").unwrap();
    timeout(Duration::from_secs(1), wait_b).await.expect("clone b not woken").unwrap();
}

#[tokio::test]
async fn triggered_resolves_immediately_after_trigger() {
    let shutdown = Shutdown::new();
    shutdown.trigger();
    timeout(Duration::from_millis(100), shutdown.triggered())
        .await
        .expect("already-triggered token should resolve at once");
}

#[tokio::test]
async fn untriggered_token_stays_pending() {
    let shutdown = Shutdown::new();
    assert!(
        timeout(Duration::from_millis(50), shutdown.triggered()).await.is_err(),
        "token should not resolve without a trigger"
    );
}
