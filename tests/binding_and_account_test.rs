mod common;

use idv_voucher_backend::models::account::CreateAccountRequest;
use idv_voucher_backend::models::binding::CreateBindingRequest;
use idv_voucher_backend::models::server::CreateServerRequest;
use idv_voucher_backend::models::{Account, Binding, Server};
use idv_voucher_backend::models::enums::{AccountStatus, BindingStep};

#[tokio::test]
async fn account_create_rejects_duplicate_msisdn_in_same_batch() {
    let db = common::setup_db().await;

    let req = CreateAccountRequest {
        msisdn: "081234500001".to_string(),
        batch_id: "batch-1".to_string(),
        email: "a@example.com".to_string(),
        pin: Some("111111".to_string()),
        notes: None,
    };
    Account::create(&db, req).await.expect("first create should succeed");

    let dup = CreateAccountRequest {
        msisdn: "081234500001".to_string(),
        batch_id: "batch-1".to_string(),
        email: "a@example.com".to_string(),
        pin: Some("111111".to_string()),
        notes: None,
    };
    let err = Account::create(&db, dup).await.expect_err("duplicate should be rejected");
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn account_starts_in_new_status() {
    let db = common::setup_db().await;

    let account = Account::create(
        &db,
        CreateAccountRequest {
            msisdn: "081234500002".to_string(),
            batch_id: "batch-1".to_string(),
            email: "b@example.com".to_string(),
            pin: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(account.status, AccountStatus::New);
}

#[tokio::test]
async fn binding_create_links_account_and_server_and_starts_bound() {
    let db = common::setup_db().await;

    let server = Server::create(
        &db,
        CreateServerRequest {
            port: 9001,
            base_url: "http://127.0.0.1:9001".to_string(),
            timeout: None,
            retries: None,
            wait_between_retries: None,
            max_requests_queued: None,
            device_id: None,
        },
    )
    .await
    .unwrap();

    let account = Account::create(
        &db,
        CreateAccountRequest {
            msisdn: "081234500003".to_string(),
            batch_id: "batch-1".to_string(),
            email: "c@example.com".to_string(),
            pin: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let binding = Binding::create(
        &db,
        CreateBindingRequest {
            server_id: server.id,
            account_id: account.id,
            batch_id: account.batch_id.clone(),
        },
    )
    .await
    .unwrap();

    assert_eq!(binding.server_id, server.id);
    assert_eq!(binding.account_id, account.id);
    assert_eq!(binding.step, BindingStep::Bound);

    let fetched = Binding::find_by_id(&db, binding.id).await.unwrap();
    assert!(fetched.is_some());
}

#[tokio::test]
async fn server_create_rejects_duplicate_port() {
    let db = common::setup_db().await;

    let first = CreateServerRequest {
        port: 9100,
        base_url: "http://127.0.0.1:9100".to_string(),
        timeout: None,
        retries: None,
        wait_between_retries: None,
        max_requests_queued: None,
        device_id: None,
    };
    Server::create(&db, first).await.unwrap();

    let dup = CreateServerRequest {
        port: 9100,
        base_url: "http://127.0.0.1:9999".to_string(),
        timeout: None,
        retries: None,
        wait_between_retries: None,
        max_requests_queued: None,
        device_id: None,
    };
    let err = Server::create(&db, dup).await.expect_err("duplicate port should be rejected");
    assert!(err.to_string().contains("Port already registered"));
}
