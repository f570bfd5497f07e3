mod common;

use idv_voucher_backend::models::account::CreateAccountRequest;
use idv_voucher_backend::models::binding::CreateBindingRequest;
use idv_voucher_backend::models::enums::BindingStep;
use idv_voucher_backend::models::server::CreateServerRequest;
use idv_voucher_backend::models::{Account, Binding, Server};
use idv_voucher_backend::services::orchestration_runtime::validate_binding_startable;

async fn seed_binding(db: &sea_orm::DatabaseConnection) -> Binding {
    let server = Server::create(
        db,
        CreateServerRequest {
            port: 9300,
            base_url: "http://127.0.0.1:9300".to_string(),
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
        db,
        CreateAccountRequest {
            msisdn: "081234522222".to_string(),
            batch_id: "batch-orch".to_string(),
            email: "orch@example.com".to_string(),
            pin: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    Binding::create(
        db,
        CreateBindingRequest {
            server_id: server.id,
            account_id: account.id,
            batch_id: account.batch_id.clone(),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn unknown_binding_is_not_startable() {
    let db = common::setup_db().await;
    let (ok, reason) = validate_binding_startable(&db, 999).await.unwrap();
    assert!(!ok);
    assert_eq!(reason, "binding_not_found");
}

#[tokio::test]
async fn freshly_bound_binding_is_not_startable_until_token_login_fetched() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;

    let (ok, reason) = validate_binding_startable(&db, binding.id).await.unwrap();
    assert!(!ok);
    assert_eq!(reason, "binding_step_not_ready");
}

#[tokio::test]
async fn binding_with_token_login_fetched_is_startable() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;

    Binding::set_step(&db, binding.id, BindingStep::TokenLoginFetched)
        .await
        .unwrap();

    let (ok, reason) = validate_binding_startable(&db, binding.id).await.unwrap();
    assert!(ok);
    assert_eq!(reason, "ok");
}

#[tokio::test]
async fn logged_out_binding_is_not_startable_even_with_token_login_fetched() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;

    Binding::set_step(&db, binding.id, BindingStep::TokenLoginFetched)
        .await
        .unwrap();
    Binding::unbind(&db, binding.id).await.unwrap();

    let (ok, reason) = validate_binding_startable(&db, binding.id).await.unwrap();
    assert!(!ok);
    assert_eq!(reason, "binding_logged_out");
}
