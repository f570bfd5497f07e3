mod common;

use idv_voucher_backend::models::account::CreateAccountRequest;
use idv_voucher_backend::models::binding::CreateBindingRequest;
use idv_voucher_backend::models::enums::TransactionStatus;
use idv_voucher_backend::models::server::CreateServerRequest;
use idv_voucher_backend::models::transaction::CreateTransactionRequest;
use idv_voucher_backend::models::{Account, Binding, Server, Transaction};
use idv_voucher_backend::services::transaction_service::TransactionService;

async fn seed_binding(db: &sea_orm::DatabaseConnection) -> Binding {
    let server = Server::create(
        db,
        CreateServerRequest {
            port: 9200,
            base_url: "http://127.0.0.1:9200".to_string(),
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
            msisdn: "081234511111".to_string(),
            batch_id: "batch-trx".to_string(),
            email: "trx@example.com".to_string(),
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
async fn create_transaction_starts_processing_and_is_listed_by_binding() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;
    let service = TransactionService::new(&db);

    let trx = service
        .create_transaction(
            CreateTransactionRequest {
                trx_id: "TRX-0001".to_string(),
                server_id: binding.server_id,
                account_id: binding.account_id,
                binding_id: binding.id,
                batch_id: binding.batch_id.clone(),
                device_id: None,
                product_id: "PRODUCT-1".to_string(),
                email: "trx@example.com".to_string(),
                limit_harga: 50_000,
            },
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(trx.status, TransactionStatus::Processing);

    let listed = service.list_transactions(Some(binding.id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, trx.id);
}

#[tokio::test]
async fn stop_transaction_finalizes_to_gagal() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;
    let service = TransactionService::new(&db);

    let trx = service
        .create_transaction(
            CreateTransactionRequest {
                trx_id: "TRX-0002".to_string(),
                server_id: binding.server_id,
                account_id: binding.account_id,
                binding_id: binding.id,
                batch_id: binding.batch_id.clone(),
                device_id: None,
                product_id: "PRODUCT-1".to_string(),
                email: "trx@example.com".to_string(),
                limit_harga: 50_000,
            },
            None,
            None,
        )
        .await
        .unwrap();

    let stopped = service
        .stop_transaction(trx.id, Some("operator_requested".to_string()))
        .await
        .unwrap();

    assert_eq!(stopped.status, TransactionStatus::Gagal);
}

#[tokio::test]
async fn pause_then_stop_is_rejected_after_finalization() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;
    let service = TransactionService::new(&db);

    let trx = service
        .create_transaction(
            CreateTransactionRequest {
                trx_id: "TRX-0003".to_string(),
                server_id: binding.server_id,
                account_id: binding.account_id,
                binding_id: binding.id,
                batch_id: binding.batch_id.clone(),
                device_id: None,
                product_id: "PRODUCT-1".to_string(),
                email: "trx@example.com".to_string(),
                limit_harga: 50_000,
            },
            None,
            None,
        )
        .await
        .unwrap();

    service.pause_transaction(trx.id, None).await.unwrap();
    service.stop_transaction(trx.id, None).await.unwrap();

    let err = service
        .stop_transaction(trx.id, None)
        .await
        .expect_err("stopping an already-finalized transaction should be rejected");
    assert!(err.to_string().contains("not allowed from status"));
}

#[tokio::test]
async fn transaction_delete_removes_row() {
    let db = common::setup_db().await;
    let binding = seed_binding(&db).await;
    let service = TransactionService::new(&db);

    let trx = service
        .create_transaction(
            CreateTransactionRequest {
                trx_id: "TRX-0004".to_string(),
                server_id: binding.server_id,
                account_id: binding.account_id,
                binding_id: binding.id,
                batch_id: binding.batch_id.clone(),
                device_id: None,
                product_id: "PRODUCT-1".to_string(),
                email: "trx@example.com".to_string(),
                limit_harga: 50_000,
            },
            None,
            None,
        )
        .await
        .unwrap();

    Transaction::delete(&db, trx.id).await.unwrap();
    assert!(Transaction::find_by_id(&db, trx.id).await.unwrap().is_none());
}
