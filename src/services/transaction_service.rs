//! Transaction service (C6): the voucher purchase flow itself —
//! precheck/order/status/balance lifecycle and manual control operations.

use serde_json::Value;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::models::enums::{TransactionOtpStatus, TransactionStatus};
use crate::models::transaction::CreateTransactionRequest;
use crate::models::{Account, Binding, Server, Transaction, TransactionSnapshot};
use crate::services::errors::AppError;
use crate::services::idv_client::{IdvClient, IdvClientConfig};
use crate::services::idv_interpret::{self, parse_balance, parse_order_response, parse_status_response};
use crate::services::workflow_guard::ensure_transaction_status;

pub struct TransactionService<'a> {
    db: &'a DatabaseConnection,
}

/// Outcome of `check_balance_and_continue_or_stop` (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceCheckAction {
    Continued,
    Stopped,
}

impl<'a> TransactionService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    fn idv_client_for(server: &Server) -> Result<IdvClient, AppError> {
        IdvClient::new(IdvClientConfig {
            base_url: server.base_url.clone(),
            timeout_seconds: server.timeout.max(1) as u64,
            retries: server.retries.max(1) as u32,
            backoff_factor: server.wait_between_retries.max(1) as f64,
        })
    }

    async fn load_binding_context(&self, binding_id: i32) -> Result<(Binding, Account, Server), AppError> {
        let binding = Binding::find_by_id(self.db, binding_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binding ID {binding_id} not found")))?;
        let account = Account::find_by_id(self.db, binding.account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account ID {} not found", binding.account_id)))?;
        let server = Server::find_by_id(self.db, binding.server_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Server ID {} not found", binding.server_id)))?;
        Ok((binding, account, server))
    }

    async fn fetch_balance_int(idv: &IdvClient, msisdn: &str) -> Result<Option<i64>, AppError> {
        let balance_resp = idv.get_balance_pulsa(msisdn).await?;
        Ok(parse_balance(&balance_resp))
    }

    /// `create_transaction(data, snapshot?)` (§4.4).
    pub async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
        balance_start: Option<i64>,
        trx_idv_raw: Option<Value>,
    ) -> Result<Transaction, AppError> {
        let trx = Transaction::create(self.db, req).await?;
        if balance_start.is_some() || trx_idv_raw.is_some() {
            TransactionSnapshot::create(self.db, trx.id, balance_start).await?;
            if let Some(raw) = trx_idv_raw {
                TransactionSnapshot::update(self.db, trx.id, None, Some(raw), None).await?;
            }
        }
        info!(transaction_id = trx.id, "transaction created");
        Ok(trx)
    }

    pub async fn get_transaction(&self, transaction_id: i32) -> Result<Transaction, AppError> {
        Transaction::find_by_id(self.db, transaction_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Transaction ID {transaction_id} not found")))
    }

    pub async fn list_transactions(
        &self,
        binding_id: Option<i32>,
    ) -> Result<Vec<Transaction>, AppError> {
        match binding_id {
            Some(binding_id) => Ok(Transaction::list_by_binding(self.db, binding_id).await?),
            None => Ok(Transaction::list_active(self.db).await?),
        }
    }

    /// `start_transaction(payload)` (§4.4): balance_start -> trx_idv ->
    /// status_idv -> balance_end, with an insufficient-balance precheck stop.
    pub async fn start_transaction(
        &self,
        binding_id: i32,
        product_id: &str,
        email: &str,
        limit_harga: i64,
    ) -> Result<Transaction, AppError> {
        let (binding, account, server) = self.load_binding_context(binding_id).await?;
        crate::services::workflow_guard::ensure_binding_step("start_transaction", binding.step)?;
        let idv = Self::idv_client_for(&server)?;

        let balance_start_int = Self::fetch_balance_int(&idv, &account.msisdn).await?;

        if let Some(balance) = balance_start_int {
            if limit_harga > 0 && balance < limit_harga {
                let error_message = format!("insufficient_balance_before_start: {balance} < {limit_harga}");
                let local_trx_id = format!(
                    "precheck-{}-{}",
                    binding.id,
                    chrono::Utc::now().timestamp_millis()
                );

                let trx = self
                    .create_transaction(
                        CreateTransactionRequest {
                            trx_id: local_trx_id,
                            server_id: server.id,
                            account_id: account.id,
                            binding_id: binding.id,
                            batch_id: account.batch_id.clone(),
                            device_id: binding.device_id.clone(),
                            product_id: product_id.to_string(),
                            email: email.to_string(),
                            limit_harga,
                        },
                        balance_start_int,
                        Some(serde_json::json!({
                            "precheck": {
                                "status": "stopped",
                                "reason": "insufficient_balance_before_start",
                                "balance_start": balance,
                                "limit_harga": limit_harga,
                            }
                        })),
                    )
                    .await?;

                Transaction::finalize(
                    self.db,
                    trx.id,
                    TransactionStatus::Gagal,
                    None,
                    Some(limit_harga),
                    None,
                    None,
                    Some(error_message),
                )
                .await?;
                TransactionSnapshot::update(
                    self.db,
                    trx.id,
                    Some(balance),
                    None,
                    Some(serde_json::json!({"precheck_result": "stopped_insufficient_balance"})),
                )
                .await?;

                info!(
                    binding_id = binding.id,
                    account_id = account.id,
                    transaction_id = trx.id,
                    "transaction auto-stopped before trx_idv due to insufficient balance"
                );
                return self.get_transaction(trx.id).await;
            }
        }

        let trx_resp = idv.trx_voucher_idv(&account.msisdn, product_id, email, limit_harga).await?;
        let order = parse_order_response(&trx_resp);
        let trx_id = order
            .trx_id
            .ok_or_else(|| AppError::validation("transaction_trx_id_missing", "trx_id missing from transaction response"))?;

        let otp_required = compute_otp_required(account.last_device_id.as_deref(), binding.device_id.as_deref());

        let trx = self
            .create_transaction(
                CreateTransactionRequest {
                    trx_id: trx_id.clone(),
                    server_id: server.id,
                    account_id: account.id,
                    binding_id: binding.id,
                    batch_id: account.batch_id.clone(),
                    device_id: binding.device_id.clone(),
                    product_id: product_id.to_string(),
                    email: email.to_string(),
                    limit_harga,
                },
                balance_start_int,
                Some(trx_resp),
            )
            .await?;
        if otp_required {
            Transaction::set_otp_required(self.db, trx.id, true).await?;
        }
        if let Some(is_success) = order.is_success {
            Transaction::finalize(self.db, trx.id, TransactionStatus::Processing, order.t_id.clone(), None, None, Some(is_success as i32), None)
                .await?;
        }

        let status_resp = idv.status_trx(&account.msisdn, &trx_id).await?;
        let status = parse_status_response(&status_resp);
        let status_value = idv_interpret::compute_final_status(&status, false);

        let balance_end_int = Self::fetch_balance_int(&idv, &account.msisdn).await?;

        Transaction::finalize(
            self.db,
            trx.id,
            status_value,
            None,
            None,
            status.voucher.clone(),
            status.is_success.map(|v| v as i32),
            None,
        )
        .await?;
        if status_value == TransactionStatus::Processing {
            Transaction::set_otp_status(self.db, trx.id, TransactionOtpStatus::Pending).await?;
        }
        TransactionSnapshot::update(self.db, trx.id, balance_end_int, None, Some(status_resp)).await?;

        self.get_transaction(trx.id).await
    }

    /// `submit_otp(transaction_id, otp)` (§4.4).
    pub async fn submit_otp(&self, transaction_id: i32, otp: &str) -> Result<Transaction, AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("submit_otp", trx.status)?;
        let (binding, account, server) = self.load_binding_context(trx.binding_id).await?;
        let idv = Self::idv_client_for(&server)?;

        let otp_resp = idv.otp_trx(&account.msisdn, otp).await?;

        let status_resp = idv.status_trx(&account.msisdn, &trx.trx_id).await?;
        let status = parse_status_response(&status_resp);
        let status_value = idv_interpret::compute_final_status(&status, true);
        let balance_end_int = Self::fetch_balance_int(&idv, &account.msisdn).await?;

        let otp_status = if matches!(status_value, TransactionStatus::Sukses | TransactionStatus::Suspect) {
            TransactionOtpStatus::Success
        } else {
            TransactionOtpStatus::Failed
        };

        Transaction::finalize(
            self.db,
            trx.id,
            status_value,
            None,
            None,
            status.voucher.clone(),
            status.is_success.map(|v| v as i32),
            extract_otp_error(&otp_resp),
        )
        .await?;
        Transaction::set_otp_status(self.db, trx.id, otp_status).await?;

        if is_otp_ok(&otp_resp) {
            if let Some(device_id) = binding.device_id.clone() {
                Account::sync_from_provider(self.db, account.id, None, account.is_reseller, Some(device_id)).await?;
            }
        }

        TransactionSnapshot::update(self.db, trx.id, balance_end_int, None, Some(status_resp)).await?;

        self.get_transaction(trx.id).await
    }

    /// `stop_transaction(transaction_id, reason?)` (§4.4).
    pub async fn stop_transaction(&self, transaction_id: i32, reason: Option<String>) -> Result<Transaction, AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("stop_transaction", trx.status)?;
        Ok(Transaction::stop(self.db, trx.id, reason).await?)
    }

    /// `pause_transaction(transaction_id, reason?)` (§4.4).
    pub async fn pause_transaction(&self, transaction_id: i32, reason: Option<String>) -> Result<Transaction, AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("pause_transaction", trx.status)?;
        let updated = Transaction::pause(self.db, trx.id, reason.clone()).await?;
        info!(transaction_id = trx.id, reason = reason.as_deref().unwrap_or(""), "transaction paused");
        Ok(updated)
    }

    /// `resume_transaction(transaction_id)` (§4.4): re-checks balance before resuming.
    pub async fn resume_transaction(&self, transaction_id: i32) -> Result<Transaction, AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("resume_transaction", trx.status)?;
        let (_binding, account, server) = self.load_binding_context(trx.binding_id).await?;
        let idv = Self::idv_client_for(&server)?;
        let current_balance = Self::fetch_balance_int(&idv, &account.msisdn)
            .await?
            .ok_or_else(|| {
                AppError::validation("balance_check_failed", "cannot check balance before resuming transaction")
            })?;

        if current_balance < trx.limit_harga {
            return Err(AppError::validation(
                "insufficient_balance",
                format!(
                    "insufficient balance to resume transaction: current {current_balance}, required {}",
                    trx.limit_harga
                ),
            ));
        }

        let updated = Transaction::resume(self.db, trx.id).await?;
        info!(transaction_id = trx.id, balance = current_balance, "transaction resumed");
        Ok(updated)
    }

    /// `continue_transaction(transaction_id)` (§4.4): re-checks status_idv and balance_end.
    pub async fn continue_transaction(&self, transaction_id: i32) -> Result<Transaction, AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("continue_transaction", trx.status)?;
        let (_binding, account, server) = self.load_binding_context(trx.binding_id).await?;
        let idv = Self::idv_client_for(&server)?;

        let status_resp = idv.status_trx(&account.msisdn, &trx.trx_id).await?;
        let status = parse_status_response(&status_resp);
        let status_value = idv_interpret::compute_final_status(&status, true);
        let balance_end_int = Self::fetch_balance_int(&idv, &account.msisdn).await?;

        Transaction::finalize(
            self.db,
            trx.id,
            status_value,
            None,
            None,
            status.voucher.clone(),
            status.is_success.map(|v| v as i32),
            None,
        )
        .await?;
        TransactionSnapshot::update(self.db, trx.id, balance_end_int, None, Some(status_resp)).await?;

        self.get_transaction(trx.id).await
    }

    /// `check_balance_and_continue_or_stop(transaction_id)` (§4.4, §4.6):
    /// on-demand auto-decision used by the orchestration runtime's cycle.
    pub async fn check_balance_and_continue_or_stop(
        &self,
        transaction_id: i32,
    ) -> Result<(Transaction, BalanceCheckAction), AppError> {
        let trx = self.get_transaction(transaction_id).await?;
        ensure_transaction_status("check_balance_and_continue_or_stop", trx.status)?;
        let (_binding, account, server) = self.load_binding_context(trx.binding_id).await?;
        let idv = Self::idv_client_for(&server)?;

        let current_balance = Self::fetch_balance_int(&idv, &account.msisdn)
            .await?
            .ok_or_else(|| AppError::validation("balance_check_failed", "cannot check balance for transaction"))?;

        let threshold = trx.limit_harga;
        if current_balance < threshold {
            info!(transaction_id = trx.id, current_balance, threshold, "auto-stopping transaction: balance insufficient");
            let updated = self
                .stop_transaction(
                    trx.id,
                    Some(format!("auto_stop_balance_insufficient: {current_balance} < {threshold}")),
                )
                .await?;
            Ok((updated, BalanceCheckAction::Stopped))
        } else {
            info!(transaction_id = trx.id, current_balance, threshold, "continuing transaction: balance sufficient");
            let updated = self.continue_transaction(trx.id).await?;
            Ok((updated, BalanceCheckAction::Continued))
        }
    }
}

fn compute_otp_required(last_device_id: Option<&str>, current_device_id: Option<&str>) -> bool {
    match (last_device_id, current_device_id) {
        (Some(last), Some(current)) => last != current,
        _ => true,
    }
}

fn extract_otp_error(otp_resp: &Value) -> Option<String> {
    otp_resp
        .get("res")
        .and_then(|r| r.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn is_otp_ok(otp_resp: &Value) -> bool {
    let res = match otp_resp.get("res") {
        Some(res) => res,
        None => return false,
    };
    res.get("status").map(|v| v == "200").unwrap_or(false)
        || res
            .get("status_msg")
            .and_then(Value::as_str)
            .map(|s| s.eq_ignore_ascii_case("success"))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_required_defaults_true_when_either_device_id_missing() {
        assert!(compute_otp_required(None, Some("D1")));
        assert!(compute_otp_required(Some("D1"), None));
        assert!(compute_otp_required(None, None));
    }

    #[test]
    fn otp_required_false_only_when_devices_match() {
        assert!(!compute_otp_required(Some("D1"), Some("D1")));
        assert!(compute_otp_required(Some("D1"), Some("D2")));
    }

    #[test]
    fn otp_ok_detected_via_status_or_status_msg() {
        assert!(is_otp_ok(&serde_json::json!({"res": {"status": "200"}})));
        assert!(is_otp_ok(&serde_json::json!({"res": {"status_msg": "Success"}})));
        assert!(!is_otp_ok(&serde_json::json!({"res": {"status": "400"}})));
        assert!(!is_otp_ok(&serde_json::json!({})));
    }
}
