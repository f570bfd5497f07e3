//! Binding service (C5): binding lifecycle, bulk creation, products preview.

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::models::enums::{AccountStatus, BindingStep};
use crate::models::{Account, Binding, Server};
use crate::services::errors::AppError;
use crate::services::idv_client::{IdvClient, IdvClientConfig};
use crate::services::idv_interpret::{extract_device_id, is_reseller_from_list_produk, login_otp_succeeded, parse_balance, extract_tokenid};
use crate::services::workflow_guard::ensure_binding_step;

pub struct BindingService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> BindingService<'a> {
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

    async fn load_context(&self, binding_id: i32) -> Result<(Binding, Account, Server), AppError> {
        let binding = Binding::find_by_id(self.db, binding_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Binding {binding_id} not found")))?;
        let account = Account::find_by_id(self.db, binding.account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", binding.account_id)))?;
        let server = Server::find_by_id(self.db, binding.server_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Server {} not found", binding.server_id)))?;
        Ok((binding, account, server))
    }

    /// `create_binding(server_id, account_id, balance_start?)` (§4.3).
    pub async fn create_binding(
        &self,
        server_id: i32,
        account_id: i32,
        balance_start: Option<i64>,
    ) -> Result<Binding, AppError> {
        let server = Server::find_by_id(self.db, server_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Server {server_id} not found")))?;
        let account = Account::find_by_id(self.db, account_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {account_id} not found")))?;

        if Binding::find_active_by_server(self.db, server.id).await?.is_some() {
            return Err(AppError::validation("binding_server_active", "server already has an active binding"));
        }
        if Binding::find_active_by_account(self.db, account.id).await?.is_some() {
            return Err(AppError::validation("binding_account_active", "account is already bound to another server"));
        }

        let binding = Binding::create(
            self.db,
            crate::models::binding::CreateBindingRequest {
                server_id: server.id,
                account_id: account.id,
                batch_id: account.batch_id.clone(),
            },
        )
        .await?;

        let binding = if balance_start.is_some() {
            Binding::set_reseller_and_balance(self.db, binding.id, binding.is_reseller, balance_start).await?
        } else {
            binding
        };

        Account::mark_used(self.db, account.id, None).await?;
        Account::update(
            self.db,
            account.id,
            crate::models::account::UpdateAccountRequest {
                email: None,
                status: Some(AccountStatus::Active),
                notes: None,
            },
        )
        .await?;

        Ok(binding)
    }

    /// `request_login(binding_id, pin?)` (§4.3).
    pub async fn request_login(&self, binding_id: i32, pin: Option<String>) -> Result<Binding, AppError> {
        let (binding, account, server) = self.load_context(binding_id).await?;
        ensure_binding_step("request_login", binding.step)?;

        let pin = match pin {
            Some(pin) => pin,
            None => Account::find_pin(self.db, account.id)
                .await?
                .ok_or_else(|| AppError::validation("account_pin_missing", "no PIN supplied and account has none on file"))?,
        };

        let idv = Self::idv_client_for(&server)?;
        let response = idv.request_otp(&account.msisdn, &pin).await?;
        if !login_otp_succeeded(&response, false) {
            return Err(AppError::validation("binding_request_login_failed", "provider rejected OTP request"));
        }

        Binding::set_step(self.db, binding.id, BindingStep::OtpRequested).await
    }

    /// `verify_login_and_reseller(binding_id, otp)` (§4.3).
    pub async fn verify_login_and_reseller(&self, binding_id: i32, otp: &str) -> Result<Binding, AppError> {
        let (binding, account, server) = self.load_context(binding_id).await?;
        ensure_binding_step("verify_login", binding.step)?;

        Binding::set_step(self.db, binding.id, BindingStep::OtpVerification).await?;

        let idv = Self::idv_client_for(&server)?;
        let verify_resp = idv.verify_otp(&account.msisdn, otp).await?;
        if !login_otp_succeeded(&verify_resp, true) {
            return Err(AppError::validation("binding_verify_login_failed", "provider rejected OTP verification"));
        }
        let token_login = extract_tokenid(&verify_resp)
            .ok_or_else(|| AppError::validation("binding_verify_login_failed", "tokenid missing from provider response"))?;

        Binding::set_step(self.db, binding.id, BindingStep::OtpVerified).await?;
        let binding = Binding::set_tokens(self.db, binding.id, Some(token_login.clone()), None).await?;
        let binding = Binding::set_step(self.db, binding.id, BindingStep::TokenLoginFetched).await.map(|_| binding)?;

        let balance_resp = idv.get_balance_pulsa(&account.msisdn).await?;
        let balance = parse_balance(&balance_resp);

        let location_resp = idv.get_token_location3(&account.msisdn).await?;
        let token_location = location_resp.get("token").and_then(serde_json::Value::as_str).map(str::to_string);

        let products_resp = idv.list_produk(&account.msisdn).await?;
        let is_reseller = is_reseller_from_list_produk(&products_resp);
        let device_id = extract_device_id(&products_resp);

        let binding = Binding::set_reseller_and_balance(self.db, binding.id, is_reseller, balance).await?;
        let binding = Binding::set_tokens(self.db, binding.id, None, token_location).await?;
        let binding = match device_id.clone() {
            Some(device_id) => Binding::set_device_id(self.db, binding.id, device_id).await?,
            None => binding,
        };

        Account::sync_from_provider(self.db, account.id, balance, is_reseller, device_id).await?;

        Ok(binding)
    }

    /// `check_balance(binding_id)` (§4.3).
    pub async fn check_balance(&self, binding_id: i32) -> Result<Binding, AppError> {
        let (binding, account, server) = self.load_context(binding_id).await?;
        ensure_binding_step("check_balance", binding.step)?;
        let idv = Self::idv_client_for(&server)?;
        let balance_resp = idv.get_balance_pulsa(&account.msisdn).await?;
        let balance = parse_balance(&balance_resp);
        Binding::set_reseller_and_balance(self.db, binding.id, binding.is_reseller, balance).await
    }

    /// `refresh_token_location(binding_id)` (§4.3).
    pub async fn refresh_token_location(&self, binding_id: i32) -> Result<Binding, AppError> {
        let (binding, account, server) = self.load_context(binding_id).await?;
        ensure_binding_step("refresh_token_location", binding.step)?;
        let idv = Self::idv_client_for(&server)?;
        let location_resp = idv.get_token_location3(&account.msisdn).await?;
        let token_location = location_resp.get("token").and_then(serde_json::Value::as_str).map(str::to_string);
        Binding::set_tokens(self.db, binding.id, None, token_location).await
    }

    /// `verify_reseller(binding_id)` (§4.3).
    pub async fn verify_reseller(&self, binding_id: i32) -> Result<Binding, AppError> {
        let (binding, account, server) = self.load_context(binding_id).await?;
        ensure_binding_step("verify_reseller", binding.step)?;
        let idv = Self::idv_client_for(&server)?;
        let products_resp = idv.list_produk(&account.msisdn).await?;
        let is_reseller = is_reseller_from_list_produk(&products_resp);
        Binding::set_reseller_and_balance(self.db, binding.id, is_reseller, None).await
    }

    /// `logout_binding(binding_id, last_error_code?, last_error_message?, account_status?)` (§4.3).
    pub async fn logout_binding(
        &self,
        binding_id: i32,
        last_error_code: Option<&str>,
        last_error_message: Option<&str>,
        account_status: Option<AccountStatus>,
    ) -> Result<Binding, AppError> {
        let (binding, account, _server) = self.load_context(binding_id).await?;
        if binding.unbound_at.is_some() {
            return Err(AppError::validation("binding_already_logged_out", "binding is already logged out"));
        }
        ensure_binding_step("logout", binding.step)?;

        if let (Some(code), Some(message)) = (last_error_code, last_error_message) {
            Binding::record_error(self.db, binding.id, code, message).await?;
        }
        let binding = Binding::unbind(self.db, binding.id).await?;

        Account::update(
            self.db,
            account.id,
            crate::models::account::UpdateAccountRequest {
                email: None,
                status: Some(account_status.unwrap_or(AccountStatus::Exhausted)),
                notes: None,
            },
        )
        .await?;

        Ok(binding)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkBindingItem {
    pub server_id: Option<i32>,
    pub account_id: Option<i32>,
    pub port: Option<i32>,
    pub msisdn: Option<String>,
    pub batch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkItemStatus {
    Created,
    WouldCreate,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkBindingResult {
    pub status: BulkItemStatus,
    pub reason: Option<String>,
    pub binding_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkBindingSummary {
    pub results: Vec<BulkBindingResult>,
    pub created_count: usize,
    pub would_create_count: usize,
    pub failed_count: usize,
}

impl<'a> BindingService<'a> {
    /// Bulk binding creation (§4.3): accepts `{server_id,account_id}` or
    /// `{port,msisdn,batch_id?}` items, rejects in-batch duplicates and
    /// already-active servers/accounts, and supports `dry_run`.
    pub async fn bulk_create(
        &self,
        items: Vec<BulkBindingItem>,
        dry_run: bool,
        stop_on_first_error: bool,
    ) -> Result<BulkBindingSummary, AppError> {
        let mut results = Vec::new();
        let mut seen_servers = std::collections::HashSet::new();
        let mut seen_accounts = std::collections::HashSet::new();
        let mut created_count = 0usize;
        let mut would_create_count = 0usize;
        let mut failed_count = 0usize;

        for item in items {
            let outcome = self.resolve_and_validate(&item, &mut seen_servers, &mut seen_accounts).await;

            match outcome {
                Ok((server_id, account_id)) => {
                    if dry_run {
                        would_create_count += 1;
                        results.push(BulkBindingResult {
                            status: BulkItemStatus::WouldCreate,
                            reason: None,
                            binding_id: None,
                        });
                    } else {
                        match self.create_binding(server_id, account_id, None).await {
                            Ok(binding) => {
                                created_count += 1;
                                results.push(BulkBindingResult {
                                    status: BulkItemStatus::Created,
                                    reason: None,
                                    binding_id: Some(binding.id),
                                });
                            }
                            Err(e) => {
                                failed_count += 1;
                                results.push(BulkBindingResult {
                                    status: BulkItemStatus::Failed,
                                    reason: Some(e.to_string()),
                                    binding_id: None,
                                });
                                if stop_on_first_error {
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    failed_count += 1;
                    results.push(BulkBindingResult {
                        status: BulkItemStatus::Failed,
                        reason: Some(e.to_string()),
                        binding_id: None,
                    });
                    if stop_on_first_error {
                        break;
                    }
                }
            }
        }

        Ok(BulkBindingSummary { results, created_count, would_create_count, failed_count })
    }

    async fn resolve_and_validate(
        &self,
        item: &BulkBindingItem,
        seen_servers: &mut std::collections::HashSet<i32>,
        seen_accounts: &mut std::collections::HashSet<i32>,
    ) -> Result<(i32, i32), AppError> {
        let (server_id, account_id) = if let (Some(server_id), Some(account_id)) = (item.server_id, item.account_id) {
            (server_id, account_id)
        } else if let Some(port) = item.port {
            let msisdn = item
                .msisdn
                .clone()
                .ok_or_else(|| AppError::validation("bulk_binding_item_invalid", "msisdn required when using port"))?;
            use crate::models::_entities::{prelude::*, servers};
            use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
            let server = Servers::find()
                .filter(servers::Column::Port.eq(port))
                .one(self.db)
                .await?
                .ok_or_else(|| AppError::not_found(format!("no server registered on port {port}")))?;
            let account = Account::find_by_msisdn(self.db, &msisdn)
                .await?
                .ok_or_else(|| AppError::not_found(format!("account {msisdn} not found")))?;
            (server.id, account.id)
        } else {
            return Err(AppError::validation(
                "bulk_binding_item_invalid",
                "item must specify server_id+account_id or port+msisdn",
            ));
        };

        if !seen_servers.insert(server_id) {
            return Err(AppError::validation("bulk_binding_duplicate_server", "server repeated within batch"));
        }
        if !seen_accounts.insert(account_id) {
            return Err(AppError::validation("bulk_binding_duplicate_account", "account repeated within batch"));
        }

        if Binding::find_active_by_server(self.db, server_id).await?.is_some() {
            return Err(AppError::validation("binding_server_active", "server already has an active binding"));
        }
        if Binding::find_active_by_account(self.db, account_id).await?.is_some() {
            return Err(AppError::validation("binding_account_active", "account is already bound to another server"));
        }

        Ok((server_id, account_id))
    }
}

/// Validates a port-range bulk request up front (§8): rejects windows wider
/// than 500 ports before any work is attempted.
pub fn validate_port_range(start_port: i32, end_port: i32) -> Result<(), AppError> {
    if end_port - start_port > 500 {
        return Err(AppError::validation("bulk_port_range_too_wide", "port range may not exceed 500 ports"));
    }
    Ok(())
}
