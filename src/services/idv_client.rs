//! Provider adapter (C3): retrying HTTP client for the upstream IDV API.
//!
//! All endpoints are GETs with query parameters; every response is JSON
//! except `token_location3`, which returns a bare text body and is wrapped
//! here as `{"token": <text>}`.

use std::time::Duration;

use backoff::{future::retry, ExponentialBackoff};
use serde_json::Value;
use tracing::{info, warn};

use crate::services::errors::AppError;

#[derive(Debug, Clone)]
pub struct IdvClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub retries: u32,
    pub backoff_factor: f64,
}

/// Scoped per server instance; constructed fresh from `Servers` tuning so
/// each remote agent gets its own timeout/retry/concurrency envelope.
pub struct IdvClient {
    base_url: String,
    http: reqwest::Client,
    retries: u32,
    backoff_factor: f64,
}

impl IdvClient {
    pub fn new(config: IdvClientConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Unexpected(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            retries: config.retries,
            backoff_factor: config.backoff_factor,
        })
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_secs_f64(self.backoff_factor.max(0.01)),
            max_elapsed_time: Some(Duration::from_secs(self.retries as u64 * 30 + 5)),
            ..ExponentialBackoff::default()
        }
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        let op = || async {
            attempt += 1;
            info!(url = %url, attempt, "idv provider request");

            let response = self
                .http
                .get(&url)
                .query(params)
                .send()
                .await
                .map_err(|e| classify_reqwest_err(&e))?;

            let status = response.status();
            if status.is_client_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(backoff::Error::permanent(AppError::external(
                    "external_service_http_error",
                    format!("provider returned {status}: {body}"),
                )));
            }
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!(attempt, %status, "provider 5xx, retrying");
                return Err(backoff::Error::transient(AppError::external(
                    "external_service_http_error",
                    format!("provider returned {status}: {body}"),
                )));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| {
                    backoff::Error::permanent(AppError::external(
                        "external_service_invalid_response",
                        format!("invalid JSON from provider: {e}"),
                    ))
                })
        };

        retry(self.backoff_policy(), op)
            .await
            .map_err(|_| AppError::external("external_service_http_error", "exhausted retries"))
    }

    async fn get_text(&self, path: &str, params: &[(&str, &str)]) -> Result<String, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let op = || async {
            let response = self
                .http
                .get(&url)
                .query(params)
                .send()
                .await
                .map_err(|e| classify_reqwest_err(&e))?;

            let status = response.status();
            if status.is_client_error() {
                return Err(backoff::Error::permanent(AppError::external(
                    "external_service_http_error",
                    format!("provider returned {status}"),
                )));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(AppError::external(
                    "external_service_http_error",
                    format!("provider returned {status}"),
                )));
            }

            response.text().await.map_err(|e| {
                backoff::Error::permanent(AppError::external(
                    "external_service_invalid_response",
                    format!("invalid body from provider: {e}"),
                ))
            })
        };

        retry(self.backoff_policy(), op)
            .await
            .map_err(|_| AppError::external("external_service_http_error", "exhausted retries"))
    }

    fn require(field: &str, value: &str) -> Result<(), AppError> {
        if value.is_empty() {
            Err(AppError::validation("idv_missing_field", format!("{field} is required")))
        } else {
            Ok(())
        }
    }

    pub async fn request_otp(&self, username: &str, pin: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        Self::require("pin", pin)?;
        self.get_json("/otp", &[("username", username), ("pin", pin)]).await
    }

    pub async fn verify_otp(&self, username: &str, otp: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        Self::require("otp", otp)?;
        self.get_json("/verifyOtp", &[("username", username), ("otp", otp)]).await
    }

    pub async fn logout(&self, username: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        self.get_json("/logout", &[("username", username)]).await
    }

    pub async fn get_balance_pulsa(&self, username: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        self.get_json("/balance_pulsa", &[("username", username)]).await
    }

    pub async fn get_token_location3(&self, username: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        let token = self.get_text("/token_location3", &[("username", username)]).await?;
        Ok(serde_json::json!({ "token": token }))
    }

    pub async fn list_produk(&self, username: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        self.get_json("/list_idv", &[("username", username)]).await
    }

    pub async fn trx_voucher_idv(
        &self,
        username: &str,
        product_id: &str,
        email: &str,
        limit_harga: i64,
    ) -> Result<Value, AppError> {
        Self::require("username", username)?;
        Self::require("product_id", product_id)?;
        Self::require("email", email)?;
        if limit_harga <= 0 {
            return Err(AppError::validation(
                "idv_invalid_limit_harga",
                "limit_harga must be greater than 0",
            ));
        }
        let limit_harga_s = limit_harga.to_string();
        self.get_json(
            "/trx_idv",
            &[
                ("username", username),
                ("product_id", product_id),
                ("email", email),
                ("limit_harga", &limit_harga_s),
            ],
        )
        .await
    }

    pub async fn otp_trx(&self, username: &str, otp: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        Self::require("otp", otp)?;
        self.get_json("/otp_idv", &[("username", username), ("otp", otp)]).await
    }

    pub async fn status_trx(&self, username: &str, trx_id: &str) -> Result<Value, AppError> {
        Self::require("username", username)?;
        Self::require("trx_id", trx_id)?;
        self.get_json("/status_idv", &[("username", username), ("trx_id", trx_id)]).await
    }
}

fn classify_reqwest_err(err: &reqwest::Error) -> backoff::Error<AppError> {
    if err.is_timeout() {
        backoff::Error::transient(AppError::ExternalServiceTimeout(err.to_string()))
    } else {
        backoff::Error::transient(AppError::external("external_service_network_error", err.to_string()))
    }
}
