//! Response interpretation helpers (§4.1), used by the binding and
//! transaction services — never by the adapter itself. The provider emits
//! loosely-typed JSON with several different "success" conventions; these
//! helpers turn that into small typed facts instead of letting raw maps leak
//! into business logic.

use serde_json::Value;

use crate::models::enums::TransactionStatus;

fn str_eq_ci(value: &Value, expected: &str) -> bool {
    value
        .as_str()
        .map(|s| s.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Login OTP success: `status=="0"` and `data.status` (case-insensitive)
/// equals `"true"`, and, when tokens are required, `data.tokenid` non-empty.
pub fn login_otp_succeeded(payload: &Value, require_token: bool) -> bool {
    let status_ok = payload.get("status").map(|v| v == "0").unwrap_or(false);
    if !status_ok {
        return false;
    }
    let data = payload.get("data");
    let data_status_ok = data.map(|d| str_eq_ci(&d["status"], "true")).unwrap_or(false);
    if !data_status_ok {
        return false;
    }
    if require_token {
        data.and_then(|d| d.get("tokenid"))
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    } else {
        true
    }
}

pub fn extract_tokenid(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|d| d.get("tokenid"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// True when any of `status=="200"`, `status_msg=="success"`, or
/// `data.product_group.product_type=="reseller"`.
pub fn is_reseller_from_list_produk(payload: &Value) -> bool {
    let status_200 = payload.get("status").map(|v| v == "200").unwrap_or(false);
    let status_msg_success = payload
        .get("status_msg")
        .and_then(Value::as_str)
        .map(|s| s.eq_ignore_ascii_case("success"))
        .unwrap_or(false);
    let product_type_reseller = payload
        .get("data")
        .and_then(|d| d.get("product_group"))
        .and_then(|g| g.get("product_type"))
        .and_then(Value::as_str)
        .map(|s| s.eq_ignore_ascii_case("reseller"))
        .unwrap_or(false);

    status_200 || status_msg_success || product_type_reseller
}

/// Detected device id from `data.identifier.device_id`.
pub fn extract_device_id(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|d| d.get("identifier"))
        .and_then(|i| i.get("device_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Clone, Default)]
pub struct OrderResponse {
    pub trx_id: Option<String>,
    pub t_id: Option<String>,
    pub is_success: Option<i64>,
}

/// Extracts `res.data.{trx_id, t_id, is_success}`.
pub fn parse_order_response(payload: &Value) -> OrderResponse {
    let data = payload.get("res").and_then(|r| r.get("data"));
    OrderResponse {
        trx_id: data.and_then(|d| d.get("trx_id")).and_then(Value::as_str).map(str::to_string),
        t_id: data.and_then(|d| d.get("t_id")).and_then(Value::as_str).map(str::to_string),
        is_success: data.and_then(|d| d.get("is_success")).and_then(value_as_i64),
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusResponse {
    pub is_success: Option<i64>,
    pub voucher: Option<String>,
}

/// Extracts `res.data.{is_success, voucher}`.
pub fn parse_status_response(payload: &Value) -> StatusResponse {
    let data = payload.get("res").and_then(|r| r.get("data"));
    StatusResponse {
        is_success: data.and_then(|d| d.get("is_success")).and_then(value_as_i64),
        voucher: data
            .and_then(|d| d.get("voucher"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Parses `res.balance` as an integer; returns `None` on parse failure, which
/// downstream precheck logic treats as "unknown" (never auto-stops on it).
pub fn parse_balance(payload: &Value) -> Option<i64> {
    value_as_i64(payload.get("res").and_then(|r| r.get("balance"))?)
}

fn value_as_i64(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value.as_str().and_then(|s| s.trim().parse::<i64>().ok())
}

/// Final status rule (§4.1): `is_success==2 && voucher` -> SUKSES;
/// `is_success==2 && !voucher` -> SUSPECT; otherwise PROCESSING
/// (pre-OTP context) or GAGAL (post-OTP context).
pub fn compute_final_status(status: &StatusResponse, post_otp: bool) -> TransactionStatus {
    match status.is_success {
        Some(2) if status.voucher.is_some() => TransactionStatus::Sukses,
        Some(2) => TransactionStatus::Suspect,
        _ if post_otp => TransactionStatus::Gagal,
        _ => TransactionStatus::Processing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_otp_recognizes_success_with_token() {
        let payload = json!({"status": "0", "data": {"status": "true", "tokenid": "TKN"}});
        assert!(login_otp_succeeded(&payload, true));
    }

    #[test]
    fn login_otp_rejects_missing_token_when_required() {
        let payload = json!({"status": "0", "data": {"status": "true"}});
        assert!(!login_otp_succeeded(&payload, true));
    }

    #[test]
    fn reseller_flag_detected_via_product_type() {
        let payload = json!({"status": "200", "data": {"identifier": {"device_id": "D1"}, "product_group": {"product_type": "reseller"}}});
        assert!(is_reseller_from_list_produk(&payload));
        assert_eq!(extract_device_id(&payload), Some("D1".to_string()));
    }

    #[test]
    fn balance_parses_numeric_string() {
        assert_eq!(parse_balance(&json!({"res": {"balance": "7851"}})), Some(7851));
        assert_eq!(parse_balance(&json!({"res": {"balance": "not-a-number"}})), None);
    }

    #[test]
    fn final_status_sukses_requires_voucher() {
        let status = StatusResponse { is_success: Some(2), voucher: Some("V1".into()) };
        assert_eq!(compute_final_status(&status, false), TransactionStatus::Sukses);

        let status = StatusResponse { is_success: Some(2), voucher: None };
        assert_eq!(compute_final_status(&status, false), TransactionStatus::Suspect);
    }

    #[test]
    fn final_status_pre_otp_pending_is_processing_post_otp_is_gagal() {
        let status = StatusResponse { is_success: Some(0), voucher: None };
        assert_eq!(compute_final_status(&status, false), TransactionStatus::Processing);
        assert_eq!(compute_final_status(&status, true), TransactionStatus::Gagal);
    }
}
